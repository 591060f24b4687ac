use anyhow::Result;
use chrono::{Days, Local, NaiveDate, NaiveDateTime};
use contract_desk::core::proposal::{self, SubmissionState};
use contract_desk::core::session::ChatSession;
use contract_desk::core::Storage;
use contract_desk::{
    ContractDesk, DeskConfig, DeskError, DispatchOutcome, LocalStorage, NotificationDispatcher,
    WorkflowClient,
};
use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;

fn config_for(server: &MockServer) -> Result<DeskConfig> {
    let toml_content = format!(
        r#"
[workflow]
base_url = "{}"
api_token = "test-token"

[notification]
recipient = "legal@example.com"
"#,
        server.url("/webhook")
    );
    Ok(DeskConfig::from_toml_str(&toml_content)?)
}

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn mock_contracts(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET)
            .path("/webhook/contracts")
            .header("Authorization", "Bearer test-token");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!([
                {
                    "societe client": "Acme",
                    "type of contract": "Maintenance",
                    "contract_expiration_date": "2024-01-20",
                    "notice_days": 5,
                    "contract_id": "C-1"
                },
                {
                    "societe client": "Acme",
                    "type of contract": "Cleaning",
                    "contract_expiration_date": "2024-03-01",
                    "notice_days": null,
                    "contract_id": "C-2"
                },
                {
                    "societe client": "Acme",
                    "type of contract": "Leasing",
                    "contract_expiration_date": "2024-08-01",
                    "notice_days": "30",
                    "contract_id": "C-3",
                    "amount": 9800
                },
                {
                    "societe client": "Acme",
                    "type of contract": "Catering",
                    "contract_expiration_date": "someday",
                    "notice_days": 10,
                    "contract_id": "C-4"
                }
            ]));
    })
}

#[tokio::test]
async fn test_review_before_notice_deadline() -> Result<()> {
    let server = MockServer::start();
    let api_mock = mock_contracts(&server);
    let desk = ContractDesk::new(WorkflowClient::new(&config_for(&server)?)?);

    let review = desk.review_at("Acme", at(2024, 1, 10)).await?;

    api_mock.assert();
    assert_eq!(review.contracts.len(), 4);
    assert!(review.evaluation.notice_window.is_empty());

    let expiring: Vec<&str> = review
        .evaluation
        .expiring_soon
        .iter()
        .map(|row| row.contract.contract_id.as_str())
        .collect();
    assert_eq!(expiring, vec!["C-1", "C-2"]);
    Ok(())
}

#[tokio::test]
async fn test_review_inside_notice_window() -> Result<()> {
    let server = MockServer::start();
    mock_contracts(&server);
    let desk = ContractDesk::new(WorkflowClient::new(&config_for(&server)?)?);

    let review = desk.review_at("Acme", at(2024, 1, 15)).await?;

    let notice = &review.evaluation.notice_window;
    assert_eq!(notice.len(), 1);
    assert_eq!(notice[0].contract.contract_id, "C-1");
    assert_eq!(notice[0].notice_deadline, NaiveDate::from_ymd_opt(2024, 1, 14));
    assert_eq!(notice[0].days_until_expiration, Some(5));
    Ok(())
}

#[tokio::test]
async fn test_review_is_fetched_fresh_every_time() -> Result<()> {
    let server = MockServer::start();
    let api_mock = mock_contracts(&server);
    let desk = ContractDesk::new(WorkflowClient::new(&config_for(&server)?)?);

    desk.review_at("Acme", at(2024, 1, 15)).await?;
    desk.review_at("Acme", at(2024, 1, 16)).await?;

    assert_eq!(api_mock.hits(), 2);
    Ok(())
}

#[tokio::test]
async fn test_notify_notice_window_end_to_end() -> Result<()> {
    let server = MockServer::start();
    mock_contracts(&server);
    let notify_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/webhook/notify_expiring")
            .header("Authorization", "Bearer test-token")
            .query_param_exists("recipient")
            .query_param_exists("subject")
            .query_param_exists("contracts");
        then.status(200);
    });

    let config = config_for(&server)?;
    let desk = ContractDesk::new(WorkflowClient::new(&config)?);
    let review = desk.review_at("Acme", at(2024, 1, 15)).await?;

    let dispatcher =
        NotificationDispatcher::new(desk.gateway().clone(), config.notification_link());
    let outcome = dispatcher
        .dispatch(&review.evaluation.notice_window, config.recipient()?)
        .await?;

    notify_mock.assert();
    assert_eq!(
        outcome,
        DispatchOutcome::Delivered {
            recipient: "legal@example.com".to_string(),
            contracts: 1
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_notify_failure_is_reported_once() -> Result<()> {
    let server = MockServer::start();
    mock_contracts(&server);
    let notify_mock = server.mock(|when, then| {
        when.method(GET).path("/webhook/notify_expiring");
        then.status(500).body("smtp down");
    });

    let config = config_for(&server)?;
    let desk = ContractDesk::new(WorkflowClient::new(&config)?);
    let review = desk.review_at("Acme", at(2024, 1, 15)).await?;

    let dispatcher =
        NotificationDispatcher::new(desk.gateway().clone(), config.notification_link());
    let result = dispatcher
        .dispatch(&review.evaluation.notice_window, "legal@example.com")
        .await;

    assert!(matches!(result, Err(DeskError::HttpStatus { status: 500, .. })));
    assert_eq!(notify_mock.hits(), 1);
    Ok(())
}

#[tokio::test]
async fn test_export_csv_to_local_storage() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());

    let server = MockServer::start();
    mock_contracts(&server);
    let desk = ContractDesk::new(WorkflowClient::new(&config_for(&server)?)?);
    let review = desk.review_at("Acme", at(2024, 1, 15)).await?;

    let file_name = desk.export_csv(&storage, &review).await?;

    assert_eq!(file_name, "Acme_contracts.csv");
    let csv = String::from_utf8(storage.read_file(&file_name).await?)?;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].ends_with("contract_id,amount"));
    assert!(lines[3].contains("C-3,9800"));
    // 無法解析的日期匯出為空欄位
    assert!(lines[4].contains("Catering,,10,C-4"));
    Ok(())
}

#[tokio::test]
async fn test_generate_proposal_records_submission_state() -> Result<()> {
    let server = MockServer::start();
    mock_contracts(&server);
    let generate_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/webhook/generate")
            .query_param("contract_id", "C-1")
            .query_param("days_until_expiration", "5");
        then.status(200).body("Success");
    });

    let desk = ContractDesk::new(WorkflowClient::new(&config_for(&server)?)?);
    let now = at(2024, 1, 15);
    let review = desk.review_at("Acme", now).await?;
    let row = &review.evaluation.notice_window[0];

    let mut state = SubmissionState::default();

    // 空白備註不送出
    let blank = proposal::submit(desk.gateway(), &mut state, row, "  ", now).await;
    assert!(matches!(blank, Err(DeskError::ValidationError { .. })));
    assert!(!state.is_attempted());

    proposal::submit(desk.gateway(), &mut state, row, "ask for three quotes", now).await?;

    generate_mock.assert();
    assert!(matches!(state, SubmissionState::Succeeded { status: 200, .. }));
    Ok(())
}

#[tokio::test]
async fn test_chat_session_round_trip_with_persistence() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());

    let server = MockServer::start();
    let agent_mock = server.mock(|when, then| {
        when.method(POST).path("/webhook/invoke_agent");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({"output": "C-1 is in its notice period."}));
    });

    let desk = ContractDesk::new(WorkflowClient::new(&config_for(&server)?)?);

    let mut session = ChatSession::load(&storage, "chat.json").await?;
    let reply = session
        .exchange(desk.gateway(), "What needs attention?")
        .await?;
    session.save(&storage, "chat.json").await?;

    agent_mock.assert();
    assert_eq!(reply, "C-1 is in its notice period.");

    let restored = ChatSession::load(&storage, "chat.json").await?;
    assert_eq!(restored.session_id, session.session_id);
    assert_eq!(restored.messages.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_review_uses_current_date() -> Result<()> {
    let today = Local::now().date_naive();
    let soon = today + Days::new(10);
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/webhook/contracts");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!([
                {
                    "societe client": "Acme",
                    "type of contract": "Security",
                    "contract_expiration_date": format!("{}T09:15:00.000", soon),
                    "notice_days": 30,
                    "contract_id": "C-10"
                }
            ]));
    });

    let desk = ContractDesk::new(WorkflowClient::new(&config_for(&server)?)?);
    let review = desk.review("Acme").await?;

    assert_eq!(review.evaluation.notice_window.len(), 1);
    assert_eq!(review.evaluation.expiring_soon.len(), 1);
    assert_eq!(review.contracts[0].expiration_date, Some(soon));
    Ok(())
}

#[tokio::test]
async fn test_chat_failure_still_saves_user_message() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());

    let server = MockServer::start();
    let agent_mock = server.mock(|when, then| {
        when.method(POST).path("/webhook/invoke_agent");
        then.status(500).body("agent crashed");
    });

    let desk = ContractDesk::new(WorkflowClient::new(&config_for(&server)?)?);

    let mut session = ChatSession::load(&storage, "chat.json").await?;
    let result = session
        .exchange_and_save(desk.gateway(), &storage, "chat.json", "Which contracts expire?")
        .await;

    assert_eq!(agent_mock.hits(), 1);
    assert!(matches!(result, Err(DeskError::HttpStatus { status: 500, .. })));

    let restored = ChatSession::load(&storage, "chat.json").await?;
    assert_eq!(restored.session_id, session.session_id);
    assert_eq!(restored.messages.len(), 1);
    assert_eq!(restored.messages[0].content, "Which contracts expire?");
    Ok(())
}
