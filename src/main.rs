use chrono::{Local, NaiveDate, NaiveTime};
use clap::Parser;
use contract_desk::config::{Cli, Command};
use contract_desk::core::proposal::{self, SubmissionState};
use contract_desk::core::report::selection_label;
use contract_desk::core::schedule::notice_deadlines;
use contract_desk::core::session::ChatSession;
use contract_desk::core::upload::{mime_for_path, prepare_upload};
use contract_desk::core::{ConfigProvider, ScheduledContract, WorkflowGateway};
use contract_desk::domain::model::{ChatRole, Contract, ReplyBody};
use contract_desk::utils::error::{DeskError, ErrorSeverity};
use contract_desk::utils::{logger, validation, validation::Validate};
use contract_desk::{
    ContractDesk, DeskConfig, DispatchOutcome, LocalStorage, NotificationDispatcher, OcrClient,
    Result, WorkflowClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting contract-desk");
    tracing::debug!("Loading configuration from: {}", cli.config);

    let mut config = match DeskConfig::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };
    cli.apply_overrides(&mut config);

    // OCR 服務不需要工作流 token
    let validated = match cli.command {
        Command::Ocr { .. } => validation::validate_url("ocr.base_url", config.ocr_base_url()),
        _ => config.validate(),
    };
    if let Err(e) = validated {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(&cli, &config).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        if let DeskError::HttpStatus { body, .. } = &e {
            if !body.trim().is_empty() {
                eprintln!("   Error details: {}", body);
            }
        }
        eprintln!("💡 {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 4,      // 輸入錯誤
            ErrorSeverity::Medium => 2,   // 可重新觸發
            ErrorSeverity::High => 1,     // 設定或資料錯誤
            ErrorSeverity::Critical => 3, // 系統錯誤
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

async fn run(cli: &Cli, config: &DeskConfig) -> Result<()> {
    let storage = LocalStorage::new(config.output_path().to_string());

    let desk = ContractDesk::new(WorkflowClient::new(config)?);

    match &cli.command {
        Command::Companies => {
            let names = desk.company_names().await?;
            if names.is_empty() {
                println!("No companies found");
            }
            for name in names {
                println!("{}", name);
            }
        }

        Command::Contracts { company, export } => {
            let review = desk.review(company).await?;
            println!("📋 All Contracts for {}", company);
            print_contracts(&review.contracts, &notice_deadlines(&review.contracts));

            if *export {
                let file_name = desk.export_csv(&storage, &review).await?;
                println!("📁 Saved to {}/{}", config.output_path(), file_name);
            }
        }

        Command::Review { company, as_of } => {
            let now = as_of
                .map(|date| date.and_time(NaiveTime::MIN))
                .unwrap_or_else(|| Local::now().naive_local());
            let review = desk.review_at(company, now).await?;
            let evaluation = &review.evaluation;

            if evaluation.notice_window.is_empty() {
                println!("✅ No contracts in notice period");
            } else {
                println!("⚠️ Contracts in notice period requiring immediate attention!");
                print_scheduled(&evaluation.notice_window);
            }
            println!();
            if evaluation.expiring_soon.is_empty() {
                println!("No contracts expiring in the next 6 months");
            } else {
                println!("📅 Contracts expiring in the next 6 months:");
                print_scheduled(&evaluation.expiring_soon);
            }
        }

        Command::Notify {
            company,
            recipient,
            expiring,
        } => {
            let recipient = match recipient {
                Some(recipient) => recipient.as_str(),
                None => config.recipient()?,
            };
            let review = desk.review(company).await?;
            let rows = if *expiring {
                &review.evaluation.expiring_soon
            } else {
                &review.evaluation.notice_window
            };

            let dispatcher =
                NotificationDispatcher::new(desk.gateway().clone(), config.notification_link())
                    .with_subject(config.notification_subject());
            match dispatcher.dispatch(rows, recipient).await? {
                DispatchOutcome::Delivered { recipient, contracts } => {
                    println!("📧 Notification about {} contracts sent to {}!", contracts, recipient)
                }
                DispatchOutcome::NothingToSend => println!("Nothing to report for {}", company),
            }
        }

        Command::Upload {
            company,
            file,
            file_type,
        } => {
            let bytes = std::fs::read(file)?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            let file_type = file_type
                .clone()
                .unwrap_or_else(|| mime_for_path(file).to_string());
            let upload = prepare_upload(company, file_name, Some(file_type.as_str()), bytes)?;

            let receipt = desk.gateway().upload_document(&upload).await?;
            println!("Document sent successfully (Status: {})", receipt.status);
            match (&receipt.body, receipt.success) {
                (Some(_), true) => println!(
                    "Processing result: {}",
                    receipt.message.as_deref().unwrap_or("Successful")
                ),
                (Some(_), false) => println!(
                    "⚠️ Process reported an issue: {}",
                    receipt.message.as_deref().unwrap_or("Unknown error")
                ),
                (None, _) => println!("The workflow has been triggered successfully."),
            }
            println!("Upload tracking ID: {}", receipt.upload_id);
        }

        Command::Generate {
            company,
            contract_id,
            notes,
        } => {
            let now = Local::now().naive_local();
            let review = desk.review_at(company, now).await?;
            let row = review
                .evaluation
                .notice_window
                .iter()
                .find(|row| &row.contract.contract_id == contract_id)
                .ok_or_else(|| DeskError::ValidationError {
                    message: format!(
                        "Contract {} of {} is not in its notice period",
                        contract_id, company
                    ),
                })?;
            println!("Selected Contract: {}", selection_label(row));

            let mut state = SubmissionState::default();
            let result = proposal::submit(desk.gateway(), &mut state, row, notes, now).await;
            print_submission(&state);
            result?;
        }

        Command::Analyze => {
            let reply = desk.gateway().trigger_analysis().await?;
            println!("Workflow triggered successfully! Status code: {}", reply.status);
            print_reply_body(reply.body.as_ref());
        }

        Command::Chat {
            message,
            session_file,
            reset,
            history,
        } => {
            let mut session = ChatSession::load(&storage, session_file).await?;
            if *reset {
                session.reset();
            }
            println!("Session ID: {}", session.session_id);

            if *history {
                for msg in &session.messages {
                    let who = match msg.role {
                        ChatRole::User => "you",
                        ChatRole::Assistant => "assistant",
                    };
                    println!("[{}] {}", who, msg.content);
                }
            }

            if let Some(message) = message {
                let reply = session
                    .exchange_and_save(desk.gateway(), &storage, session_file, message)
                    .await?;
                println!("{}", reply);
            } else if *reset {
                session.save(&storage, session_file).await?;
            }
        }

        Command::Ocr { image, mime } => {
            let ocr = OcrClient::new(config)?;
            let bytes = std::fs::read(image)?;
            let mime = mime
                .clone()
                .unwrap_or_else(|| mime_for_path(image).to_string());
            let file_name = image
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("image");
            let text = ocr.extract_text(file_name, bytes, &mime).await?;
            println!("{}", text);
        }
    }

    Ok(())
}

fn print_contracts(contracts: &[Contract], deadlines: &[Option<NaiveDate>]) {
    if contracts.is_empty() {
        println!("  (no contracts)");
        return;
    }
    for (contract, deadline) in contracts.iter().zip(deadlines) {
        println!(
            "  {:<12} {:<24} {:<20} expires {:<10} notice {} days, deadline {}",
            contract.contract_id,
            contract.client_name,
            contract.contract_type,
            contract
                .expiration_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            contract
                .notice_days
                .map(|d| d.to_string())
                .unwrap_or_else(|| "?".to_string()),
            deadline
                .map(|d| d.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        );
    }
}

fn print_scheduled(rows: &[ScheduledContract]) {
    for row in rows {
        let deadline = row
            .notice_deadline
            .map(|d| format!(", notice deadline {}", d))
            .unwrap_or_default();
        println!("  [{}] {}{}", row.contract.contract_id, selection_label(row), deadline);
    }
}

fn print_submission(state: &SubmissionState) {
    match state {
        SubmissionState::Idle => {}
        SubmissionState::Succeeded { status, body } => {
            println!("✅ Information submitted successfully! Status code: {}", status);
            print_reply_body(body.as_ref());
        }
        SubmissionState::Failed { error } => {
            println!("Error occurred during submission: {}", error);
        }
    }
}

fn print_reply_body(body: Option<&ReplyBody>) {
    match body {
        Some(ReplyBody::Json(json)) => {
            let pretty = serde_json::to_string_pretty(json).unwrap_or_else(|_| json.to_string());
            println!("Response Body (JSON):\n{}", pretty);
        }
        Some(ReplyBody::Text(text)) => println!("Response Body (Text):\n{}", text),
        None => {}
    }
}
