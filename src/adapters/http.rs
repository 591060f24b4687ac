use crate::core::proposal::TIMESTAMP_FORMAT;
use crate::core::{ConfigProvider, NotificationChannel, Record, WorkflowGateway};
use crate::domain::model::{
    Company, DocumentUpload, Notification, ProposalRequest, ReplyBody, UploadReceipt, WebhookReply,
};
use crate::utils::error::{DeskError, Result};
use async_trait::async_trait;
use chrono::Local;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, Request, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

pub const COMPANIES_PATH: &str = "get_companies";
pub const CONTRACTS_PATH: &str = "contracts";
pub const UPLOAD_PATH: &str = "upload";
pub const GENERATE_PATH: &str = "generate";
pub const NOTIFY_PATH: &str = "notify_expiring";
pub const AGENT_PATH: &str = "invoke_agent";
pub const ANALYSIS_PATH: &str = "synthese";

/// 工作流端以「societe client」欄位篩選合約
pub const COMPANY_QUERY_KEY: &str = "societe client";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadQuery<'a> {
    file_name: &'a str,
    file_type: &'a str,
    company_name: &'a str,
    upload_id: &'a str,
    timestamp: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AgentPayload<'a> {
    session_id: &'a str,
    chat_input: &'a str,
}

/// HTTP client for the workflow server's webhooks. Every request carries the
/// static bearer token; nothing is retried.
#[derive(Debug, Clone)]
pub struct WorkflowClient {
    client: Client,
    base_url: String,
    api_token: String,
}

impl WorkflowClient {
    pub fn new<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.workflow_base_url().trim_end_matches('/').to_string(),
            api_token: config.api_token().to_string(),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.endpoint(path))
            .bearer_auth(&self.api_token)
    }

    fn json_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.authorized(method, path)
            .header(CONTENT_TYPE, "application/json")
    }

    pub fn companies_request(&self) -> Result<Request> {
        Ok(self.json_request(Method::GET, COMPANIES_PATH).build()?)
    }

    pub fn contracts_request(&self, company: &str) -> Result<Request> {
        Ok(self
            .json_request(Method::GET, CONTRACTS_PATH)
            .query(&[(COMPANY_QUERY_KEY, company)])
            .build()?)
    }

    pub fn upload_request(
        &self,
        upload: &DocumentUpload,
        upload_id: &str,
        timestamp: &str,
    ) -> Result<Request> {
        let query = UploadQuery {
            file_name: &upload.file_name,
            file_type: &upload.file_type,
            company_name: &upload.company_name,
            upload_id,
            timestamp,
        };

        Ok(self
            .authorized(Method::POST, UPLOAD_PATH)
            .header(CONTENT_TYPE, upload.file_type.as_str())
            .header(ACCEPT, "*/*")
            .query(&query)
            .body(upload.bytes.clone())
            .build()?)
    }

    pub fn proposal_request(&self, request: &ProposalRequest) -> Result<Request> {
        Ok(self
            .json_request(Method::POST, GENERATE_PATH)
            .header(ACCEPT, "*/*")
            .query(request)
            .build()?)
    }

    pub fn notify_request(&self, notification: &Notification) -> Result<Request> {
        Ok(self
            .json_request(Method::GET, NOTIFY_PATH)
            .query(&[
                ("recipient", notification.recipient.as_str()),
                ("subject", notification.subject.as_str()),
                ("contracts", notification.html.as_str()),
            ])
            .build()?)
    }

    pub fn analysis_request(&self) -> Result<Request> {
        Ok(self.json_request(Method::POST, ANALYSIS_PATH).build()?)
    }

    pub fn agent_request(&self, session_id: &str, chat_input: &str) -> Result<Request> {
        Ok(self
            .authorized(Method::POST, AGENT_PATH)
            .json(&AgentPayload {
                session_id,
                chat_input,
            })
            .build()?)
    }

    async fn send(&self, request: Request) -> Result<Response> {
        // 查詢字串可能包含整份 HTML 報表，只記錄路徑
        tracing::debug!("{} {}", request.method(), request.url().path());
        let response = self.client.execute(request).await?;
        tracing::debug!("Response status: {}", response.status());
        Ok(response)
    }

    async fn send_checked(&self, request: Request, endpoint: &str) -> Result<Response> {
        let response = self.send(request).await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(status_error(endpoint, response).await)
        }
    }
}

async fn status_error(endpoint: &str, response: Response) -> DeskError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    tracing::warn!("{} failed with HTTP {}", endpoint, status);
    DeskError::HttpStatus {
        endpoint: endpoint.to_string(),
        status,
        body,
    }
}

fn parse_reply_body(text: String) -> Option<ReplyBody> {
    if text.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => Some(ReplyBody::Json(json)),
        Err(_) => Some(ReplyBody::Text(text)),
    }
}

fn upload_receipt(upload_id: String, status: u16, text: String) -> UploadReceipt {
    let body = if text.trim().is_empty() {
        None
    } else {
        serde_json::from_str::<Value>(&text).ok()
    };

    let success = body
        .as_ref()
        .and_then(|b| b.get("success"))
        .and_then(Value::as_bool)
        .unwrap_or(true);
    let message = body
        .as_ref()
        .and_then(|b| b.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string);

    UploadReceipt {
        upload_id,
        status,
        success,
        message,
        body,
    }
}

#[async_trait]
impl WorkflowGateway for WorkflowClient {
    async fn list_companies(&self) -> Result<Vec<Company>> {
        let response = self
            .send_checked(self.companies_request()?, COMPANIES_PATH)
            .await?;
        Ok(response.json().await?)
    }

    async fn fetch_contracts(&self, company: &str) -> Result<Vec<Record>> {
        let response = self
            .send_checked(self.contracts_request(company)?, CONTRACTS_PATH)
            .await?;
        let json_data: Value = response.json().await?;

        let items = match json_data {
            Value::Array(items) => items,
            other => {
                return Err(DeskError::ProcessingError {
                    message: format!("Expected a JSON array of contracts, got: {}", other),
                })
            }
        };

        let mut records = Vec::with_capacity(items.len());
        for item in items {
            if let Value::Object(obj) = item {
                records.push(Record {
                    data: obj.into_iter().collect(),
                });
            } else {
                tracing::warn!("Skipping non-object contract entry: {}", item);
            }
        }
        Ok(records)
    }

    async fn upload_document(&self, upload: &DocumentUpload) -> Result<UploadReceipt> {
        let upload_id = Uuid::new_v4().to_string();
        let timestamp = Local::now().naive_local().format(TIMESTAMP_FORMAT).to_string();
        tracing::info!(
            "📤 Uploading {} ({} bytes, {}) for {} [{}]",
            upload.file_name,
            upload.bytes.len(),
            upload.file_type,
            upload.company_name,
            upload_id
        );

        let request = self.upload_request(upload, &upload_id, &timestamp)?;
        let response = self.send_checked(request, UPLOAD_PATH).await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        Ok(upload_receipt(upload_id, status, text))
    }

    async fn submit_proposal(&self, request: &ProposalRequest) -> Result<WebhookReply> {
        let response = self
            .send_checked(self.proposal_request(request)?, GENERATE_PATH)
            .await?;
        let status = response.status().as_u16();
        Ok(WebhookReply {
            status,
            body: parse_reply_body(response.text().await?),
        })
    }

    async fn trigger_analysis(&self) -> Result<WebhookReply> {
        let response = self.send(self.analysis_request()?).await?;
        // 只接受 200/201
        if !matches!(response.status(), StatusCode::OK | StatusCode::CREATED) {
            return Err(status_error(ANALYSIS_PATH, response).await);
        }
        let status = response.status().as_u16();
        Ok(WebhookReply {
            status,
            body: parse_reply_body(response.text().await?),
        })
    }

    async fn invoke_agent(&self, session_id: &str, chat_input: &str) -> Result<Option<String>> {
        let response = self
            .send_checked(self.agent_request(session_id, chat_input)?, AGENT_PATH)
            .await?;
        let result: Value = response.json().await?;

        Ok(match result.get("output") {
            None | Some(Value::Null) => None,
            Some(Value::String(output)) => Some(output.clone()),
            Some(other) => Some(other.to_string()),
        })
    }
}

#[async_trait]
impl NotificationChannel for WorkflowClient {
    async fn deliver(&self, notification: &Notification) -> Result<()> {
        self.send_checked(self.notify_request(notification)?, NOTIFY_PATH)
            .await?;
        Ok(())
    }
}
