use crate::domain::model::{
    Company, DocumentUpload, Notification, ProposalRequest, Record, UploadReceipt, WebhookReply,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> bool;
}

pub trait ConfigProvider: Send + Sync {
    fn workflow_base_url(&self) -> &str;
    fn api_token(&self) -> &str;
    fn ocr_base_url(&self) -> &str;
    fn output_path(&self) -> &str;
    fn request_timeout(&self) -> Option<Duration>;
}

/// The external workflow-automation server.
#[async_trait]
pub trait WorkflowGateway: Send + Sync {
    async fn list_companies(&self) -> Result<Vec<Company>>;
    async fn fetch_contracts(&self, company: &str) -> Result<Vec<Record>>;
    async fn upload_document(&self, upload: &DocumentUpload) -> Result<UploadReceipt>;
    async fn submit_proposal(&self, request: &ProposalRequest) -> Result<WebhookReply>;
    async fn trigger_analysis(&self) -> Result<WebhookReply>;
    /// `None` when the agent answered without an `output` field.
    async fn invoke_agent(&self, session_id: &str, chat_input: &str) -> Result<Option<String>>;
}

/// Hands a rendered notification to whatever actually delivers it.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<()>;
}
