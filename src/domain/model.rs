use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 工作流伺服器回傳的原始資料列
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub client_name: String,
    pub contract_type: String,
    pub expiration_date: Option<NaiveDate>,
    pub notice_days: Option<u32>,
    pub contract_id: String,
    /// 未辨識的欄位，CSV 匯出時原樣保留
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A contract together with the values derived for one evaluation instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledContract {
    pub contract: Contract,
    pub notice_deadline: Option<NaiveDate>,
    pub days_until_expiration: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub company_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub file_type: String,
    pub company_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadReceipt {
    pub upload_id: String,
    pub status: u16,
    /// `false` 只在伺服器明確回報 `"success": false` 時出現
    pub success: bool,
    pub message: Option<String>,
    pub body: Option<serde_json::Value>,
}

/// Response of a fire-and-forget webhook (proposal generation, analysis).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookReply {
    pub status: u16,
    pub body: Option<ReplyBody>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplyBody {
    Json(serde_json::Value),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub html: String,
}

/// Query parameters sent to the proposal-generation (RFP) webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalRequest {
    pub client_name: String,
    pub contract_type: String,
    pub expiration_date: String,
    pub days_until_expiration: i64,
    pub notice_days: u32,
    pub contract_id: String,
    pub text_content: String,
    pub timestamp: String,
}
