use crate::core::notify::DEFAULT_SUBJECT;
use crate::core::ConfigProvider;
use crate::utils::error::{DeskError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_WORKFLOW_URL: &str = "http://localhost:5678/webhook";
pub const DEFAULT_OCR_URL: &str = "http://localhost:5000";
pub const DEFAULT_OUTPUT_PATH: &str = "./output";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeskConfig {
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default = "default_workflow_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_token: String,
    /// 未設定時不限制請求時間
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_ocr_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub recipient: Option<String>,
    pub subject: Option<String>,
    /// Link placed in the email; defaults to the notify webhook itself.
    pub workflow_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: String,
}

fn default_workflow_url() -> String {
    DEFAULT_WORKFLOW_URL.to_string()
}

fn default_ocr_url() -> String {
    DEFAULT_OCR_URL.to_string()
}

fn default_output_path() -> String {
    DEFAULT_OUTPUT_PATH.to_string()
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            base_url: default_workflow_url(),
            api_token: String::new(),
            timeout_seconds: None,
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            base_url: default_ocr_url(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

impl DeskConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DeskError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 檔案不存在時使用預設值
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::info!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DeskError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CONTRACT_DESK_TOKEN})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DeskError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("workflow.base_url", &self.workflow.base_url)?;
        validation::validate_non_empty_string("workflow.api_token", &self.workflow.api_token)?;
        if self.workflow.api_token.starts_with("${") {
            return Err(DeskError::ConfigValidationError {
                field: "workflow.api_token".to_string(),
                message: format!(
                    "Environment variable {} is not set",
                    self.workflow.api_token
                ),
            });
        }

        if let Some(timeout) = self.workflow.timeout_seconds {
            validation::validate_range("workflow.timeout_seconds", timeout, 1, 3600)?;
        }

        validation::validate_url("ocr.base_url", &self.ocr.base_url)?;
        validation::validate_path("output.path", &self.output.path)?;

        if let Some(url) = &self.notification.workflow_url {
            validation::validate_url("notification.workflow_url", url)?;
        }

        Ok(())
    }

    pub fn notification_subject(&self) -> &str {
        self.notification
            .subject
            .as_deref()
            .unwrap_or(DEFAULT_SUBJECT)
    }

    pub fn notification_link(&self) -> String {
        self.notification.workflow_url.clone().unwrap_or_else(|| {
            format!(
                "{}/{}",
                self.workflow.base_url.trim_end_matches('/'),
                crate::adapters::http::NOTIFY_PATH
            )
        })
    }

    pub fn recipient(&self) -> Result<&str> {
        validation::validate_required_field("notification.recipient", &self.notification.recipient)
            .map(String::as_str)
    }
}

impl ConfigProvider for DeskConfig {
    fn workflow_base_url(&self) -> &str {
        &self.workflow.base_url
    }

    fn api_token(&self) -> &str {
        &self.workflow.api_token
    }

    fn ocr_base_url(&self) -> &str {
        &self.ocr.base_url
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.workflow.timeout_seconds.map(Duration::from_secs)
    }
}

impl Validate for DeskConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
