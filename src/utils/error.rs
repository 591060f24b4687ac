use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{endpoint} returned HTTP {status}: {body}")]
    HttpStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("OCR service error (HTTP {status}): {message}")]
    OcrError { status: u16, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Remote,
    Data,
    Configuration,
    Input,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DeskError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DeskError::ApiError(_) => ErrorCategory::Network,
            DeskError::HttpStatus { .. } | DeskError::OcrError { .. } => ErrorCategory::Remote,
            DeskError::CsvError(_)
            | DeskError::SerializationError(_)
            | DeskError::ProcessingError { .. } => ErrorCategory::Data,
            DeskError::ConfigError { .. }
            | DeskError::ConfigValidationError { .. }
            | DeskError::InvalidConfigValueError { .. }
            | DeskError::MissingConfigError { .. } => ErrorCategory::Configuration,
            DeskError::ValidationError { .. } => ErrorCategory::Input,
            DeskError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            // 遠端服務暫時不可用，使用者可以重新觸發
            ErrorCategory::Network | ErrorCategory::Remote => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            DeskError::ApiError(e) if e.is_timeout() => {
                "The workflow server did not answer in time".to_string()
            }
            DeskError::ApiError(e) if e.is_connect() => {
                "Could not connect to the workflow server".to_string()
            }
            DeskError::ApiError(e) => format!("Error communicating with the server: {}", e),
            DeskError::HttpStatus {
                endpoint, status, ..
            } => format!("The request to {} failed with status code {}", endpoint, status),
            DeskError::OcrError { message, .. } => format!("Text extraction failed: {}", message),
            DeskError::ValidationError { message } => message.clone(),
            DeskError::MissingConfigError { field } => {
                format!("Missing configuration value: {}", field)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check that the workflow server is running and the base URL is correct, then try again"
            }
            ErrorCategory::Remote => {
                "Inspect the workflow execution log on the server side, then re-trigger the action"
            }
            ErrorCategory::Data => "The server returned data in an unexpected shape; check the workflow output",
            ErrorCategory::Configuration => "Review the configuration file and command-line overrides",
            ErrorCategory::Input => "Correct the input and run the command again",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        DeskError::ValidationError {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DeskError>;
