use crate::config::toml_config::DeskConfig;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "contract-desk")]
#[command(about = "Contract expiration desk backed by workflow webhooks")]
pub struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "contract-desk.toml", global = true)]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Override workflow.base_url
    #[arg(long, env = "CONTRACT_DESK_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Override workflow.api_token
    #[arg(long, env = "CONTRACT_DESK_API_TOKEN", hide_env_values = true, global = true)]
    pub api_token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List client companies
    Companies,

    /// List all contracts of a company
    Contracts {
        company: String,
        /// Save the list as {company}_contracts.csv in the output directory
        #[arg(long)]
        export: bool,
    },

    /// Show contracts in their notice period and contracts expiring soon
    Review {
        company: String,
        /// Evaluate as of this date instead of now (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    /// Email the contracts currently in their notice period
    Notify {
        company: String,
        /// Overrides notification.recipient
        #[arg(long)]
        recipient: Option<String>,
        /// Report the expiring-soon window instead of the notice window
        #[arg(long)]
        expiring: bool,
    },

    /// Upload a contract document for classification
    Upload {
        company: String,
        file: PathBuf,
        /// MIME type; guessed from the extension when omitted
        #[arg(long)]
        file_type: Option<String>,
    },

    /// Send a notice-period contract and notes to proposal generation
    Generate {
        company: String,
        #[arg(long)]
        contract_id: String,
        #[arg(long)]
        notes: String,
    },

    /// Trigger the analysis of incoming proposals
    Analyze,

    /// Talk to the assistant; the session is kept in a JSON file
    Chat {
        message: Option<String>,
        #[arg(long, default_value = "chat-session.json")]
        session_file: String,
        /// Start a new session before sending
        #[arg(long)]
        reset: bool,
        /// Print the session history
        #[arg(long)]
        history: bool,
    },

    /// Extract text from an image with the OCR service
    Ocr {
        image: PathBuf,
        #[arg(long)]
        mime: Option<String>,
    },
}

impl Cli {
    /// 命令列參數優先於設定檔
    pub fn apply_overrides(&self, config: &mut DeskConfig) {
        if let Some(base_url) = &self.base_url {
            tracing::debug!("🔧 workflow.base_url overridden to {}", base_url);
            config.workflow.base_url = base_url.clone();
        }
        if let Some(token) = &self.api_token {
            tracing::debug!("🔧 workflow.api_token overridden");
            config.workflow.api_token = token.clone();
        }
    }
}
