pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::Cli;
pub use config::DeskConfig;

pub use adapters::{http::WorkflowClient, ocr::OcrClient, storage::LocalStorage};
pub use core::desk::{ContractDesk, ContractReview};
pub use core::notify::{DispatchOutcome, NotificationDispatcher};
pub use core::schedule::{evaluate, evaluate_at, Evaluation};
pub use utils::error::{DeskError, Result};
