pub mod desk;
pub mod normalize;
pub mod notify;
pub mod proposal;
pub mod report;
pub mod schedule;
pub mod session;
pub mod upload;

pub use crate::domain::model::{Contract, Record, ScheduledContract};
pub use crate::domain::ports::{ConfigProvider, NotificationChannel, Storage, WorkflowGateway};
pub use crate::utils::error::Result;
