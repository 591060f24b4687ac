use crate::core::report::notification_html;
use crate::domain::model::{Notification, ScheduledContract};
use crate::domain::ports::NotificationChannel;
use crate::utils::error::{DeskError, Result};

pub const DEFAULT_SUBJECT: &str = "Notification: Contracts Expiring Soon";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered { recipient: String, contracts: usize },
    NothingToSend,
}

/// Renders a filtered contract set and hands it to the delivery channel once.
///
/// Delivery is at-most-once: a failure is returned to the caller and the
/// rendered notification is dropped.
pub struct NotificationDispatcher<C: NotificationChannel> {
    channel: C,
    subject: String,
    workflow_url: String,
}

impl<C: NotificationChannel> NotificationDispatcher<C> {
    pub fn new(channel: C, workflow_url: impl Into<String>) -> Self {
        Self {
            channel,
            subject: DEFAULT_SUBJECT.to_string(),
            workflow_url: workflow_url.into(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn render(&self, contracts: &[ScheduledContract], recipient: &str) -> Notification {
        Notification {
            recipient: recipient.to_string(),
            subject: self.subject.clone(),
            html: notification_html(contracts, &self.workflow_url),
        }
    }

    pub async fn dispatch(
        &self,
        contracts: &[ScheduledContract],
        recipient: &str,
    ) -> Result<DispatchOutcome> {
        let recipient = recipient.trim();
        if recipient.is_empty() {
            return Err(DeskError::validation("Notification recipient cannot be empty"));
        }

        if contracts.is_empty() {
            tracing::info!("No contracts to report, skipping notification");
            return Ok(DispatchOutcome::NothingToSend);
        }

        let notification = self.render(contracts, recipient);
        tracing::debug!(
            "Dispatching notification '{}' to {} ({} bytes of HTML)",
            notification.subject,
            recipient,
            notification.html.len()
        );

        match self.channel.deliver(&notification).await {
            Ok(()) => {
                tracing::info!(
                    "📧 Notification about {} contracts sent to {}",
                    contracts.len(),
                    recipient
                );
                Ok(DispatchOutcome::Delivered {
                    recipient: recipient.to_string(),
                    contracts: contracts.len(),
                })
            }
            Err(e) => {
                tracing::warn!("Failed to send notification to {}: {}", recipient, e);
                Err(e)
            }
        }
    }
}
