use crate::domain::model::{ProposalRequest, ReplyBody, ScheduledContract, WebhookReply};
use crate::domain::ports::WorkflowGateway;
use crate::utils::error::{DeskError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Outcome of the last proposal submission, owned by the caller between
/// interactions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmissionState {
    #[default]
    Idle,
    Succeeded {
        status: u16,
        body: Option<ReplyBody>,
    },
    Failed {
        error: String,
    },
}

impl SubmissionState {
    pub fn is_attempted(&self) -> bool {
        !matches!(self, SubmissionState::Idle)
    }

    pub fn record(&mut self, result: &Result<WebhookReply>) {
        *self = match result {
            Ok(reply) => SubmissionState::Succeeded {
                status: reply.status,
                body: reply.body.clone(),
            },
            Err(e) => SubmissionState::Failed {
                error: e.to_string(),
            },
        };
    }

    pub fn clear(&mut self) {
        *self = SubmissionState::Idle;
    }
}

pub fn build_request(
    row: &ScheduledContract,
    notes: &str,
    now: NaiveDateTime,
) -> Result<ProposalRequest> {
    let notes = notes.trim();
    if notes.is_empty() {
        return Err(DeskError::validation(
            "Please enter some information before submitting",
        ));
    }

    let contract = &row.contract;
    Ok(ProposalRequest {
        client_name: contract.client_name.clone(),
        contract_type: contract.contract_type.clone(),
        expiration_date: contract
            .expiration_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        days_until_expiration: row.days_until_expiration.unwrap_or(0),
        notice_days: contract.notice_days.unwrap_or(0),
        contract_id: contract.contract_id.clone(),
        text_content: notes.to_string(),
        timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
    })
}

/// Sends the selected contract and notes to the proposal webhook and records
/// the outcome in `state`. Blank notes are rejected without touching `state`.
pub async fn submit<G: WorkflowGateway + ?Sized>(
    gateway: &G,
    state: &mut SubmissionState,
    row: &ScheduledContract,
    notes: &str,
    now: NaiveDateTime,
) -> Result<WebhookReply> {
    let request = build_request(row, notes, now)?;
    tracing::info!(
        "Submitting contract {} ({}) to proposal workflow",
        request.contract_id,
        request.client_name
    );

    let result = gateway.submit_proposal(&request).await;
    state.record(&result);
    result
}
