use crate::core::normalize::normalize_records;
use crate::core::report::{contracts_csv, export_file_name};
use crate::core::schedule::{evaluate, evaluate_at, Evaluation};
use crate::domain::model::Contract;
use crate::domain::ports::{Storage, WorkflowGateway};
use crate::utils::error::Result;
use chrono::NaiveDateTime;

/// All contracts of one company plus the buckets computed for one instant.
#[derive(Debug, Clone)]
pub struct ContractReview {
    pub company: String,
    pub contracts: Vec<Contract>,
    pub evaluation: Evaluation,
}

/// Fetch, normalize and evaluate. Every call goes back to the workflow server;
/// nothing is cached between calls.
pub struct ContractDesk<G: WorkflowGateway> {
    gateway: G,
}

impl<G: WorkflowGateway> ContractDesk<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub async fn company_names(&self) -> Result<Vec<String>> {
        let companies = self.gateway.list_companies().await?;
        tracing::debug!("Fetched {} companies", companies.len());
        Ok(companies.into_iter().map(|c| c.company_name).collect())
    }

    pub async fn contracts(&self, company: &str) -> Result<Vec<Contract>> {
        let records = self.gateway.fetch_contracts(company).await?;
        tracing::info!("Fetched {} contracts for {}", records.len(), company);
        Ok(normalize_records(&records))
    }

    pub async fn review_at(&self, company: &str, now: NaiveDateTime) -> Result<ContractReview> {
        let contracts = self.contracts(company).await?;
        let evaluation = evaluate_at(&contracts, now);
        Ok(Self::reviewed(company, contracts, evaluation))
    }

    /// Same as [`ContractDesk::review_at`] with the local wall clock as "now".
    pub async fn review(&self, company: &str) -> Result<ContractReview> {
        let contracts = self.contracts(company).await?;
        let evaluation = evaluate(&contracts);
        Ok(Self::reviewed(company, contracts, evaluation))
    }

    fn reviewed(company: &str, contracts: Vec<Contract>, evaluation: Evaluation) -> ContractReview {
        if !evaluation.notice_window.is_empty() {
            tracing::warn!(
                "⚠️ {} contracts of {} are in their notice period",
                evaluation.notice_window.len(),
                company
            );
        }

        ContractReview {
            company: company.to_string(),
            contracts,
            evaluation,
        }
    }

    /// Writes `{company}_contracts.csv` and returns the file name.
    pub async fn export_csv<S: Storage>(&self, storage: &S, review: &ContractReview) -> Result<String> {
        let file_name = export_file_name(&review.company);
        let csv = contracts_csv(&review.contracts)?;
        storage.write_file(&file_name, csv.as_bytes()).await?;
        tracing::debug!("Exported {} contracts to {}", review.contracts.len(), file_name);
        Ok(file_name)
    }
}
