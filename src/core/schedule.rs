//! Notice-deadline calculation and the two window filters.
//!
//! Dates carry no time of day, so they are compared as midnight timestamps
//! against a wall-clock `now`. A contract expiring today has therefore already
//! expired for any `now` after midnight.

use crate::domain::model::{Contract, ScheduledContract};
use chrono::{Days, Local, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// Look-ahead horizon of the expiring-soon window, in calendar months.
pub const EXPIRING_SOON_MONTHS: u32 = 6;

const SECONDS_PER_DAY: i64 = 86_400;

/// `expiration_date - (notice_days + 1)` days, when both inputs are known.
pub fn notice_deadline(contract: &Contract) -> Option<NaiveDate> {
    let expiration = contract.expiration_date?;
    let notice_days = contract.notice_days?;
    // +1 天的偏移沿用既有工作流的計算方式，尚待產品確認
    expiration.checked_sub_days(Days::new(u64::from(notice_days) + 1))
}

pub fn notice_deadlines(contracts: &[Contract]) -> Vec<Option<NaiveDate>> {
    contracts.iter().map(notice_deadline).collect()
}

/// Whole days from `now` until expiration, rounded towards negative infinity.
pub fn days_until_expiration(contract: &Contract, now: NaiveDateTime) -> Option<i64> {
    let expiration = start_of_day(contract.expiration_date?);
    Some((expiration - now).num_seconds().div_euclid(SECONDS_PER_DAY))
}

pub fn schedule(contract: &Contract, now: NaiveDateTime) -> ScheduledContract {
    ScheduledContract {
        contract: contract.clone(),
        notice_deadline: notice_deadline(contract),
        days_until_expiration: days_until_expiration(contract, now),
    }
}

/// The filing deadline has arrived but the contract has not expired yet.
pub fn in_notice_window(contract: &Contract, now: NaiveDateTime) -> bool {
    match (notice_deadline(contract), contract.expiration_date) {
        (Some(deadline), Some(expiration)) => {
            now >= start_of_day(deadline) && start_of_day(expiration) > now
        }
        _ => false,
    }
}

/// Expiration falls within `[now, now + 6 months]`, both bounds inclusive.
pub fn expiring_soon(contract: &Contract, now: NaiveDateTime) -> bool {
    let Some(expiration) = contract.expiration_date.map(start_of_day) else {
        return false;
    };
    let Some(horizon) = now.checked_add_months(Months::new(EXPIRING_SOON_MONTHS)) else {
        return false;
    };
    expiration >= now && expiration <= horizon
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub evaluated_at: NaiveDateTime,
    pub notice_window: Vec<ScheduledContract>,
    pub expiring_soon: Vec<ScheduledContract>,
}

impl Evaluation {
    pub fn is_empty(&self) -> bool {
        self.notice_window.is_empty() && self.expiring_soon.is_empty()
    }
}

pub fn evaluate_at(contracts: &[Contract], now: NaiveDateTime) -> Evaluation {
    let notice_window: Vec<ScheduledContract> = contracts
        .iter()
        .filter(|contract| in_notice_window(contract, now))
        .map(|contract| schedule(contract, now))
        .collect();

    let expiring: Vec<ScheduledContract> = contracts
        .iter()
        .filter(|contract| expiring_soon(contract, now))
        .map(|contract| schedule(contract, now))
        .collect();

    tracing::debug!(
        "Evaluated {} contracts at {}: {} in notice window, {} expiring soon",
        contracts.len(),
        now,
        notice_window.len(),
        expiring.len()
    );

    Evaluation {
        evaluated_at: now,
        notice_window,
        expiring_soon: expiring,
    }
}

pub fn evaluate(contracts: &[Contract]) -> Evaluation {
    evaluate_at(contracts, Local::now().naive_local())
}

pub(crate) fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}
