use crate::domain::model::{Contract, Record};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::collections::BTreeMap;

pub const CLIENT_NAME_KEY: &str = "societe client";
pub const CONTRACT_TYPE_KEY: &str = "type of contract";
/// 部分工作流輸出使用的拼寫
pub const CONTRACT_TYPE_ALIAS: &str = "type of contrat";
pub const EXPIRATION_DATE_KEY: &str = "contract_expiration_date";
pub const NOTICE_DAYS_KEY: &str = "notice_days";
pub const CONTRACT_ID_KEY: &str = "contract_id";

const KNOWN_KEYS: [&str; 6] = [
    CLIENT_NAME_KEY,
    CONTRACT_TYPE_KEY,
    CONTRACT_TYPE_ALIAS,
    EXPIRATION_DATE_KEY,
    NOTICE_DAYS_KEY,
    CONTRACT_ID_KEY,
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
// %.f 也接受沒有小數秒的輸入
const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

pub fn normalize_records(records: &[Record]) -> Vec<Contract> {
    records.iter().map(normalize_record).collect()
}

/// Coerces one raw row into a [`Contract`].
///
/// Unparseable dates and notice periods become `None` rather than errors, so a
/// malformed row simply drops out of every date-based view.
pub fn normalize_record(record: &Record) -> Contract {
    let expiration_date = record.data.get(EXPIRATION_DATE_KEY).and_then(parse_date);
    let notice_days = record.data.get(NOTICE_DAYS_KEY).and_then(parse_notice_days);

    let contract_id = text_field(record, &[CONTRACT_ID_KEY]);
    if expiration_date.is_none() || notice_days.is_none() {
        tracing::debug!(
            "Contract '{}' has incomplete scheduling fields (expiration: {:?}, notice_days: {:?})",
            contract_id,
            record.data.get(EXPIRATION_DATE_KEY),
            record.data.get(NOTICE_DAYS_KEY)
        );
    }

    let extra: BTreeMap<String, Value> = record
        .data
        .iter()
        .filter(|(key, _)| !KNOWN_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Contract {
        client_name: text_field(record, &[CLIENT_NAME_KEY]),
        contract_type: text_field(record, &[CONTRACT_TYPE_KEY, CONTRACT_TYPE_ALIAS]),
        expiration_date,
        notice_days,
        contract_id,
        extra,
    }
}

pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let raw = value.as_str()?.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
    {
        return Some(date);
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.naive_local().date());
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|date_time| date_time.date())
}

/// Accepts integers, integral floats (`30.0`) and numeric strings. Negative or
/// fractional values are treated as unknown.
pub fn parse_notice_days(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => {
            if let Some(days) = number.as_u64() {
                return u32::try_from(days).ok();
            }
            number.as_f64().and_then(integral_days)
        }
        Value::String(raw) => {
            let raw = raw.trim();
            raw.parse::<u32>()
                .ok()
                .or_else(|| raw.parse::<f64>().ok().and_then(integral_days))
        }
        _ => None,
    }
}

fn integral_days(value: f64) -> Option<u32> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX) {
        Some(value as u32)
    } else {
        None
    }
}

fn text_field(record: &Record, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| record.data.get(*key))
        .map(value_to_text)
        .unwrap_or_default()
}

pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
