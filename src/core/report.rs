use crate::core::normalize::{
    value_to_text, CLIENT_NAME_KEY, CONTRACT_ID_KEY, CONTRACT_TYPE_KEY, EXPIRATION_DATE_KEY,
    NOTICE_DAYS_KEY,
};
use crate::domain::model::{Contract, ScheduledContract};
use crate::utils::error::{DeskError, Result};
use chrono::NaiveDate;
use html_escape::encode_double_quoted_attribute as escape_html;
use std::collections::BTreeSet;

const DATE_FORMAT: &str = "%Y-%m-%d";

const TABLE_COLUMNS: [&str; 7] = [
    CLIENT_NAME_KEY,
    CONTRACT_TYPE_KEY,
    CONTRACT_ID_KEY,
    EXPIRATION_DATE_KEY,
    NOTICE_DAYS_KEY,
    "notice_deadline",
    "days_until_expiration",
];

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

fn format_optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn extra_columns<'a>(contracts: impl Iterator<Item = &'a Contract>) -> BTreeSet<&'a str> {
    contracts
        .flat_map(|c| c.extra.keys().map(String::as_str))
        .collect()
}

fn table_row(row: &ScheduledContract, extra_columns: &BTreeSet<&str>) -> Vec<String> {
    let contract = &row.contract;
    let mut cells = vec![
        contract.client_name.clone(),
        contract.contract_type.clone(),
        contract.contract_id.clone(),
        format_date(contract.expiration_date),
        format_optional(contract.notice_days),
        format_date(row.notice_deadline),
        format_optional(row.days_until_expiration),
    ];
    cells.extend(
        extra_columns
            .iter()
            .map(|column| contract.extra.get(*column).map(value_to_text).unwrap_or_default()),
    );
    cells
}

/// Renders the rows as an HTML `<table>`, known columns first and then every
/// extra column the server returned. Every cell is escaped.
pub fn html_table(rows: &[ScheduledContract]) -> String {
    let extra_columns = extra_columns(rows.iter().map(|row| &row.contract));

    let mut html = String::from("<table border=\"1\" class=\"contracts\">\n  <thead>\n    <tr>\n");
    for column in TABLE_COLUMNS.iter().chain(extra_columns.iter()) {
        html.push_str(&format!("      <th>{}</th>\n", escape_html(column)));
    }
    html.push_str("    </tr>\n  </thead>\n  <tbody>\n");

    for row in rows {
        html.push_str("    <tr>\n");
        for cell in table_row(row, &extra_columns) {
            html.push_str(&format!("      <td>{}</td>\n", escape_html(&cell)));
        }
        html.push_str("    </tr>\n");
    }

    html.push_str("  </tbody>\n</table>");
    html
}

/// Full email body handed to the notification webhook.
pub fn notification_html(rows: &[ScheduledContract], workflow_url: &str) -> String {
    format!(
        r#"<html>
<body>
    <h2>Contracts Expiring Soon</h2>
    <p>The following contracts will expire soon and may require attention:</p>
    {table}
    <p>Click the link below to access the contract termination process:</p>
    <p><a href="{url}">Generate offers</a></p>
    <p>This is an automated notification. Please do not reply to this email.</p>
</body>
</html>"#,
        table = html_table(rows),
        url = escape_html(workflow_url)
    )
}

/// Label used when asking the user to pick a contract.
pub fn selection_label(row: &ScheduledContract) -> String {
    let days = row
        .days_until_expiration
        .map(|d| d.to_string())
        .unwrap_or_else(|| "?".to_string());
    format!(
        "{} - {} (Expires in {} days)",
        row.contract.client_name, row.contract.contract_type, days
    )
}

/// CSV export of every contract, known columns first and then any extra
/// columns the server returned, sorted by name.
pub fn contracts_csv(contracts: &[Contract]) -> Result<String> {
    let extra_columns = extra_columns(contracts.iter());

    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec![
        CLIENT_NAME_KEY,
        CONTRACT_TYPE_KEY,
        EXPIRATION_DATE_KEY,
        NOTICE_DAYS_KEY,
        CONTRACT_ID_KEY,
    ];
    header.extend(extra_columns.iter().copied());
    writer.write_record(&header)?;

    for contract in contracts {
        let mut record = vec![
            contract.client_name.clone(),
            contract.contract_type.clone(),
            format_date(contract.expiration_date),
            format_optional(contract.notice_days),
            contract.contract_id.clone(),
        ];
        record.extend(
            extra_columns
                .iter()
                .map(|column| contract.extra.get(*column).map(value_to_text).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    let bytes = writer.into_inner().map_err(|e| DeskError::ProcessingError {
        message: format!("Failed to flush CSV writer: {}", e),
    })?;
    String::from_utf8(bytes).map_err(|e| DeskError::ProcessingError {
        message: format!("CSV output is not valid UTF-8: {}", e),
    })
}

/// 匯出檔名，避免公司名稱中的路徑分隔符號
pub fn export_file_name(company: &str) -> String {
    let safe: String = company
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            other => other,
        })
        .collect();
    format!("{}_contracts.csv", safe.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn row(client: &str, days: Option<i64>) -> ScheduledContract {
        ScheduledContract {
            contract: Contract {
                client_name: client.to_string(),
                contract_type: "Maintenance".to_string(),
                expiration_date: NaiveDate::from_ymd_opt(2024, 1, 20),
                notice_days: Some(5),
                contract_id: "C-7".to_string(),
                extra: BTreeMap::new(),
            },
            notice_deadline: NaiveDate::from_ymd_opt(2024, 1, 14),
            days_until_expiration: days,
        }
    }

    #[test]
    fn test_html_table_escapes_cells() {
        let html = html_table(&[row("Dupont & Fils <SA>", Some(5))]);
        assert!(html.contains("<th>societe client</th>"));
        assert!(html.contains("<td>Dupont &amp; Fils &lt;SA&gt;</td>"));
        assert!(html.contains("<td>2024-01-14</td>"));
        assert!(!html.contains("<SA>"));
    }

    #[test]
    fn test_html_table_includes_extra_columns() {
        let mut with_extra = row("Acme", Some(5));
        with_extra
            .contract
            .extra
            .insert("amount".to_string(), json!(9800));
        with_extra
            .contract
            .extra
            .insert("status".to_string(), json!("renew?"));
        let plain = row("Globex", Some(12));

        let html = html_table(&[with_extra, plain]);

        assert!(html.contains("<th>days_until_expiration</th>\n      <th>amount</th>\n      <th>status</th>"));
        assert!(html.contains("<td>5</td>\n      <td>9800</td>\n      <td>renew?</td>"));
        // 沒有該欄位的列輸出空白儲存格
        assert!(html.contains("<td>12</td>\n      <td></td>\n      <td></td>"));
    }

    #[test]
    fn test_notification_html_contains_table_and_link() {
        let html = notification_html(&[row("Acme", Some(5))], "http://localhost:5678/webhook/notify_expiring");
        assert!(html.contains("<h2>Contracts Expiring Soon</h2>"));
        assert!(html.contains("<td>Acme</td>"));
        assert!(html.contains("href=\"http://localhost:5678/webhook/notify_expiring\""));
    }

    #[test]
    fn test_selection_label() {
        assert_eq!(
            selection_label(&row("Acme", Some(5))),
            "Acme - Maintenance (Expires in 5 days)"
        );
        assert_eq!(
            selection_label(&row("Acme", None)),
            "Acme - Maintenance (Expires in ? days)"
        );
    }

    #[test]
    fn test_contracts_csv_includes_extra_columns() {
        let mut with_extra = row("Acme", None).contract;
        with_extra.extra.insert("amount".to_string(), json!(1200));
        with_extra.extra.insert("status".to_string(), json!("active"));
        let mut plain = row("Beta, Inc", None).contract;
        plain.expiration_date = None;

        let csv = contracts_csv(&[with_extra, plain]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "societe client,type of contract,contract_expiration_date,notice_days,contract_id,amount,status"
        );
        assert_eq!(lines[1], "Acme,Maintenance,2024-01-20,5,C-7,1200,active");
        assert_eq!(lines[2], "\"Beta, Inc\",Maintenance,,5,C-7,,");
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("Acme"), "Acme_contracts.csv");
        assert_eq!(export_file_name("A/B"), "A_B_contracts.csv");
    }
}
