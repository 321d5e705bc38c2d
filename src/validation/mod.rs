//! Entry-time schema contract for timesheet rows.
//!
//! The uploaded table's column set is fixed by convention. Instead of
//! failing somewhere in the middle of the aggregation, the contract is
//! checked once at entry:
//!
//! 1. [`check_columns`] - required columns present in the header row
//! 2. [`validate_rows`] - every row matches the embedded JSON Schema
//! 3. [`extract_entries`] - typed extraction with date and hours parsing
//!
//! All three surface a single [`SchemaError`] path; nothing downstream
//! performs transformation-specific recovery.
//!
//! The schema is embedded at compile time from `schemas/timesheet-row.json`.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{SchemaError, SchemaResult};
use crate::models::{columns, TimeEntry};

/// Maximum number of row errors reported in one contract failure.
const MAX_REPORTED_ERRORS: usize = 10;

/// Date formats accepted in text cells, tried in order. Month-first before
/// day-first, matching how the original tool inferred ambiguous dates.
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%d.%m.%Y", "%Y/%m/%d"];

// Strips a trailing time component, e.g. "2024-01-15 00:00:00" or ISO "T".
static DATETIME_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})[T ]").expect("invalid datetime regex"));

/// Check that every required timesheet column is present.
pub fn check_columns(headers: &[String]) -> SchemaResult<()> {
    for required in [columns::USER, columns::DATE, columns::HOURS] {
        if !headers.iter().any(|h| h == required) {
            return Err(SchemaError::MissingColumn(required.to_string()));
        }
    }
    Ok(())
}

/// Validate every row object against the embedded timesheet schema.
pub fn validate_rows(records: &[Value]) -> SchemaResult<()> {
    let schema: Value = serde_json::from_str(include_str!("../../schemas/timesheet-row.json"))
        .expect("Invalid embedded schema");

    let validator = jsonschema::draft7::new(&schema)
        .map_err(|e| SchemaError::Contract { errors: vec![format!("Invalid schema: {}", e)] })?;

    let mut errors = Vec::new();

    for (i, record) in records.iter().enumerate() {
        for error in validator.iter_errors(record) {
            if errors.len() < MAX_REPORTED_ERRORS {
                // +2: 1-based row numbers plus the header row
                errors.push(format!("Row {}: {}", i + 2, error));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::Contract { errors })
    }
}

/// Extract typed [`TimeEntry`] values from validated row objects.
pub fn extract_entries(records: &[Value]) -> SchemaResult<Vec<TimeEntry>> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| extract_entry(record, i + 2))
        .collect()
}

fn extract_entry(record: &Value, row: usize) -> SchemaResult<TimeEntry> {
    let user = optional_text(record.get(columns::USER))
        .ok_or_else(|| SchemaError::MissingColumn(columns::USER.to_string()))?;

    let date = parse_date(record.get(columns::DATE), row)?;
    let hours = parse_hours(record.get(columns::HOURS), row)?;

    Ok(TimeEntry {
        user,
        project: optional_text(record.get(columns::PROJECT)),
        date,
        hours,
        unit: optional_text(record.get(columns::UNIT)),
    })
}

/// Non-empty trimmed text from a cell; numbers are stringified.
fn optional_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_date(value: Option<&Value>, row: usize) -> SchemaResult<NaiveDate> {
    match value {
        Some(Value::String(s)) => {
            let text = s.trim();
            let text = DATETIME_PREFIX
                .captures(text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str())
                .unwrap_or(text);

            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .ok_or_else(|| SchemaError::InvalidDate { row, value: s.trim().to_string() })
        }
        // Spreadsheets without date formatting deliver serial day numbers
        Some(Value::Number(n)) => {
            let serial = n
                .as_f64()
                .ok_or_else(|| SchemaError::InvalidDate { row, value: n.to_string() })?;
            excel_serial_to_date(serial)
                .ok_or_else(|| SchemaError::InvalidDate { row, value: n.to_string() })
        }
        other => Err(SchemaError::InvalidDate {
            row,
            value: other.map(|v| v.to_string()).unwrap_or_default(),
        }),
    }
}

/// Excel's 1900 date system: day 1 is 1900-01-01, with the epoch shifted
/// two days to absorb the fictitious 1900-02-29.
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_days(chrono::Days::new(serial.trunc() as u64))
}

fn parse_hours(value: Option<&Value>, row: usize) -> SchemaResult<f64> {
    match value {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| SchemaError::InvalidHours { row, value: n.to_string() }),
        Some(Value::String(s)) => {
            let normalized = s.trim().replace(',', ".");
            normalized
                .parse::<f64>()
                .map_err(|_| SchemaError::InvalidHours { row, value: s.trim().to_string() })
        }
        other => Err(SchemaError::InvalidHours {
            row,
            value: other.map(|v| v.to_string()).unwrap_or_default(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_required_columns_present() {
        let ok = headers(&["User", "Project", "Date", "Hours", "Spółka (user field)"]);
        assert!(check_columns(&ok).is_ok());
    }

    #[test]
    fn test_missing_column_reported() {
        let bad = headers(&["User", "Project", "Date"]);
        let err = check_columns(&bad).unwrap_err();
        assert!(matches!(err, SchemaError::MissingColumn(ref c) if c == "Hours"));
    }

    #[test]
    fn test_row_contract_accepts_typical_rows() {
        let rows = vec![
            json!({"User": "Alice", "Project": "Apollo", "Date": "2024-01-15", "Hours": 8.0}),
            json!({"User": "Bob", "Project": "", "Date": "2024-01-16", "Hours": "6,5"}),
        ];
        assert!(validate_rows(&rows).is_ok());
    }

    #[test]
    fn test_row_contract_rejects_missing_field() {
        let rows = vec![json!({"User": "Alice", "Date": "2024-01-15"})];
        let err = validate_rows(&rows).unwrap_err();
        match err {
            SchemaError::Contract { errors } => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("Row 2"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_extract_typical_entry() {
        let rows = vec![json!({
            "User": "Alice",
            "Project": "Apollo",
            "Date": "2024-01-15",
            "Hours": 7.5,
            "Spółka (user field)": "Beta"
        })];

        let entries = extract_entries(&rows).unwrap();
        assert_eq!(entries[0].user, "Alice");
        assert_eq!(entries[0].project.as_deref(), Some("Apollo"));
        assert_eq!(entries[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(entries[0].hours, 7.5);
        assert_eq!(entries[0].unit.as_deref(), Some("Beta"));
    }

    #[test]
    fn test_empty_project_becomes_none() {
        let rows = vec![json!({"User": "A", "Project": "  ", "Date": "2024-01-15", "Hours": 1})];
        let entries = extract_entries(&rows).unwrap();
        assert!(entries[0].project.is_none());
    }

    #[test]
    fn test_date_formats() {
        for raw in ["2024-01-15", "01/15/2024", "15.01.2024", "2024-01-15 00:00:00"] {
            let rows = vec![json!({"User": "A", "Date": raw, "Hours": 1})];
            let entries = extract_entries(&rows).unwrap();
            assert_eq!(
                entries[0].date,
                NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                "failed for {raw}"
            );
        }
    }

    #[test]
    fn test_excel_serial_date() {
        // 45306 is 2024-01-15 in the 1900 date system
        let rows = vec![json!({"User": "A", "Date": 45306, "Hours": 1})];
        let entries = extract_entries(&rows).unwrap();
        assert_eq!(entries[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_unparseable_date_is_schema_error() {
        let rows = vec![json!({"User": "A", "Date": "soon", "Hours": 1})];
        let err = extract_entries(&rows).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDate { row: 2, .. }));
    }

    #[test]
    fn test_comma_decimal_hours() {
        let rows = vec![json!({"User": "A", "Date": "2024-01-15", "Hours": "7,25"})];
        let entries = extract_entries(&rows).unwrap();
        assert_eq!(entries[0].hours, 7.25);
    }

    #[test]
    fn test_bad_hours_is_schema_error() {
        let rows = vec![json!({"User": "A", "Date": "2024-01-15", "Hours": "lots"})];
        let err = extract_entries(&rows).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidHours { row: 2, .. }));
    }
}
