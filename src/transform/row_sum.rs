//! Row-sum transformation.
//!
//! Appends a `RowSum` column holding the sum of every cell in the row
//! that parses as a number. Works on the generic table; no timesheet
//! schema required.

use serde_json::{json, Value};

use crate::reader::Table;

/// Output column appended by this transformation.
pub const ROW_SUM_COLUMN: &str = "RowSum";

/// Sheet name of the single-sheet output.
pub const OUTPUT_SHEET: &str = "ProcessedData";

/// Append row sums; returns the extended header list and cell rows ready
/// for the writer.
pub fn append_row_sums(table: &Table) -> (Vec<String>, Vec<Vec<Value>>) {
    let mut headers = table.headers.clone();
    headers.push(ROW_SUM_COLUMN.to_string());

    let rows = table
        .records
        .iter()
        .map(|record| {
            let mut cells: Vec<Value> = table
                .headers
                .iter()
                .map(|h| record.get(h).cloned().unwrap_or_else(|| json!("")))
                .collect();
            let sum: f64 = cells.iter().filter_map(numeric_value).sum();
            cells.push(json!(sum));
            cells
        })
        .collect();

    (headers, rows)
}

/// Numeric interpretation of a cell, if any. Text cells tolerate a comma
/// decimal separator.
fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let normalized = s.trim().replace(',', ".");
            if normalized.is_empty() {
                None
            } else {
                normalized.parse().ok()
            }
        }
        _ => None,
    }
}
