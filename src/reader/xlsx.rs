//! XLSX reading via calamine.
//!
//! Only the first worksheet is read; the first row is the header row.
//! Date cells are normalized to ISO `YYYY-MM-DD` strings so downstream
//! parsing does not care which reader produced the table.

use calamine::{Data, Reader, Xlsx};
use serde_json::{json, Map, Value};
use std::io::Cursor;

use super::{InputFormat, Table};
use crate::error::{ReadError, ReadResult};

/// Read the first worksheet of an XLSX workbook into a [`Table`].
pub fn read_xlsx_bytes(bytes: &[u8]) -> ReadResult<Table> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| ReadError::Workbook(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(ReadError::EmptyInput)?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ReadError::Workbook(e.to_string()))?;

    let mut rows = range.rows();

    let header_cells = rows.next().ok_or(ReadError::NoHeaders)?;
    let headers: Vec<String> = header_cells
        .iter()
        .map(|c| c.to_string().trim().to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(ReadError::NoHeaders);
    }

    let mut records = Vec::new();

    for row in rows {
        if row.iter().all(is_empty_cell) {
            continue;
        }

        let mut obj = Map::new();
        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = row.get(i).map(cell_to_value).unwrap_or_else(|| json!(""));
            obj.insert(header.clone(), value);
        }
        records.push(Value::Object(obj));
    }

    Ok(Table {
        records,
        headers,
        format: InputFormat::Xlsx,
        encoding: "binary".to_string(),
        delimiter: None,
    })
}

fn is_empty_cell(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => json!(""),
        Data::String(s) => json!(s.trim()),
        Data::Float(f) => json!(f),
        Data::Int(i) => json!(i),
        Data::Bool(b) => json!(b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| json!(d.date().format("%Y-%m-%d").to_string()))
            .unwrap_or_else(|| json!("")),
        Data::DateTimeIso(s) => json!(s),
        Data::DurationIso(s) => json!(s),
        Data::Error(e) => json!(format!("{:?}", e)),
    }
}
