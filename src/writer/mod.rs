//! Workbook emission via rust_xlsxwriter.
//!
//! The workbook is rendered to an in-memory buffer first and only then
//! written to a temp file that is atomically persisted to the final
//! path, so a failed write never leaves a usable partial artifact.

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{WriteError, WriteResult};
use crate::models::{SummaryRow, UserSheet};

/// Header row of every user summary sheet.
pub const SUMMARY_HEADERS: [&str; 4] = ["Month-Year", "Project", "Total Hours", "Percentage"];

/// Write one summary sheet per user.
///
/// Sheet names arrive already truncated. When two users collapse to the
/// same name, the later sheet silently replaces the earlier one; this
/// mirrors the documented collision behavior, it is not resolved here.
pub fn write_summary(path: &Path, sheets: &[UserSheet]) -> WriteResult<PathBuf> {
    let mut surviving: Vec<(&str, &[SummaryRow])> = Vec::new();
    for sheet in sheets {
        if let Some(slot) = surviving.iter_mut().find(|(name, _)| *name == sheet.name) {
            slot.1 = &sheet.rows;
        } else {
            surviving.push((&sheet.name, &sheet.rows));
        }
    }

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let percentage_format = Format::new().set_num_format("0.00%");

    for (name, rows) in surviving {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name).map_err(workbook_err)?;

        write_header_row(sheet, &SUMMARY_HEADERS, &header_format)?;

        for (i, row) in rows.iter().enumerate() {
            let r = (i + 1) as u32;
            sheet.write(r, 0, &row.month_year).map_err(workbook_err)?;
            sheet.write(r, 1, &row.project).map_err(workbook_err)?;
            sheet.write_number(r, 2, row.total_hours).map_err(workbook_err)?;
            sheet
                .write_number_with_format(r, 3, row.percentage, &percentage_format)
                .map_err(workbook_err)?;
        }

        sheet.set_column_width(0, 12).ok();
        sheet.set_column_width(1, 30).ok();
        sheet.set_column_width(2, 12).ok();
        sheet.set_column_width(3, 12).ok();
    }

    persist(workbook, path)
}

/// Write a generic single-sheet table.
pub fn write_table(
    path: &Path,
    headers: &[String],
    rows: &[Vec<Value>],
    sheet_name: &str,
) -> WriteResult<PathBuf> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name).map_err(workbook_err)?;

    for (col, header) in headers.iter().enumerate() {
        sheet
            .write_with_format(0, col as u16, header, &header_format)
            .map_err(workbook_err)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            write_cell(sheet, r, col as u16, cell)?;
        }
    }

    persist(workbook, path)
}

fn write_header_row(sheet: &mut Worksheet, headers: &[&str], format: &Format) -> WriteResult<()> {
    for (col, header) in headers.iter().enumerate() {
        sheet
            .write_with_format(0, col as u16, *header, format)
            .map_err(workbook_err)?;
    }
    Ok(())
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, cell: &Value) -> WriteResult<()> {
    match cell {
        Value::Number(n) => {
            sheet
                .write_number(row, col, n.as_f64().unwrap_or(f64::NAN))
                .map_err(workbook_err)?;
        }
        Value::Bool(b) => {
            sheet.write_boolean(row, col, *b).map_err(workbook_err)?;
        }
        Value::String(s) => {
            sheet.write_string(row, col, s).map_err(workbook_err)?;
        }
        Value::Null => {}
        other => {
            sheet
                .write_string(row, col, other.to_string())
                .map_err(workbook_err)?;
        }
    }
    Ok(())
}

/// Render to a buffer, write to a temp file in the target directory,
/// then persist to the final path.
fn persist(mut workbook: Workbook, path: &Path) -> WriteResult<PathBuf> {
    let buffer = workbook.save_to_buffer().map_err(workbook_err)?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&buffer)?;
    tmp.persist(path).map_err(|e| WriteError::Io(e.error))?;

    Ok(path.to_path_buf())
}

fn workbook_err(e: XlsxError) -> WriteError {
    WriteError::Workbook(e.to_string())
}
