//! High-level pipeline: uploaded bytes in, workbook artifact out.
//!
//! Combines reading, the schema contract, the selected transformation
//! and artifact writing into one blocking call. One invocation writes
//! exactly one artifact; invocations with distinct output names are
//! independent, same-name invocations race on the same file.
//!
//! # Example
//!
//! ```rust,ignore
//! use sheetsum::{run_bytes, RunOptions, TransformKind};
//!
//! let options = RunOptions::new(TransformKind::UserSummary, "processed_files", "processed");
//! let report = run_bytes(&bytes, &options)?;
//! println!("wrote {}", report.artifact.display());
//! ```

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::api::logs::{log_info, log_success};
use crate::error::{PipelineError, PipelineResult, ReadError, TransformError, TransformResult};
use crate::models::{TransformKind, UserSheet};
use crate::reader::{self, Table};
use crate::transform::{row_sum, summary};
use crate::validation;
use crate::writer;

/// Options for one pipeline run. Explicit values, no process globals:
/// the caller owns the output directory and has created it.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Which transformation to apply.
    pub kind: TransformKind,
    /// Directory the artifact is written into.
    pub output_dir: PathBuf,
    /// Artifact base name; `.xlsx` is appended.
    pub output_name: String,
}

impl RunOptions {
    pub fn new(
        kind: TransformKind,
        output_dir: impl Into<PathBuf>,
        output_name: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            output_dir: output_dir.into(),
            output_name: output_name.into(),
        }
    }

    /// Final artifact path for this run.
    pub fn target_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.xlsx", self.output_name))
    }
}

/// Input table metadata carried into the report.
#[derive(Debug, Clone, Serialize)]
pub struct TableInfo {
    pub format: String,
    pub encoding: String,
    pub delimiter: Option<char>,
    pub headers: Vec<String>,
    pub row_count: usize,
}

impl From<&Table> for TableInfo {
    fn from(table: &Table) -> Self {
        Self {
            format: table.format.as_str().to_string(),
            encoding: table.encoding.clone(),
            delimiter: table.delimiter,
            headers: table.headers.clone(),
            row_count: table.records.len(),
        }
    }
}

/// Result of a completed pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Path of the written artifact.
    pub artifact: PathBuf,
    /// Number of sheets in the artifact.
    pub sheet_count: usize,
    /// Number of data rows across all sheets.
    pub row_count: usize,
    /// Input table metadata.
    pub table_info: TableInfo,
}

/// Run a transformation on uploaded bytes.
pub fn run_bytes(bytes: &[u8], options: &RunOptions) -> PipelineResult<RunReport> {
    log_info("Reading input table...");
    let table = reader::read_bytes(bytes)?;
    log_success(format!(
        "Read {} rows, {} columns ({})",
        table.records.len(),
        table.headers.len(),
        table.format.as_str()
    ));

    if table.records.is_empty() {
        return Err(ReadError::EmptyInput.into());
    }

    let table_info = TableInfo::from(&table);
    let target = options.target_path();

    let (artifact, sheet_count, row_count) = match options.kind {
        TransformKind::RowSum => {
            log_info("Applying row-sum transformation...");
            let (headers, rows) = row_sum::append_row_sums(&table);
            let row_count = rows.len();
            let artifact = writer::write_table(&target, &headers, &rows, row_sum::OUTPUT_SHEET)?;
            (artifact, 1, row_count)
        }
        TransformKind::UserSummary => {
            log_info("Checking timesheet schema...");
            let sheets = build_summary(&table)?;
            let row_count = sheets.iter().map(|s| s.rows.len()).sum();
            let sheet_count = sheets.len();
            log_success(format!("Summarized {} user sheet(s)", sheet_count));
            let artifact = writer::write_summary(&target, &sheets)?;
            (artifact, sheet_count, row_count)
        }
    };

    log_success(format!("Artifact written: {}", artifact.display()));

    Ok(RunReport {
        artifact,
        sheet_count,
        row_count,
        table_info,
    })
}

/// Run a transformation on a file from disk.
pub fn run_file(path: &Path, options: &RunOptions) -> PipelineResult<RunReport> {
    let bytes = std::fs::read(path).map_err(ReadError::from)?;
    run_bytes(&bytes, options)
}

/// Run with a raw selector string. The selector is resolved before any
/// processing, so an unsupported selector produces no artifact.
pub fn run_bytes_with_selector(
    bytes: &[u8],
    selector: &str,
    output_dir: impl Into<PathBuf>,
    output_name: impl Into<String>,
) -> PipelineResult<RunReport> {
    let kind = TransformKind::from_selector(selector).map_err(PipelineError::Transform)?;
    run_bytes(bytes, &RunOptions::new(kind, output_dir, output_name))
}

/// Schema contract plus aggregation for the user-summary transformation.
fn build_summary(table: &Table) -> TransformResult<Vec<UserSheet>> {
    validation::check_columns(&table.headers).map_err(TransformError::from)?;
    validation::validate_rows(&table.records).map_err(TransformError::from)?;
    let entries = validation::extract_entries(&table.records).map_err(TransformError::from)?;
    Ok(summary::summarize(&entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMESHEET_CSV: &str = "\
User;Project;Date;Hours;Spółka (user field)
Alice;Apollo;2024-01-03;5;Beta
Alice;Hermes;2024-01-10;15;Beta
Bob;;2024-01-04;8;";

    #[test]
    fn test_user_summary_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let options = RunOptions::new(TransformKind::UserSummary, dir.path(), "processed");

        let report = run_bytes(TIMESHEET_CSV.as_bytes(), &options).unwrap();

        assert_eq!(report.sheet_count, 2);
        assert_eq!(report.row_count, 3);
        assert_eq!(report.artifact, dir.path().join("processed.xlsx"));

        let bytes = std::fs::read(&report.artifact).unwrap();
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn test_row_sum_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let options = RunOptions::new(TransformKind::RowSum, dir.path(), "sums");

        let csv = "a;b\n1;2\n3;4";
        let report = run_bytes(csv.as_bytes(), &options).unwrap();

        assert_eq!(report.sheet_count, 1);
        assert_eq!(report.row_count, 2);
        assert!(report.artifact.exists());
    }

    #[test]
    fn test_unsupported_selector_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();

        let err = run_bytes_with_selector(TIMESHEET_CSV.as_bytes(), "script99", dir.path(), "out")
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Transform(TransformError::UnsupportedTransformation(_))
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_column_is_malformed_input() {
        let dir = tempfile::tempdir().unwrap();
        let options = RunOptions::new(TransformKind::UserSummary, dir.path(), "out");

        let csv = "User;Project;Date\nAlice;Apollo;2024-01-03";
        let err = run_bytes(csv.as_bytes(), &options).unwrap_err();

        assert!(err.to_string().contains("Hours"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_input_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let options = RunOptions::new(TransformKind::RowSum, dir.path(), "out");

        let err = run_bytes("a;b\n".as_bytes(), &options).unwrap_err();
        assert!(matches!(err, PipelineError::Read(ReadError::EmptyInput)));
    }
}
