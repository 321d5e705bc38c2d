//! # Sheetsum - spreadsheet upload/transform/download converter
//!
//! Sheetsum accepts an uploaded timesheet spreadsheet (XLSX or CSV),
//! applies one of a closed set of transformations, and hands back a new
//! workbook. The interesting one summarizes hours per user: one sheet
//! per user with monthly totals and project percentages.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Spreadsheet│────▶│   Reader    │────▶│  Transform  │────▶│   Workbook  │
//! │  (xlsx/csv) │     │ (auto-enc)  │     │ (summary)   │     │  (per-user) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sheetsum::{run_file, RunOptions, TransformKind};
//! use std::path::Path;
//!
//! fn main() {
//!     let options = RunOptions::new(TransformKind::UserSummary, "processed_files", "processed");
//!     let report = run_file(Path::new("timesheet.xlsx"), &options).unwrap();
//!     println!("Wrote {} sheets to {}", report.sheet_count, report.artifact.display());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (TimeEntry, SummaryRow, TransformKind)
//! - [`reader`] - XLSX/CSV reading with auto-detection
//! - [`validation`] - Timesheet schema contract
//! - [`transform`] - Row-sum, user summary, and the pipeline
//! - [`writer`] - Workbook emission
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Input
pub mod reader;

// Schema contract
pub mod validation;

// Transformation
pub mod transform;

// Output
pub mod writer;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    PipelineError, ReadError, SchemaError, ServerError, TransformError, WriteError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    SummaryRow, TimeEntry, TransformKind, UserSheet, NO_PROJECT_LABEL, SHEET_NAME_LIMIT,
};

// =============================================================================
// Re-exports - Reading
// =============================================================================

pub use reader::{
    detect_delimiter, detect_encoding, read_bytes, read_csv_bytes, read_file, InputFormat, Table,
};

// =============================================================================
// Re-exports - Schema contract
// =============================================================================

pub use validation::{check_columns, extract_entries, validate_rows};

// =============================================================================
// Re-exports - Transformations
// =============================================================================

pub use transform::row_sum::append_row_sums;
pub use transform::summary::summarize;

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    run_bytes, run_bytes_with_selector, run_file, RunOptions, RunReport, TableInfo,
};

// =============================================================================
// Re-exports - Writer
// =============================================================================

pub use writer::{write_summary, write_table};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, sanitize_output_name, InspectResponse};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
