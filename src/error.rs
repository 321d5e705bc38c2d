//! Error types for the sheetsum conversion pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`ReadError`] - input reading errors (CSV and XLSX)
//! - [`SchemaError`] - timesheet schema contract violations
//! - [`TransformError`] - transformation errors
//! - [`WriteError`] - artifact writing errors
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Input Reading Errors
// =============================================================================

/// Errors while reading an uploaded table (CSV or XLSX).
#[derive(Debug, Error)]
pub enum ReadError {
    /// Failed to read input bytes.
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode text content.
    #[error("Failed to decode input: {0}")]
    Encoding(String),

    /// Delimited text could not be parsed.
    #[error("Invalid CSV: {0}")]
    Parse(String),

    /// XLSX container could not be opened or walked.
    #[error("Invalid workbook: {0}")]
    Workbook(String),

    /// Input contains no data rows.
    #[error("Input table is empty")]
    EmptyInput,

    /// No header row found.
    #[error("No header row found")]
    NoHeaders,
}

// =============================================================================
// Schema Contract Errors
// =============================================================================

/// Violations of the timesheet schema contract, checked once at entry.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A required column is absent from the header row.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Row-level schema validation failed.
    #[error("Schema validation failed: {}", errors.join("; "))]
    Contract { errors: Vec<String> },

    /// A date cell could not be parsed.
    #[error("Row {row}: cannot parse date '{value}'")]
    InvalidDate { row: usize, value: String },

    /// An hours cell could not be parsed.
    #[error("Row {row}: cannot parse hours '{value}'")]
    InvalidHours { row: usize, value: String },
}

// =============================================================================
// Transformation Errors
// =============================================================================

/// Errors during transformation.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Unknown transformation selector. Fails fast, before any processing.
    #[error("Unsupported transformation: {0}")]
    UnsupportedTransformation(String),

    /// Malformed input surfaced by the schema contract.
    #[error("Malformed input: {0}")]
    Schema(#[from] SchemaError),
}

// =============================================================================
// Artifact Writing Errors
// =============================================================================

/// Errors while emitting the output workbook.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Workbook assembly failed.
    #[error("Failed to build workbook: {0}")]
    Workbook(String),

    /// The artifact could not be persisted.
    #[error("Failed to persist artifact: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::transform::pipeline::run_bytes`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input reading error.
    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    /// Transformation error.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Artifact writing error.
    #[error("Write error: {0}")]
    Write(#[from] WriteError),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for input reading.
pub type ReadResult<T> = Result<T, ReadError>;

/// Result type for schema checks.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for transformations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for artifact writing.
pub type WriteResult<T> = Result<T, WriteError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
