//! Domain models for the sheetsum conversion pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`TimeEntry`] - one typed row of the uploaded timesheet
//! - [`SummaryRow`] - one aggregated row of a user sheet
//! - [`UserSheet`] - one output sheet, scoped to a single user
//! - [`TransformKind`] - the closed set of transformations

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::TransformError;

/// Placeholder written when a row has no project selected.
pub const NO_PROJECT_LABEL: &str = "BRAK WYBRANEGO PROJEKTU";

/// XLSX limit on worksheet name length.
pub const SHEET_NAME_LIMIT: usize = 31;

/// Column conventions of the uploaded timesheet.
pub mod columns {
    pub const USER: &str = "User";
    pub const PROJECT: &str = "Project";
    pub const DATE: &str = "Date";
    pub const HOURS: &str = "Hours";
    pub const UNIT: &str = "Spółka (user field)";
}

// =============================================================================
// Timesheet Rows
// =============================================================================

/// One row of the uploaded timesheet, after the schema contract has
/// been applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    /// User identifier.
    pub user: String,
    /// Project name; `None` when the cell was empty.
    pub project: Option<String>,
    /// Calendar date of the entry.
    pub date: NaiveDate,
    /// Hours worked.
    pub hours: f64,
    /// Organizational unit; `None` when the cell was empty.
    pub unit: Option<String>,
}

impl TimeEntry {
    /// Month-year label for this entry, e.g. `Jan-24`.
    pub fn month_label(&self) -> String {
        self.date.format("%b-%y").to_string()
    }
}

// =============================================================================
// Summary Output
// =============================================================================

/// One aggregated row of a user sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    /// Month-year label, e.g. `Jan-24`.
    pub month_year: String,
    /// Project name (never empty; missing projects carry [`NO_PROJECT_LABEL`]).
    pub project: String,
    /// Total hours for this (month, project) group.
    pub total_hours: f64,
    /// Fraction of the user's monthly total in `[0, 1]`.
    ///
    /// NaN when the month total is zero; the division is propagated as-is.
    pub percentage: f64,
}

/// One output sheet, scoped to a single user.
#[derive(Debug, Clone, Serialize)]
pub struct UserSheet {
    /// Sheet name, already truncated to [`SHEET_NAME_LIMIT`] characters.
    pub name: String,
    /// Aggregated rows, ordered by (month-year label, project).
    pub rows: Vec<SummaryRow>,
}

// =============================================================================
// Transformation Selection
// =============================================================================

/// The closed set of transformations.
///
/// Adding a transformation is adding a variant plus a handler in the
/// pipeline; there is no open-ended dispatch by string tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformKind {
    /// Append a `RowSum` column holding the sum of each row's numeric cells.
    RowSum,
    /// One summary sheet per user: monthly hours and percentages per project.
    UserSummary,
}

impl TransformKind {
    /// Parse a transformation selector string.
    ///
    /// Accepts the canonical kebab-case selectors plus the legacy
    /// `script1`/`script2` names the original upload form used.
    pub fn from_selector(selector: &str) -> Result<Self, TransformError> {
        match selector.trim() {
            "row-sum" | "script1" => Ok(Self::RowSum),
            "user-summary" | "script2" => Ok(Self::UserSummary),
            other => Err(TransformError::UnsupportedTransformation(other.to_string())),
        }
    }

    /// Canonical selector string.
    pub fn selector(&self) -> &'static str {
        match self {
            Self::RowSum => "row-sum",
            Self::UserSummary => "user-summary",
        }
    }

    /// One-line description for CLI listings.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::RowSum => "append a RowSum column with the sum of each row's numeric cells",
            Self::UserSummary => "one sheet per user with monthly hours and project percentages",
        }
    }

    /// Every supported transformation.
    pub fn all() -> [TransformKind; 2] {
        [Self::RowSum, Self::UserSummary]
    }
}

impl std::fmt::Display for TransformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.selector())
    }
}
