//! REST API types.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::transform::pipeline::TableInfo;

/// Response for `POST /api/inspect`: parsing metadata without running
/// any transformation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectResponse {
    /// Unique job identifier.
    pub job_id: String,

    /// Original upload filename, if provided.
    pub file_name: Option<String>,

    /// Detected input format ("xlsx" or "csv").
    pub format: String,

    /// Detected text encoding ("binary" for xlsx).
    pub encoding: String,

    /// Detected CSV delimiter, if any.
    pub delimiter: Option<String>,

    /// Number of data rows.
    pub row_count: usize,

    /// Column headers in source order.
    pub columns: Vec<String>,
}

impl InspectResponse {
    pub fn new(info: &TableInfo, file_name: Option<String>) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            file_name,
            format: info.format.clone(),
            encoding: info.encoding.clone(),
            delimiter: info.delimiter.map(|d| d.to_string()),
            row_count: info.row_count,
            columns: info.headers.clone(),
        }
    }
}

/// Create a JSON error body.
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}

/// Sanitize a caller-supplied output base name, the way upload handlers
/// traditionally neutralize path tricks in filenames.
pub fn sanitize_output_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .trim_end_matches(".xlsx")
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' '))
        .collect();
    let cleaned = cleaned.trim_matches(['.', ' ']).to_string();

    if cleaned.is_empty() {
        "processed".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_shape() {
        let body = error_response("boom");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "boom");
        assert!(body["jobId"].as_str().is_some());
    }

    #[test]
    fn test_sanitize_strips_path_components() {
        assert_eq!(sanitize_output_name("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_output_name("report 2024"), "report 2024");
        assert_eq!(sanitize_output_name("summary.xlsx"), "summary");
    }

    #[test]
    fn test_sanitize_empty_falls_back() {
        assert_eq!(sanitize_output_name(""), "processed");
        assert_eq!(sanitize_output_name("///"), "processed");
    }
}
