//! REST API types.
//!
//! Successful conversions return the statistics document itself (see
//! [`crate::models::StatsDocument`]); only health and error bodies are
//! defined here.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"`
    pub status: String,
    pub service: String,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            service: "quizstats".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Multipart field names.
pub mod fields {
    pub const FILE: &str = "file";
    pub const TEST_ID: &str = "test_id";
}

/// File name of the `/process` download.
pub const RESULT_FILE_NAME: &str = "result.json";

/// Create an error response
pub fn error_response(detail: &str) -> Value {
    json!({
        "status": "error",
        "detail": detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_is_ok() {
        let value = serde_json::to_value(HealthResponse::ok()).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["service"], "quizstats");
    }

    #[test]
    fn test_error_shape() {
        let body = error_response("Invalid test_id format. Must be 24-character hex.");
        assert_eq!(body["status"], "error");
        assert_eq!(body["detail"], "Invalid test_id format. Must be 24-character hex.");
    }
}
