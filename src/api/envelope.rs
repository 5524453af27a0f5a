//! Consistent response envelope for every operation.
//!
//! Every response is wrapped in either [`ApiResponse`] (success) or
//! [`ApiErrorResponse`] (error), ensuring a uniform JSON shape:
//! `{ "status", "data" | "error", "timestamp" }`.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::error::AnalysisError;

const STATUS_SUCCESS: &str = "success";
const STATUS_ERROR: &str = "error";

/// Successful response: `{ "status": "success", "data": T, "timestamp": ... }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    pub data: T,
    pub timestamp: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: STATUS_SUCCESS,
            data,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Error detail inside [`ApiErrorResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Error response: `{ "status": "error", "error": { "code", "message" }, "timestamp": ... }`
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub status: &'static str,
    pub error: ErrorDetail,
    pub timestamp: String,
}

impl ApiErrorResponse {
    /// Only the stable code and the public message leave the engine.
    pub fn from_error(err: &AnalysisError) -> Self {
        Self {
            status: STATUS_ERROR,
            error: ErrorDetail {
                code: err.code().to_string(),
                message: err.public_message(),
            },
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn into_value(self) -> Value {
        serde_json::json!({
            "status": self.status,
            "error": {
                "code": self.error.code,
                "message": self.error.message,
            },
            "timestamp": self.timestamp,
        })
    }
}

/// Wrap an operation result in the matching envelope.
pub fn respond<T: Serialize>(result: Result<T, AnalysisError>) -> Value {
    let envelope = result.and_then(|data| {
        serde_json::to_value(ApiResponse::ok(data))
            .map_err(|e| AnalysisError::failed("serialization", None, e.to_string()))
    });
    match envelope {
        Ok(value) => value,
        Err(err) => ApiErrorResponse::from_error(&err).into_value(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_response_shape() {
        let v = respond::<Value>(Ok(serde_json::json!({"hello": "world"})));
        assert_eq!(v["status"], "success");
        assert_eq!(v["data"]["hello"], "world");
        assert!(v["timestamp"].is_string());
        assert!(v.get("error").is_none());
    }

    #[test]
    fn test_error_response_shape() {
        let v = respond::<Value>(Err(AnalysisError::UnknownColumn("plant".into())));
        assert_eq!(v["status"], "error");
        assert_eq!(v["error"]["code"], "UNKNOWN_COLUMN");
        assert!(v["error"]["message"].as_str().unwrap().contains("plant"));
        assert!(v.get("data").is_none());
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let err = AnalysisError::failed("correlation", Some("pressure"), "NaN in covariance");
        let v = respond::<Value>(Err(err));
        assert_eq!(v["error"]["code"], "ANALYSIS_FAILED");
        assert!(!v["error"]["message"].as_str().unwrap().contains("NaN"));
    }
}
