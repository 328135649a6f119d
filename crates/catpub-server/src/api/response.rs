//! Standard error payload for the publish API
//!
//! Success responses are endpoint-specific (the publish endpoint returns its
//! own `{ok: true, ...}` shape); errors share this envelope so operators
//! always find `error.code`, `error.message` and optional structured details.

use serde::Serialize;

/// Standard error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an error response with structured details (e.g. validation issues)
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn details_are_omitted_when_absent() {
        let body = serde_json::to_value(ErrorResponse::new("NOT_FOUND", "missing")).unwrap();
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert!(body["error"].get("details").is_none());
    }

    #[test]
    fn details_round_trip() {
        let body = serde_json::to_value(ErrorResponse::with_details(
            "VALIDATION_ERROR",
            "bad images",
            json!({"issues": [{"spu": "C", "missingMain": true}]}),
        ))
        .unwrap();
        assert_eq!(body["error"]["details"]["issues"][0]["spu"], "C");
    }
}
