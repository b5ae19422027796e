//! Error body test helpers
//!
//! Mirrors the backend's JSON error contract without depending on backend
//! types, so the contract is asserted from the outside.

use actix_web::http::header::HeaderMap;
use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Local view of the error body returned by the access pipeline.
#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct ErrorBodyLike {
    pub error: String,
    pub code: String,
    #[serde(default)]
    pub subscription_status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub trial_ended_at: Option<String>,
    #[serde(default)]
    pub payment_recovery_endpoints: Option<Vec<String>>,
}

/// Assert that response parts follow the error contract and return the parsed body.
///
/// Checks the status, the JSON content type, the `WWW-Authenticate` rule for
/// 401 responses and the stable `code` field.
pub fn assert_error_body(
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
    expected_status: StatusCode,
    expected_code: &str,
) -> ErrorBodyLike {
    assert_eq!(status, expected_status, "unexpected status");

    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(
        content_type.starts_with("application/json"),
        "error responses must be application/json (got {content_type})"
    );

    let www_auth = headers.get("www-authenticate");
    if expected_status == StatusCode::UNAUTHORIZED {
        assert_eq!(
            www_auth.and_then(|v| v.to_str().ok()),
            Some("Bearer"),
            "401 responses must carry WWW-Authenticate: Bearer"
        );
    } else {
        assert!(
            www_auth.is_none(),
            "{expected_status} responses must not carry WWW-Authenticate"
        );
    }

    let body_str = std::str::from_utf8(body).expect("error body should be UTF-8");
    let parsed: ErrorBodyLike = serde_json::from_str(body_str)
        .unwrap_or_else(|_| panic!("failed to parse error body. Raw body: {body_str}"));

    assert_eq!(parsed.code, expected_code);
    assert!(!parsed.error.is_empty(), "error field should not be empty");
    parsed
}
