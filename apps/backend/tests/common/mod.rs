#![allow(dead_code)]

// tests/common/mod.rs
use actix_web::body::BoxBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::test;
use backend_test_support::{assert_error_body, ErrorBodyLike};

// Logging is auto-installed for every test binary
#[ctor::ctor]
fn init_logging() {
    backend_test_support::logging::init();
}

/// Read a rejection and check it against the error contract.
pub async fn assert_rejection(
    resp: ServiceResponse<BoxBody>,
    expected_status: StatusCode,
    expected_code: &str,
) -> ErrorBodyLike {
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = test::read_body(resp).await;
    assert_error_body(status, &headers, &body, expected_status, expected_code)
}

/// The `X-Trace-Id` every response is expected to carry.
pub fn trace_id_of(resp: &ServiceResponse<BoxBody>) -> String {
    let trace_id = resp
        .headers()
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .expect("X-Trace-Id header should be present and valid UTF-8");
    assert!(!trace_id.is_empty(), "X-Trace-Id header should not be empty");
    trace_id.to_string()
}
