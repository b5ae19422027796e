//! Structured security events emitted by the access pipeline.
//!
//! Raw credentials never reach these functions; emails are redacted.

use tracing::{info, warn};

use crate::logging::pii::Redacted;
use crate::trace_ctx;

pub fn auth_succeeded(subject: &str, email: &str, roles: &[&str], ip: Option<&str>) {
    let trace_id = trace_ctx::trace_id();

    info!(
        event = "SECURITY_AUTH_SUCCEEDED",
        %trace_id,
        subject,
        email = %Redacted(email),
        roles = ?roles,
        ip = ip.unwrap_or("unknown"),
        "Caller authenticated"
    );
}

pub fn api_key_accepted(application_id: &str, ip: Option<&str>) {
    let trace_id = trace_ctx::trace_id();

    info!(
        event = "SECURITY_API_KEY_ACCEPTED",
        %trace_id,
        application_id,
        ip = ip.unwrap_or("unknown"),
        "Application authenticated"
    );
}

/// One record per rejected request.
pub fn access_denied(
    stage: &str,
    reason: &str,
    method: &str,
    path: &str,
    organization_id: Option<&str>,
) {
    let trace_id = trace_ctx::trace_id();

    warn!(
        event = "SECURITY_ACCESS_DENIED",
        %trace_id,
        stage,
        reason,
        method,
        path,
        organization_id = organization_id.unwrap_or("none"),
        "Request rejected"
    );
}

/// The cache backend misbehaved; the request carried on uncached.
pub fn cache_degraded(operation: &str, key: &str, error: &str) {
    let trace_id = trace_ctx::trace_id();

    warn!(
        event = "CACHE_DEGRADED",
        %trace_id,
        operation,
        key,
        error,
        "Cache unavailable, continuing without it"
    );
}
