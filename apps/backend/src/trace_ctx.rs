//! Task-local trace context for web requests.
//!
//! `RequestTrace` opens the scope; error rendering reads it back so every
//! rejection carries the same `X-Trace-Id` as the rest of the response.

use tokio::task_local;

task_local! {
    static TRACE_ID: String;
}

/// Trace id of the current request, if a trace scope is active.
pub fn current() -> Option<String> {
    TRACE_ID.try_with(|id| id.clone()).ok()
}

/// Trace id of the current request, or "unknown" outside a request scope.
pub fn trace_id() -> String {
    current().unwrap_or_else(|| "unknown".to_string())
}

/// Run a future within a trace context.
pub async fn with_trace_id<F, R>(trace_id: String, future: F) -> R
where
    F: std::future::Future<Output = R>,
{
    TRACE_ID.scope(trace_id, future).await
}
