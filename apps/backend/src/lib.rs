#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod errors;
pub mod extractors;
pub mod logging;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod subscription;
pub mod telemetry;
pub mod trace_ctx;

// Re-exports for public API
pub use cache::{CacheInvalidator, CachePolicy};
pub use config::Config;
pub use error::AppError;
pub use extractors::CurrentCaller;
pub use middleware::{RequestTrace, StructuredLogger, TraceSpan};
pub use pipeline::{AccessPipeline, CallerContext};
pub use state::{build_state, AppState, StateBuilder};

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    backend_test_support::logging::init();
}
