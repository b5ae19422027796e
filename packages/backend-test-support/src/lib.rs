//! Backend test support utilities
//!
//! Helpers shared by the backend's unit and integration tests: one-time log
//! initialisation and assertions over the structured error body.

pub mod error_body;
pub mod logging;

pub use error_body::{assert_error_body, ErrorBodyLike};
pub use logging::{capture, LogCapture};
