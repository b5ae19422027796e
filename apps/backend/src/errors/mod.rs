//! Error handling for the access pipeline.

pub mod error_code;

pub use error_code::ErrorCode;
