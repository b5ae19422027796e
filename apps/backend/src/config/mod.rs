pub mod app_config;
pub mod identity;

pub use app_config::{CacheSettings, Config};
pub use identity::{IdentityConfig, SigningKeySource};
