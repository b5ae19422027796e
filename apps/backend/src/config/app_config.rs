//! Application configuration loaded once at startup.
//!
//! `Config::from_env` reads the process environment; `Config::from_source`
//! takes any lookup function so parsing can be tested without touching
//! global state. Stages never read the environment themselves.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::identity::{IdentityConfig, SigningKeySource};
use crate::error::AppError;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_IDP_TIMEOUT_MS: u64 = 5000;
const DEFAULT_CACHE_TIMEOUT_MS: u64 = 250;
const DEFAULT_BACKEND_TIMEOUT_MS: u64 = 2000;
const DEFAULT_CACHE_KEY_PREFIX: &str = "cache";
const DEFAULT_PLATFORM_ADMIN_ROLE: &str = "PlatformAdmin";

#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Upper bound for every cache store call.
    pub timeout: Duration,
    /// Prefix used when a policy does not set its own.
    pub key_prefix: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_CACHE_TIMEOUT_MS),
            key_prefix: DEFAULT_CACHE_KEY_PREFIX.to_string(),
        }
    }
}

/// An API key registered for an application, stored as its BLAKE3 digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfiguredApiKey {
    pub application_id: String,
    pub digest: [u8; 32],
}

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,

    // Identity provider
    pub identity: IdentityConfig,

    // Response cache
    pub redis_url: Option<String>,
    pub cache: CacheSettings,

    // Subscription and payment lookups
    pub backend_timeout: Duration,
    pub platform_admin_role: String,

    pub api_keys: Vec<ConfiguredApiKey>,
    pub tenant_seed_file: Option<PathBuf>,
}

impl Config {
    /// Load and validate all configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_source(|key| env::var(key).ok())
    }

    pub fn from_source<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset.
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| get(key).ok_or_else(|| AppError::config(format!("{key} must be set")));

        let host = get("BACKEND_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match get("BACKEND_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| {
                AppError::config(format!("BACKEND_PORT must be a valid port number, got '{raw}'"))
            })?,
            None => DEFAULT_PORT,
        };

        let signing = match get("TOKEN_PUBLIC_KEY_PEM") {
            // Single-line env values commonly carry escaped newlines.
            Some(pem) => SigningKeySource::rsa_pem(&pem.replace("\\n", "\n"))?,
            None => SigningKeySource::Jwks,
        };

        let identity = IdentityConfig {
            host: require("KEYCLOAK_HOST")?,
            realm: require("KEYCLOAK_REALM")?,
            client_id: require("CLIENT_ID")?,
            client_secret: require("CLIENT_SECRET")?,
            audience: get("TOKEN_AUDIENCE"),
            signing,
            request_timeout: millis(&get, "IDP_TIMEOUT_MS", DEFAULT_IDP_TIMEOUT_MS)?,
        };

        let cache = CacheSettings {
            timeout: millis(&get, "CACHE_TIMEOUT_MS", DEFAULT_CACHE_TIMEOUT_MS)?,
            key_prefix: get("CACHE_KEY_PREFIX").unwrap_or_else(|| DEFAULT_CACHE_KEY_PREFIX.to_string()),
        };

        let api_keys = match get("API_KEYS") {
            Some(raw) => parse_api_keys(&raw)?,
            None => Vec::new(),
        };

        Ok(Config {
            host,
            port,
            identity,
            redis_url: get("REDIS_URL"),
            cache,
            backend_timeout: millis(&get, "BACKEND_TIMEOUT_MS", DEFAULT_BACKEND_TIMEOUT_MS)?,
            platform_admin_role: get("PLATFORM_ADMIN_ROLE")
                .unwrap_or_else(|| DEFAULT_PLATFORM_ADMIN_ROLE.to_string()),
            api_keys,
            tenant_seed_file: get("TENANT_SEED_FILE").map(PathBuf::from),
        })
    }
}

fn millis<G>(get: &G, key: &str, default: u64) -> Result<Duration, AppError>
where
    G: Fn(&str) -> Option<String>,
{
    let Some(raw) = get(key) else {
        return Ok(Duration::from_millis(default));
    };
    match raw.parse::<u64>() {
        Ok(0) | Err(_) => Err(AppError::config(format!(
            "{key} must be a positive number of milliseconds, got '{raw}'"
        ))),
        Ok(ms) => Ok(Duration::from_millis(ms)),
    }
}

/// Parse `app_id:blake3_hex` pairs separated by commas.
fn parse_api_keys(raw: &str) -> Result<Vec<ConfiguredApiKey>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (application_id, digest_hex) = entry.split_once(':').ok_or_else(|| {
                AppError::config("API_KEYS entries must look like 'application_id:digest'")
            })?;
            let application_id = application_id.trim();
            if application_id.is_empty() {
                return Err(AppError::config("API_KEYS entry has an empty application id"));
            }
            let digest = blake3::Hash::from_hex(digest_hex.trim()).map_err(|_| {
                AppError::config(format!(
                    "API_KEYS digest for '{application_id}' is not a 64-character hex BLAKE3 hash"
                ))
            })?;
            Ok(ConfiguredApiKey {
                application_id: application_id.to_string(),
                digest: *digest.as_bytes(),
            })
        })
        .collect()
}
