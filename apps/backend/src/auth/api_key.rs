//! API-key authentication for application (machine) callers.

use std::sync::Arc;

use actix_web::http::header::{self, HeaderMap};
use async_trait::async_trait;
use serde::Serialize;

use crate::config::app_config::ConfiguredApiKey;
use crate::error::AppError;
use crate::logging::security;
use crate::pipeline::context::AccessContext;
use crate::pipeline::stage::AccessStage;

// Header names are case-insensitive, so this also matches `X-API-Key`.
const API_KEY_HEADER: &str = "x-api-key";

/// Application identity published for API-key authenticated requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationCaller {
    pub application_id: String,
}

pub trait ApiKeyVerifier: Send + Sync {
    /// Returns the owning application for a valid key.
    fn verify(&self, key: &str) -> Option<ApplicationCaller>;
}

/// Verifies keys against a fixed set of BLAKE3 digests.
#[derive(Debug, Clone, Default)]
pub struct StaticApiKeyVerifier {
    keys: Vec<ConfiguredApiKey>,
}

impl StaticApiKeyVerifier {
    pub fn new(keys: Vec<ConfiguredApiKey>) -> Self {
        Self { keys }
    }
}

impl ApiKeyVerifier for StaticApiKeyVerifier {
    fn verify(&self, key: &str) -> Option<ApplicationCaller> {
        // blake3::Hash equality is constant-time.
        let presented = blake3::hash(key.as_bytes());
        self.keys
            .iter()
            .find(|entry| presented == blake3::Hash::from(entry.digest))
            .map(|entry| ApplicationCaller {
                application_id: entry.application_id.clone(),
            })
    }
}

/// `X-Api-Key` first, then `Authorization: Bearer <key>`.
fn presented_key(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(key) = from_header {
        return Some(key.to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub struct ApiKeyAuthentication {
    verifier: Arc<dyn ApiKeyVerifier>,
}

impl ApiKeyAuthentication {
    pub fn new(verifier: Arc<dyn ApiKeyVerifier>) -> Self {
        Self { verifier }
    }
}

#[async_trait]
impl AccessStage for ApiKeyAuthentication {
    fn name(&self) -> &'static str {
        "authenticate_api_key"
    }

    async fn admit(&self, ctx: &mut AccessContext) -> Result<(), AppError> {
        let key = presented_key(ctx.headers()).ok_or_else(AppError::missing_credentials)?;
        let application = self.verifier.verify(&key).ok_or(AppError::InvalidApiKey)?;

        security::api_key_accepted(&application.application_id, ctx.peer_ip());
        ctx.attach_application(application);
        Ok(())
    }
}
