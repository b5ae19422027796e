//! Bearer-token authentication stage.

use std::sync::Arc;
use std::time::Duration;

use actix_web::http::header::{self, HeaderMap};
use async_trait::async_trait;
use tokio::time::timeout;

use crate::auth::claims::IdentityClaims;
use crate::auth::identity::IdentityProvider;
use crate::error::AppError;
use crate::logging::security;
use crate::pipeline::context::AccessContext;
use crate::pipeline::stage::AccessStage;

/// Extract the token from `Authorization: Bearer <token>`.
///
/// Returns `Ok(None)` when the header is absent and an error when it is
/// present but not a well-formed bearer credential.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let raw = value.to_str().map_err(|_| AppError::missing_credentials())?;

    let parts: Vec<&str> = raw.split_whitespace().collect();
    if parts.len() != 2 || parts[0] != "Bearer" || parts[1].is_empty() {
        return Err(AppError::missing_credentials());
    }
    Ok(Some(parts[1].to_string()))
}

/// Validates bearer tokens against the identity provider: introspect, then
/// decode locally, then type the claims.
pub struct TokenValidator {
    provider: Arc<dyn IdentityProvider>,
    client_id: String,
    timeout: Duration,
}

impl TokenValidator {
    pub fn new(provider: Arc<dyn IdentityProvider>, client_id: impl Into<String>, timeout: Duration) -> Self {
        Self {
            provider,
            client_id: client_id.into(),
            timeout,
        }
    }

    /// Turn a raw token into identity claims. Not retried on failure.
    pub async fn validate(&self, token: &str) -> Result<IdentityClaims, AppError> {
        let introspection = timeout(self.timeout, self.provider.introspect(token))
            .await
            .map_err(|_| AppError::auth_service("token introspection timed out"))??;
        if !introspection.active {
            return Err(AppError::InvalidToken);
        }

        let decoded = timeout(self.timeout, self.provider.decode(token))
            .await
            .map_err(|_| AppError::auth_service("token decode timed out"))??;

        decoded.into_identity(&self.client_id)
    }
}

#[async_trait]
impl AccessStage for TokenValidator {
    fn name(&self) -> &'static str {
        "authenticate"
    }

    async fn admit(&self, ctx: &mut AccessContext) -> Result<(), AppError> {
        let token = bearer_token(ctx.headers())?.ok_or_else(AppError::missing_credentials)?;
        let claims = self.validate(&token).await?;

        let subject = claims.subject.to_string();
        let roles: Vec<&str> = claims.roles.iter().collect();
        security::auth_succeeded(&subject, &claims.email, &roles, ctx.peer_ip());

        ctx.attach_claims(claims);
        Ok(())
    }
}
