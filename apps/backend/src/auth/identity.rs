//! Identity-provider client contract and the Keycloak-backed implementation.
//!
//! Introspection is a network call. Decoding is local: signature material is
//! either configured up front or fetched once from the realm JWKS endpoint
//! and cached until an unknown `kid` shows up.

use async_trait::async_trait;
use jsonwebtoken::jwk::{JwkSet, KeyAlgorithm};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::auth::claims::AccessTokenClaims;
use crate::config::identity::{IdentityConfig, SigningKeySource};
use crate::error::AppError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IdentityError {
    /// The provider could not be reached or did not answer in time.
    #[error("identity provider transport error: {0}")]
    Transport(String),
    /// The provider answered with something other than a usable result.
    #[error("identity provider protocol error: {0}")]
    Protocol(String),
    /// The token could not be decoded or verified locally.
    #[error("token decode error: {0}")]
    Decode(String),
    /// The token decoded but its claims did not have the expected shape.
    #[error("token claims error: {0}")]
    Claims(String),
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Claims(detail) => AppError::malformed_claims(detail),
            other => AppError::auth_service(other.to_string()),
        }
    }
}

/// Result of a token introspection call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Introspection {
    pub active: bool,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Ask the provider whether `token` is currently active.
    async fn introspect(&self, token: &str) -> Result<Introspection, IdentityError>;

    /// Verify and decode `token` into its typed claim set.
    async fn decode(&self, token: &str) -> Result<AccessTokenClaims, IdentityError>;
}

#[derive(Deserialize)]
struct IntrospectionResponse {
    active: Option<bool>,
}

pub struct KeycloakProvider {
    http: reqwest::Client,
    config: IdentityConfig,
    jwks: RwLock<Option<JwkSet>>,
}

impl KeycloakProvider {
    pub fn new(config: IdentityConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::config(format!("failed to build identity HTTP client: {e}")))?;

        Ok(Self {
            http,
            config,
            jwks: RwLock::new(None),
        })
    }

    fn validation(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        match &self.config.audience {
            Some(audience) => validation.set_audience(&[audience.as_str()]),
            None => validation.validate_aud = false,
        }
        validation
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, IdentityError> {
        let url = self.config.certs_url();
        debug!(%url, "fetching realm signing keys");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(IdentityError::Protocol(format!(
                "certs endpoint returned {}",
                response.status()
            )));
        }
        response
            .json::<JwkSet>()
            .await
            .map_err(|e| IdentityError::Protocol(format!("invalid JWKS document: {e}")))
    }

    /// Resolve the verification key for `kid`, refreshing the cached set once
    /// when the key is unknown (the realm may have rotated keys).
    async fn jwks_key(&self, kid: &str) -> Result<(DecodingKey, Algorithm), IdentityError> {
        if let Some(set) = self.jwks.read().await.as_ref() {
            if let Some(found) = key_from_set(set, kid)? {
                return Ok(found);
            }
        }

        let fresh = self.fetch_jwks().await?;
        let found = key_from_set(&fresh, kid)?;
        *self.jwks.write().await = Some(fresh);

        found.ok_or_else(|| IdentityError::Decode(format!("no signing key with kid {kid}")))
    }
}

fn key_from_set(set: &JwkSet, kid: &str) -> Result<Option<(DecodingKey, Algorithm)>, IdentityError> {
    let Some(jwk) = set.find(kid) else {
        return Ok(None);
    };
    let key = DecodingKey::from_jwk(jwk)
        .map_err(|e| IdentityError::Decode(format!("unusable JWK {kid}: {e}")))?;
    let algorithm = jwk
        .common
        .key_algorithm
        .and_then(signing_algorithm)
        .unwrap_or(Algorithm::RS256);
    Ok(Some((key, algorithm)))
}

fn signing_algorithm(alg: KeyAlgorithm) -> Option<Algorithm> {
    match alg {
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
        _ => None,
    }
}

fn is_asymmetric(algorithm: Algorithm) -> bool {
    !matches!(
        algorithm,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
    )
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> IdentityError {
    match err.kind() {
        jsonwebtoken::errors::ErrorKind::Json(inner) => IdentityError::Claims(inner.to_string()),
        _ => IdentityError::Decode(err.to_string()),
    }
}

#[async_trait]
impl IdentityProvider for KeycloakProvider {
    async fn introspect(&self, token: &str) -> Result<Introspection, IdentityError> {
        let form = [
            ("token", token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(self.config.introspection_url())
            .form(&form)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IdentityError::Protocol(format!(
                "introspection returned {}",
                response.status()
            )));
        }

        let body: IntrospectionResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Protocol(format!("invalid introspection body: {e}")))?;

        match body.active {
            Some(active) => Ok(Introspection { active }),
            None => Err(IdentityError::Protocol(
                "introspection body has no active flag".to_string(),
            )),
        }
    }

    async fn decode(&self, token: &str) -> Result<AccessTokenClaims, IdentityError> {
        let (key, algorithm) = match &self.config.signing {
            SigningKeySource::Static { key, algorithm } => (key.clone(), *algorithm),
            SigningKeySource::Jwks => {
                let header = decode_header(token).map_err(map_decode_error)?;
                if !is_asymmetric(header.alg) {
                    warn!(alg = ?header.alg, "rejecting token signed with a symmetric algorithm");
                    return Err(IdentityError::Decode(format!(
                        "algorithm {:?} not accepted",
                        header.alg
                    )));
                }
                let kid = header
                    .kid
                    .ok_or_else(|| IdentityError::Decode("token header has no kid".to_string()))?;
                self.jwks_key(&kid).await?
            }
        };

        decode::<AccessTokenClaims>(token, &key, &self.validation(algorithm))
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }
}
