//! Identity-provider connection settings.

use std::fmt;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey};

use crate::error::AppError;

/// Where token signature material comes from.
#[derive(Clone)]
pub enum SigningKeySource {
    /// A key configured at startup (RSA PEM in production).
    Static {
        key: DecodingKey,
        algorithm: Algorithm,
    },
    /// The realm's JWKS document, fetched on first use.
    Jwks,
}

impl SigningKeySource {
    pub fn rsa_pem(pem: &str) -> Result<Self, AppError> {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AppError::config(format!("TOKEN_PUBLIC_KEY_PEM is not a valid RSA key: {e}")))?;
        Ok(Self::Static {
            key,
            algorithm: Algorithm::RS256,
        })
    }

    /// Shared-secret verification. Only used against local token issuers.
    pub fn hmac(secret: &[u8]) -> Self {
        Self::Static {
            key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
        }
    }
}

impl fmt::Debug for SigningKeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningKeySource::Static { algorithm, .. } => f
                .debug_struct("Static")
                .field("algorithm", algorithm)
                .finish_non_exhaustive(),
            SigningKeySource::Jwks => f.write_str("Jwks"),
        }
    }
}

#[derive(Clone)]
pub struct IdentityConfig {
    pub host: String,
    pub realm: String,
    pub client_id: String,
    pub client_secret: String,
    pub audience: Option<String>,
    pub signing: SigningKeySource,
    pub request_timeout: Duration,
}

impl IdentityConfig {
    fn realm_url(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect",
            self.host.trim_end_matches('/'),
            self.realm
        )
    }

    pub fn introspection_url(&self) -> String {
        format!("{}/token/introspect", self.realm_url())
    }

    pub fn certs_url(&self) -> String {
        format!("{}/certs", self.realm_url())
    }
}

// Keeps the client secret out of logs.
impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("host", &self.host)
            .field("realm", &self.realm)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("audience", &self.audience)
            .field("signing", &self.signing)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
