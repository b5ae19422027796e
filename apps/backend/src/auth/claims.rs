//! Identity claims published by the authentication stage.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;

/// Unordered set of role names; duplicates collapse on construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    /// Exact, case-sensitive membership check.
    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    pub fn contains_any<'a, I>(&self, candidates: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.first_match(candidates).is_some()
    }

    /// Returns the first of `candidates` held by this set.
    pub fn first_match<'a, I>(&self, candidates: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        candidates.into_iter().find(|role| self.contains(role))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for RoleSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Authenticated caller identity, attached once per request.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityClaims {
    pub subject: Uuid,
    pub username: String,
    pub email: String,
    pub roles: RoleSet,
    pub organization_id: Option<String>,
    pub expires_at: OffsetDateTime,
}

/// Typed decode target for access tokens issued by the identity provider.
///
/// Any deviation from this shape fails the decode step as a whole. Keycloak
/// omits `email` for users without one and for service accounts, so the
/// profile fields default to empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: Uuid,
    #[serde(default)]
    pub preferred_username: String,
    #[serde(default)]
    pub email: String,
    pub exp: i64,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub resource_access: HashMap<String, ResourceAccess>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceAccess {
    pub roles: Vec<String>,
}

impl AccessTokenClaims {
    /// Convert into `IdentityClaims`, taking roles from the block of `client_id`.
    pub fn into_identity(self, client_id: &str) -> Result<IdentityClaims, AppError> {
        let access = self.resource_access.get(client_id).ok_or_else(|| {
            AppError::malformed_claims(format!("resource_access has no entry for client {client_id}"))
        })?;
        let roles: RoleSet = access.roles.iter().cloned().collect();

        let expires_at = OffsetDateTime::from_unix_timestamp(self.exp)
            .map_err(|e| AppError::malformed_claims(format!("exp out of range: {e}")))?;

        let organization_id = self
            .organization_id
            .map(|org| org.trim().to_string())
            .filter(|org| !org.is_empty());

        Ok(IdentityClaims {
            subject: self.sub,
            username: self.preferred_username,
            email: self.email,
            roles,
            organization_id,
            expires_at,
        })
    }
}
