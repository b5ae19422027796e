use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{ready, Ready};
use uuid::Uuid;

use crate::auth::api_key::ApplicationCaller;
use crate::auth::claims::IdentityClaims;
use crate::error::AppError;
use crate::pipeline::context::CallerContext;

/// The authenticated caller published by the access pipeline.
///
/// Extraction fails with 401 when the route's pipeline did not
/// authenticate the request; use `Option<CurrentCaller>` on routes with
/// optional authentication.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentCaller(CallerContext);

impl CurrentCaller {
    pub fn claims(&self) -> &IdentityClaims {
        &self.0.claims
    }

    pub fn caller_id(&self) -> Uuid {
        self.0.claims.subject
    }

    pub fn username(&self) -> &str {
        &self.0.claims.username
    }

    pub fn email(&self) -> &str {
        &self.0.claims.email
    }

    /// The required role that admitted this caller, when the route required one.
    pub fn granted_role(&self) -> Option<&str> {
        self.0.granted_role.as_deref()
    }

    pub fn organization_id(&self) -> Option<&str> {
        self.0.claims.organization_id.as_deref()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.0.claims.roles.contains(role)
    }

    pub fn is_platform_admin(&self, platform_admin_role: &str) -> bool {
        self.has_role(platform_admin_role)
    }
}

impl FromRequest for CurrentCaller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let caller = req
            .extensions()
            .get::<CallerContext>()
            .cloned()
            .map(CurrentCaller)
            .ok_or_else(AppError::missing_credentials);
        ready(caller)
    }
}

/// Application identity for routes authenticated with an API key.
impl FromRequest for ApplicationCaller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let application = req
            .extensions()
            .get::<ApplicationCaller>()
            .cloned()
            .ok_or_else(AppError::missing_credentials);
        ready(application)
    }
}
