//! Per-request state shared by the access stages.

use actix_web::dev::ServiceRequest;
use actix_web::http::{header::HeaderMap, Method};

use crate::auth::api_key::ApplicationCaller;
use crate::auth::claims::IdentityClaims;

/// Snapshot of the inbound request plus whatever the stages established.
///
/// Claims are write-once: the first successful authentication wins for the
/// lifetime of the request.
#[derive(Debug, Clone)]
pub struct AccessContext {
    method: Method,
    path: String,
    query: String,
    headers: HeaderMap,
    peer_ip: Option<String>,
    claims: Option<IdentityClaims>,
    granted_role: Option<String>,
    application: Option<ApplicationCaller>,
}

impl AccessContext {
    pub fn new(method: Method, path: impl Into<String>, query: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            method,
            path: path.into(),
            query: query.into(),
            headers,
            peer_ip: None,
            claims: None,
            granted_role: None,
            application: None,
        }
    }

    pub fn from_request(req: &ServiceRequest) -> Self {
        let mut ctx = Self::new(
            req.method().clone(),
            req.path(),
            req.query_string(),
            req.headers().clone(),
        );
        ctx.peer_ip = req.connection_info().realip_remote_addr().map(str::to_string);
        ctx
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string, empty when the request had none.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn peer_ip(&self) -> Option<&str> {
        self.peer_ip.as_deref()
    }

    pub fn claims(&self) -> Option<&IdentityClaims> {
        self.claims.as_ref()
    }

    pub fn organization_id(&self) -> Option<&str> {
        self.claims.as_ref()?.organization_id.as_deref()
    }

    pub fn granted_role(&self) -> Option<&str> {
        self.granted_role.as_deref()
    }

    pub fn application(&self) -> Option<&ApplicationCaller> {
        self.application.as_ref()
    }

    /// Attach the caller's claims. Returns `false` and keeps the existing
    /// claims if some were already attached.
    pub fn attach_claims(&mut self, claims: IdentityClaims) -> bool {
        if self.claims.is_some() {
            return false;
        }
        self.claims = Some(claims);
        true
    }

    pub fn grant_role(&mut self, role: impl Into<String>) {
        self.granted_role = Some(role.into());
    }

    pub fn attach_application(&mut self, application: ApplicationCaller) {
        self.application = Some(application);
    }

    pub(crate) fn into_published(self) -> (Option<CallerContext>, Option<ApplicationCaller>) {
        let caller = self.claims.map(|claims| CallerContext {
            claims,
            granted_role: self.granted_role,
        });
        (caller, self.application)
    }
}

/// What the business layer sees of an admitted, token-authenticated caller.
#[derive(Debug, Clone, PartialEq)]
pub struct CallerContext {
    pub claims: IdentityClaims,
    pub granted_role: Option<String>,
}
