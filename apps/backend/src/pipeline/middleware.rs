//! Route-level access control middleware.
//!
//! ```ignore
//! web::scope("/v1/budgets").wrap(
//!     AccessPipeline::new(&state)
//!         .authenticate()
//!         .require_role("User")
//!         .check_subscription()
//!         .cache(CachePolicy::short())
//!         .build(),
//! )
//! ```

use std::rc::Rc;
use std::sync::Arc;

use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage};
use futures_util::future::{ready, LocalBoxFuture, Ready};

use crate::auth::api_key::ApiKeyAuthentication;
use crate::auth::optional::OptionalAuthentication;
use crate::auth::role_authorizer::RoleAuthorizer;
use crate::cache::policy::CachePolicy;
use crate::cache::response_cache::ResponseCache;
use crate::pipeline::context::AccessContext;
use crate::pipeline::stage::{run_stages, AccessStage};
use crate::state::app_state::AppState;

/// Builder for a route's access pipeline.
///
/// Builder calls may come in any order; the built pipeline always runs
/// authentication, then role authorization, then the subscription gate,
/// with the response cache wrapped around the handler last.
pub struct AccessPipeline {
    state: AppState,
    authentication: Option<Arc<dyn AccessStage>>,
    roles: Vec<String>,
    subscription: bool,
    cache: Option<CachePolicy>,
}

impl AccessPipeline {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
            authentication: None,
            roles: Vec::new(),
            subscription: false,
            cache: None,
        }
    }

    /// Require a valid bearer token.
    pub fn authenticate(mut self) -> Self {
        self.authentication = Some(self.state.token_validator.clone());
        self
    }

    /// Attach claims when a valid bearer token is present, admit anyway.
    pub fn authenticate_optional(mut self) -> Self {
        let stage = OptionalAuthentication::new(self.state.token_validator.clone());
        self.authentication = Some(Arc::new(stage));
        self
    }

    /// Require a registered API key instead of a user token.
    pub fn authenticate_api_key(mut self) -> Self {
        let stage = ApiKeyAuthentication::new(self.state.api_keys.clone());
        self.authentication = Some(Arc::new(stage));
        self
    }

    pub fn require_role(self, role: impl Into<String>) -> Self {
        self.require_any_role([role.into()])
    }

    /// Admit callers holding any one of `roles`.
    pub fn require_any_role<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn check_subscription(mut self) -> Self {
        self.subscription = true;
        self
    }

    pub fn cache(mut self, policy: CachePolicy) -> Self {
        self.cache = Some(policy);
        self
    }

    pub fn build(self) -> AccessControl {
        let mut stages: Vec<Arc<dyn AccessStage>> = Vec::new();
        if let Some(authentication) = self.authentication {
            stages.push(authentication);
        }
        if !self.roles.is_empty() {
            stages.push(Arc::new(RoleAuthorizer::new(self.roles)));
        }
        if self.subscription {
            stages.push(self.state.subscription_gate.clone());
        }

        AccessControl {
            stages: stages.into(),
            cache: self
                .cache
                .map(|policy| (self.state.response_cache.clone(), Rc::new(policy))),
        }
    }
}

/// Built pipeline; wrap a scope or resource with it.
pub struct AccessControl {
    stages: Arc<[Arc<dyn AccessStage>]>,
    cache: Option<(Arc<ResponseCache>, Rc<CachePolicy>)>,
}

impl AccessControl {
    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn caches(&self) -> bool {
        self.cache.is_some()
    }
}

impl<S, B> Transform<S, ServiceRequest> for AccessControl
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = AccessControlMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AccessControlMiddleware {
            service: Rc::new(service),
            stages: self.stages.clone(),
            cache: self.cache.clone(),
        }))
    }
}

pub struct AccessControlMiddleware<S> {
    service: Rc<S>,
    stages: Arc<[Arc<dyn AccessStage>]>,
    cache: Option<(Arc<ResponseCache>, Rc<CachePolicy>)>,
}

impl<S, B> Service<ServiceRequest> for AccessControlMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let stages = Arc::clone(&self.stages);
        let cache = self.cache.clone();

        Box::pin(async move {
            let mut ctx = AccessContext::from_request(&req);
            if let Err(err) = run_stages(&stages, &mut ctx).await {
                // The handler is never invoked for a rejected request.
                return Ok(req.error_response(err));
            }

            // Publish what the stages established before the handler runs.
            let (caller, application) = ctx.into_published();
            if let Some(caller) = caller {
                req.extensions_mut().insert(caller);
            }
            if let Some(application) = application {
                req.extensions_mut().insert(application);
            }

            match cache {
                Some((response_cache, policy)) => response_cache.handle(&policy, req, &*service).await,
                None => service
                    .call(req)
                    .await
                    .map(ServiceResponse::map_into_boxed_body),
            }
        })
    }
}
