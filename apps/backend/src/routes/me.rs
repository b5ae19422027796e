use actix_web::{web, HttpResponse};
use serde::Serialize;
use uuid::Uuid;

use crate::cache::key::{derive_key, KeyParts};
use crate::error::AppError;
use crate::extractors::CurrentCaller;
use crate::state::app_state::AppState;

pub const ME_PATH: &str = "/v1/me";

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub caller_id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Option<String>,
    pub organization_id: Option<String>,
}

/// Echo the caller context the access pipeline published.
async fn me(caller: CurrentCaller) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(MeResponse {
        caller_id: caller.caller_id(),
        username: caller.username().to_string(),
        email: caller.email().to_string(),
        role: caller.granted_role().map(str::to_string),
        organization_id: caller.organization_id().map(str::to_string),
    }))
}

/// Drop the caller's cached `/v1/me` response.
async fn forget_me(caller: CurrentCaller, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let key = derive_key(&KeyParts {
        prefix: state.response_cache.default_prefix().to_string(),
        path: ME_PATH.to_string(),
        user_id: Some(caller.caller_id().to_string()),
        ..Default::default()
    });
    state.cache_invalidator.invalidate(&key).await;
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(me));
}

pub fn configure_cache_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::delete().to(forget_me));
}
