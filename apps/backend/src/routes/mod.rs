use actix_web::web;

use crate::cache::policy::CachePolicy;
use crate::pipeline::AccessPipeline;
use crate::state::app_state::AppState;

pub mod health;
pub mod integrations;
pub mod me;

/// Roles admitted to tenant-facing routes.
pub const TENANT_ROLES: &[&str] = &["User", "OrgAdmin"];

/// Register every route with its access pipeline.
pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    let platform_admin = state.subscription_gate.policy().platform_admin_role.clone();
    let tenant_roles = TENANT_ROLES
        .iter()
        .map(|role| role.to_string())
        .chain(std::iter::once(platform_admin));

    cfg.service(web::scope("/health").configure(health::configure_routes));

    // More specific scopes first: actix matches scopes in registration order.
    cfg.service(
        web::scope("/v1/me/cache")
            .wrap(AccessPipeline::new(state).authenticate().build())
            .configure(me::configure_cache_routes),
    );

    cfg.service(
        web::scope(me::ME_PATH)
            .wrap(
                AccessPipeline::new(state)
                    .authenticate()
                    .require_any_role(tenant_roles)
                    .check_subscription()
                    .cache(CachePolicy::short().vary_by_user())
                    .build(),
            )
            .configure(me::configure_routes),
    );

    cfg.service(
        web::scope("/v1/integrations")
            .wrap(AccessPipeline::new(state).authenticate_api_key().build())
            .configure(integrations::configure_routes),
    );
}
