use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{test, web};
use serde_json::Value;
use tenant_access::auth::api_key::{ApplicationCaller, StaticApiKeyVerifier};
use tenant_access::config::app_config::ConfiguredApiKey;
use tenant_access::pipeline::AccessPipeline;
use tenant_access::AppError;

use crate::common::assert_rejection;
use crate::support::tenants::tenants_with;
use crate::support::{create_test_app, test_state, FakeIdentity};

const KEY: &str = "ak_live_5f1d3c0e9b8a7d6c";

async fn whoami(app: ApplicationCaller) -> Result<web::Json<ApplicationCaller>, AppError> {
    Ok(web::Json(app))
}

async fn integration_app() -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = actix_web::dev::ServiceResponse,
    Error = actix_web::Error,
> {
    let verifier = StaticApiKeyVerifier::new(vec![ConfiguredApiKey {
        application_id: "billing-sync".to_string(),
        digest: *blake3::hash(KEY.as_bytes()).as_bytes(),
    }]);
    let state = test_state(Arc::new(FakeIdentity::new()), tenants_with(vec![], vec![]).await)
        .with_api_keys(Arc::new(verifier))
        .build()
        .unwrap();

    create_test_app(state)
        .with_routes(|cfg, state| {
            cfg.service(
                web::scope("/v1/sync")
                    .wrap(AccessPipeline::new(state).authenticate_api_key().build())
                    .route("", web::get().to(whoami)),
            );
        })
        .build()
        .await
}

#[actix_web::test]
async fn test_api_key_header_publishes_the_application() {
    let app = integration_app().await;

    let req = test::TestRequest::get()
        .uri("/v1/sync")
        .insert_header(("X-API-Key", KEY))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["application_id"], "billing-sync");
}

#[actix_web::test]
async fn test_api_key_accepted_as_bearer_credential() {
    let app = integration_app().await;

    let req = test::TestRequest::get()
        .uri("/v1/sync")
        .insert_header(("Authorization", format!("Bearer {KEY}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_unknown_and_missing_api_keys_are_rejected() {
    let app = integration_app().await;

    let req = test::TestRequest::get()
        .uri("/v1/sync")
        .insert_header(("X-API-Key", "ak_live_not_registered"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_rejection(resp, StatusCode::UNAUTHORIZED, "INVALID_API_KEY").await;

    let req = test::TestRequest::get().uri("/v1/sync").to_request();
    let resp = test::call_service(&app, req).await;
    assert_rejection(resp, StatusCode::UNAUTHORIZED, "UNAUTHENTICATED").await;
}
