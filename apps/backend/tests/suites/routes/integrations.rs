use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::Value;
use tenant_access::auth::api_key::StaticApiKeyVerifier;
use tenant_access::config::app_config::ConfiguredApiKey;

use crate::common::assert_rejection;
use crate::support::tenants::tenants_with;
use crate::support::{create_test_app, test_state, FakeIdentity};

#[actix_web::test]
async fn test_whoami_identifies_the_application() {
    let key = "ak_test_8c1f0b2e4d6a";
    let verifier = StaticApiKeyVerifier::new(vec![ConfiguredApiKey {
        application_id: "erp-connector".to_string(),
        digest: *blake3::hash(key.as_bytes()).as_bytes(),
    }]);
    let state = test_state(Arc::new(FakeIdentity::new()), tenants_with(vec![], vec![]).await)
        .with_api_keys(Arc::new(verifier))
        .build()
        .unwrap();
    let app = create_test_app(state).with_prod_routes().build().await;

    let req = test::TestRequest::get()
        .uri("/v1/integrations/whoami")
        .insert_header(("X-API-Key", key))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["application_id"], "erp-connector");

    let req = test::TestRequest::get()
        .uri("/v1/integrations/whoami")
        .insert_header(("X-API-Key", "ak_test_revoked"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_rejection(resp, StatusCode::UNAUTHORIZED, "INVALID_API_KEY").await;
}
