use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::Value;

use crate::common::trace_id_of;
use crate::support::tenants::tenants_with;
use crate::support::{create_test_app, test_state, FakeIdentity};

#[actix_web::test]
async fn test_health_needs_no_credentials() {
    let identity = Arc::new(FakeIdentity::new());
    let state = test_state(identity.clone(), tenants_with(vec![], vec![]).await)
        .build()
        .unwrap();
    let app = create_test_app(state).with_prod_routes().build().await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    trace_id_of(&resp);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert!(body["app_version"].is_string());
    assert_eq!(identity.introspections(), 0);
}

#[actix_web::test]
async fn test_inbound_trace_id_is_echoed() {
    let state = test_state(Arc::new(FakeIdentity::new()), tenants_with(vec![], vec![]).await)
        .build()
        .unwrap();
    let app = create_test_app(state).with_prod_routes().build().await;

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header(("X-Trace-Id", "edge-4f2a9c"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(trace_id_of(&resp), "edge-4f2a9c");
}
