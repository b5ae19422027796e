use std::sync::Arc;

use actix_http::Request;
use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::Value;
use tenant_access::subscription::PaymentStatus;
use uuid::Uuid;

use crate::common::assert_rejection;
use crate::support::identity::claims;
use crate::support::tenants::{payment, record, tenants_with};
use crate::support::{create_test_app, test_state, FakeIdentity};

fn call(method: &str, path: &str, token: &str) -> Request {
    let req = match method {
        "DELETE" => test::TestRequest::delete(),
        _ => test::TestRequest::get(),
    };
    req.uri(path)
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request()
}

fn x_cache(resp: &actix_web::dev::ServiceResponse) -> Option<&str> {
    resp.headers().get("x-cache").and_then(|v| v.to_str().ok())
}

#[actix_web::test]
async fn test_me_returns_the_caller_and_caches_per_user() {
    let org = Uuid::new_v4();
    let issued = claims(&["User"], Some(&org.to_string()));
    let subject = issued.sub;
    let identity = Arc::new(FakeIdentity::new());
    identity.issue("user-token", issued);
    let tenants = tenants_with(
        vec![record(&org.to_string(), "active")],
        vec![payment(org, PaymentStatus::Confirmed)],
    )
    .await;
    let state = test_state(identity, tenants).build().unwrap();
    let app = create_test_app(state).with_prod_routes().build().await;

    let first = test::call_service(&app, call("GET", "/v1/me", "user-token")).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(x_cache(&first), Some("MISS"));
    let body: Value = test::read_body_json(first).await;
    assert_eq!(body["caller_id"], subject.to_string());
    assert_eq!(body["role"], "User");
    assert_eq!(body["organization_id"], org.to_string());

    let second = test::call_service(&app, call("GET", "/v1/me", "user-token")).await;
    assert_eq!(x_cache(&second), Some("HIT"));

    let forget = test::call_service(&app, call("DELETE", "/v1/me/cache", "user-token")).await;
    assert_eq!(forget.status(), StatusCode::NO_CONTENT);

    let third = test::call_service(&app, call("GET", "/v1/me", "user-token")).await;
    assert_eq!(x_cache(&third), Some("MISS"));
}

#[actix_web::test]
async fn test_platform_admin_reaches_me_without_an_organization() {
    let identity = Arc::new(FakeIdentity::new());
    identity.issue("admin-token", claims(&["PlatformAdmin"], None));
    let state = test_state(identity, tenants_with(vec![], vec![]).await)
        .build()
        .unwrap();
    let app = create_test_app(state).with_prod_routes().build().await;

    let resp = test::call_service(&app, call("GET", "/v1/me", "admin-token")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["role"], "PlatformAdmin");
    assert!(body["organization_id"].is_null());
}

#[actix_web::test]
async fn test_me_rejects_callers_without_a_tenant_role() {
    let org = Uuid::new_v4();
    let identity = Arc::new(FakeIdentity::new());
    identity.issue("auditor-token", claims(&["Auditor"], Some(&org.to_string())));
    let tenants = tenants_with(vec![record(&org.to_string(), "active")], vec![]).await;
    let state = test_state(identity, tenants).build().unwrap();
    let app = create_test_app(state).with_prod_routes().build().await;

    let resp = test::call_service(&app, call("GET", "/v1/me", "auditor-token")).await;
    assert_rejection(resp, StatusCode::FORBIDDEN, "FORBIDDEN").await;
}
