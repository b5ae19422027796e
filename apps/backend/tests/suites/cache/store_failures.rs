use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::{test, web};
use serde_json::Value;
use tenant_access::cache::policy::CachePolicy;
use tenant_access::config::CacheSettings;
use tenant_access::pipeline::AccessPipeline;

use super::read_through::{cached_app, request};
use crate::support::identity::claims;
use crate::support::stores::{FailingStore, StalledStore};
use crate::support::tenants::tenants_with;
use crate::support::{create_test_app, test_state, FakeIdentity, SpyHandler};

fn per_user() -> CachePolicy {
    CachePolicy::short().vary_by_user()
}

#[actix_web::test]
async fn test_failing_store_leaves_responses_unchanged() {
    let store = Arc::new(FailingStore::default());
    let spy = SpyHandler::new();
    let app = cached_app(store.clone(), per_user, &spy).await;

    for expected in 1..=2 {
        let resp = test::call_service(&app, request("GET", "/v1/presets", Some("alice-token"))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_ne!(resp.headers().get("x-cache").and_then(|v| v.to_str().ok()), Some("HIT"));

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["n"], expected);
    }

    assert_eq!(spy.calls(), 2);
    assert!(store.calls.load(Ordering::SeqCst) >= 2);
}

#[actix_web::test]
async fn test_store_failures_are_logged_as_degraded() {
    let store = Arc::new(FailingStore::default());
    let spy = SpyHandler::new();
    let app = cached_app(store, per_user, &spy).await;

    let (logs, _guard) = backend_test_support::capture();
    let resp = test::call_service(&app, request("GET", "/v1/presets", Some("alice-token"))).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let contents = logs.contents();
    assert!(contents.contains("CACHE_DEGRADED"));
    assert!(!contents.contains("alice-token"));
}

#[actix_web::test]
async fn test_store_that_never_answers_is_bounded_by_the_cache_timeout() {
    let store = Arc::new(StalledStore::default());
    let identity = Arc::new(FakeIdentity::new());
    identity.issue("alice-token", claims(&["User"], None));
    let state = test_state(identity, tenants_with(vec![], vec![]).await)
        .with_cache_store(store.clone())
        .with_cache_settings(CacheSettings {
            timeout: Duration::from_millis(50),
            ..CacheSettings::default()
        })
        .build()
        .unwrap();
    let spy = SpyHandler::new();
    let handler = spy.clone();
    let app = create_test_app(state)
        .with_routes(move |cfg, state| {
            cfg.service(
                web::scope("/v1/presets")
                    .wrap(AccessPipeline::new(state).authenticate().cache(per_user()).build())
                    .route("", handler.route()),
            );
        })
        .build()
        .await;

    let resp = test::call_service(&app, request("GET", "/v1/presets", Some("alice-token"))).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("x-cache").and_then(|v| v.to_str().ok()), Some("MISS"));
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["n"], 1);
    assert_eq!(spy.calls(), 1);
    // One timed-out read, one timed-out write.
    assert_eq!(store.calls.load(Ordering::SeqCst), 2);
}
