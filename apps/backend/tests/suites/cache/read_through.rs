use std::sync::Arc;

use actix_http::Request;
use actix_web::http::StatusCode;
use actix_web::{test, web, HttpResponse};
use tenant_access::cache::policy::CachePolicy;
use tenant_access::cache::store::CacheStore;
use tenant_access::cache::MAX_KEY_LEN;
use tenant_access::pipeline::AccessPipeline;

use crate::support::identity::claims;
use crate::support::stores::RecordingStore;
use crate::support::tenants::tenants_with;
use crate::support::{create_test_app, test_state, FakeIdentity, SpyHandler};

/// Authenticated `/v1/presets` scope cached with `policy`.
pub async fn cached_app(
    store: Arc<dyn CacheStore>,
    policy: fn() -> CachePolicy,
    spy: &SpyHandler,
) -> impl actix_web::dev::Service<Request, Response = actix_web::dev::ServiceResponse, Error = actix_web::Error>
{
    let identity = Arc::new(FakeIdentity::new());
    identity.issue("alice-token", claims(&["User"], None));
    identity.issue("bob-token", claims(&["User"], None));
    let state = test_state(identity, tenants_with(vec![], vec![]).await)
        .with_cache_store(store)
        .build()
        .unwrap();

    let spy = spy.clone();
    create_test_app(state)
        .with_routes(move |cfg, state| {
            cfg.service(
                web::scope("/v1/presets")
                    .wrap(AccessPipeline::new(state).authenticate().cache(policy()).build())
                    .route("", spy.route()),
            );
        })
        .build()
        .await
}

pub fn request(method: &str, uri: &str, token: Option<&str>) -> Request {
    let req = match method {
        "POST" => test::TestRequest::post(),
        _ => test::TestRequest::get(),
    };
    let req = req.uri(uri);
    let req = match token {
        Some(token) => req.insert_header(("Authorization", format!("Bearer {token}"))),
        None => req,
    };
    req.to_request()
}

fn x_cache(resp: &actix_web::dev::ServiceResponse) -> Option<String> {
    resp.headers()
        .get("x-cache")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn per_user() -> CachePolicy {
    CachePolicy::short().vary_by_user()
}

#[actix_web::test]
async fn test_second_request_is_served_from_cache() {
    let spy = SpyHandler::new();
    let app = cached_app(Arc::new(RecordingStore::default()), per_user, &spy).await;

    let first = test::call_service(&app, request("GET", "/v1/presets", Some("alice-token"))).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(x_cache(&first).as_deref(), Some("MISS"));
    let first_type = first.headers().get("content-type").cloned();
    let first_body = test::read_body(first).await;

    let second = test::call_service(&app, request("GET", "/v1/presets", Some("alice-token"))).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(x_cache(&second).as_deref(), Some("HIT"));
    assert_eq!(second.headers().get("content-type").cloned(), first_type);
    let second_body = test::read_body(second).await;

    assert_eq!(first_body, second_body);
    assert_eq!(spy.calls(), 1);
}

#[actix_web::test]
async fn test_entries_are_separated_per_user() {
    let spy = SpyHandler::new();
    let app = cached_app(Arc::new(RecordingStore::default()), per_user, &spy).await;

    let alice = test::call_service(&app, request("GET", "/v1/presets", Some("alice-token"))).await;
    assert_eq!(x_cache(&alice).as_deref(), Some("MISS"));
    let bob = test::call_service(&app, request("GET", "/v1/presets", Some("bob-token"))).await;
    assert_eq!(x_cache(&bob).as_deref(), Some("MISS"));

    assert_eq!(spy.calls(), 2);
}

#[actix_web::test]
async fn test_non_get_requests_never_touch_the_store() {
    let store = Arc::new(RecordingStore::default());
    let spy = SpyHandler::new();
    let app = cached_app(store.clone(), per_user, &spy).await;

    for _ in 0..2 {
        let resp = test::call_service(&app, request("POST", "/v1/presets", Some("alice-token"))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(x_cache(&resp).is_none());
    }

    assert_eq!(store.operations(), 0);
    assert_eq!(spy.calls(), 2);
}

#[actix_web::test]
async fn test_rejected_requests_never_touch_the_store() {
    let store = Arc::new(RecordingStore::default());
    let spy = SpyHandler::new();
    let app = cached_app(store.clone(), per_user, &spy).await;

    let resp = test::call_service(&app, request("GET", "/v1/presets", None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(store.operations(), 0);
    assert_eq!(spy.calls(), 0);
}

#[actix_web::test]
async fn test_false_condition_bypasses_the_cache() {
    let store = Arc::new(RecordingStore::default());
    let spy = SpyHandler::new();
    let app = cached_app(
        store.clone(),
        || CachePolicy::short().when(|req| req.query_string().is_empty()),
        &spy,
    )
    .await;

    let resp = test::call_service(&app, request("GET", "/v1/presets?fresh=1", Some("alice-token"))).await;
    assert!(x_cache(&resp).is_none());
    assert_eq!(store.operations(), 0);

    let resp = test::call_service(&app, request("GET", "/v1/presets", Some("alice-token"))).await;
    assert_eq!(x_cache(&resp).as_deref(), Some("MISS"));
    assert!(store.operations() > 0);
}

#[actix_web::test]
async fn test_query_variation_and_long_key_collapse() {
    let store = Arc::new(RecordingStore::default());
    let spy = SpyHandler::new();
    let app = cached_app(store.clone(), || CachePolicy::short().vary_by_query(), &spy).await;

    let long_query = format!("filter={}", "x".repeat(400));
    let uris = [
        "/v1/presets?page=1".to_string(),
        "/v1/presets?page=2".to_string(),
        format!("/v1/presets?{long_query}"),
    ];
    for uri in uris {
        let resp = test::call_service(&app, request("GET", &uri, Some("alice-token"))).await;
        assert_eq!(x_cache(&resp).as_deref(), Some("MISS"), "{uri}");
    }

    let uri = format!("/v1/presets?{long_query}");
    let resp = test::call_service(&app, request("GET", &uri, Some("alice-token"))).await;
    assert_eq!(x_cache(&resp).as_deref(), Some("HIT"));

    let keys = store.keys();
    assert!(keys.iter().all(|k| k.len() <= MAX_KEY_LEN && k.starts_with("cache:")));
    assert!(keys.iter().any(|k| k == "cache:/v1/presets:query:page=1"));
    assert_eq!(spy.calls(), 3);
}

#[actix_web::test]
async fn test_replay_restores_custom_headers_but_not_cookies() {
    let identity = Arc::new(FakeIdentity::new());
    identity.issue("alice-token", claims(&["User"], None));
    let state = test_state(identity, tenants_with(vec![], vec![]).await)
        .build()
        .unwrap();
    let app = create_test_app(state)
        .with_routes(|cfg, state| {
            cfg.service(
                web::scope("/v1/reports")
                    .wrap(AccessPipeline::new(state).authenticate().cache(per_user()).build())
                    .route(
                        "",
                        web::get().to(|| async {
                            HttpResponse::Ok()
                                .insert_header(("x-report-version", "7"))
                                .insert_header(("set-cookie", "session=abc"))
                                .body("quarterly")
                        }),
                    ),
            );
        })
        .build()
        .await;

    let first = test::call_service(&app, request("GET", "/v1/reports", Some("alice-token"))).await;
    assert_eq!(x_cache(&first).as_deref(), Some("MISS"));
    let first_trace = first.headers().get("x-trace-id").cloned();

    let hit = test::call_service(&app, request("GET", "/v1/reports", Some("alice-token"))).await;
    assert_eq!(x_cache(&hit).as_deref(), Some("HIT"));
    assert_eq!(hit.headers().get("x-report-version").unwrap(), "7");
    assert!(hit.headers().get("set-cookie").is_none());
    // Each request keeps its own trace id.
    assert_ne!(hit.headers().get("x-trace-id").cloned(), first_trace);
    assert_eq!(test::read_body(hit).await, web::Bytes::from_static(b"quarterly"));
}
