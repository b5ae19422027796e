use std::sync::Arc;
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::test;
use uuid::Uuid;

use super::gating::{gated, get, TOKEN};
use crate::common::assert_rejection;
use crate::support::identity::claims;
use crate::support::tenants::{record, tenants_with, StalledDirectory, StalledPayments};
use crate::support::{test_state, FakeIdentity, SpyHandler};

const SLOW_BACKEND_TIMEOUT: Duration = Duration::from_millis(50);

fn identity_for(org: Uuid) -> Arc<FakeIdentity> {
    let identity = Arc::new(FakeIdentity::new());
    identity.issue(TOKEN, claims(&["User"], Some(&org.to_string())));
    identity
}

#[actix_web::test]
async fn test_company_lookup_that_never_answers_is_a_dependency_error() {
    let org = Uuid::new_v4();
    let payments = tenants_with(vec![], vec![]).await;
    let state = test_state(identity_for(org), payments.clone())
        .with_tenants(Arc::new(StalledDirectory), payments)
        .with_backend_timeout(SLOW_BACKEND_TIMEOUT)
        .build()
        .unwrap();
    let spy = SpyHandler::new();
    let app = gated(state, &spy).await;

    let resp = test::call_service(&app, get("/v1/budgets", TOKEN)).await;

    assert_rejection(resp, StatusCode::INTERNAL_SERVER_ERROR, "DEPENDENCY_ERROR").await;
    assert_eq!(spy.calls(), 0);
}

#[actix_web::test]
async fn test_payment_lookup_that_never_answers_is_a_dependency_error() {
    let org = Uuid::new_v4();
    let directory = tenants_with(vec![record(&org.to_string(), "active")], vec![]).await;
    let state = test_state(identity_for(org), directory.clone())
        .with_tenants(directory, Arc::new(StalledPayments))
        .with_backend_timeout(SLOW_BACKEND_TIMEOUT)
        .build()
        .unwrap();
    let spy = SpyHandler::new();
    let app = gated(state, &spy).await;

    let resp = test::call_service(&app, get("/v1/budgets", TOKEN)).await;

    assert_rejection(resp, StatusCode::INTERNAL_SERVER_ERROR, "DEPENDENCY_ERROR").await;
    assert_eq!(spy.calls(), 0);
}
