//! Tenant fixtures backed by the in-memory directory.

use std::sync::Arc;

use async_trait::async_trait;
use tenant_access::subscription::directory::{LookupError, PaymentHistory, SubscriptionDirectory};
use tenant_access::subscription::memory::InMemoryTenants;
use tenant_access::subscription::model::{PaymentRecord, PaymentStatus, SubscriptionRecord};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

pub fn record(organization_id: &str, status: &str) -> SubscriptionRecord {
    SubscriptionRecord {
        organization_id: organization_id.to_string(),
        status: status.to_string(),
        trial_ends_at: None,
        is_platform: false,
        next_payment_due: None,
    }
}

pub fn trial(organization_id: &str, ends_in: Duration) -> SubscriptionRecord {
    SubscriptionRecord {
        trial_ends_at: Some(OffsetDateTime::now_utc() + ends_in),
        ..record(organization_id, "trial")
    }
}

pub fn payment(organization_id: Uuid, status: PaymentStatus) -> PaymentRecord {
    PaymentRecord {
        organization_id,
        status,
        recorded_at: OffsetDateTime::now_utc() - Duration::days(3),
    }
}

/// Directory holding the given subscriptions and payments.
pub async fn tenants_with(
    subscriptions: Vec<SubscriptionRecord>,
    payments: Vec<PaymentRecord>,
) -> Arc<InMemoryTenants> {
    let tenants = Arc::new(InMemoryTenants::new());
    for record in subscriptions {
        tenants.upsert_subscription(record).await;
    }
    for payment in payments {
        tenants.record_payment(payment).await;
    }
    tenants
}

/// Directory and payment service that are both down.
pub struct UnavailableTenants;

#[async_trait]
impl SubscriptionDirectory for UnavailableTenants {
    async fn find_by_organization(
        &self,
        _organization_id: &str,
    ) -> Result<Option<SubscriptionRecord>, LookupError> {
        Err(LookupError::Unavailable("company service returned 503".to_string()))
    }
}

#[async_trait]
impl PaymentHistory for UnavailableTenants {
    async fn recent_payments(
        &self,
        _organization_id: Uuid,
        _limit: usize,
    ) -> Result<Vec<PaymentRecord>, LookupError> {
        Err(LookupError::Unavailable("payment service returned 503".to_string()))
    }
}

/// Company service that never answers.
pub struct StalledDirectory;

#[async_trait]
impl SubscriptionDirectory for StalledDirectory {
    async fn find_by_organization(
        &self,
        _organization_id: &str,
    ) -> Result<Option<SubscriptionRecord>, LookupError> {
        std::future::pending().await
    }
}

/// Payment service that never answers.
pub struct StalledPayments;

#[async_trait]
impl PaymentHistory for StalledPayments {
    async fn recent_payments(
        &self,
        _organization_id: Uuid,
        _limit: usize,
    ) -> Result<Vec<PaymentRecord>, LookupError> {
        std::future::pending().await
    }
}
