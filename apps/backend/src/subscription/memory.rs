//! In-process tenant directory used by the standalone binary and tests.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;
use crate::subscription::directory::{LookupError, PaymentHistory, SubscriptionDirectory};
use crate::subscription::model::{PaymentRecord, SubscriptionRecord};

#[derive(Debug, Default, Deserialize)]
struct TenantSeed {
    #[serde(default)]
    subscriptions: Vec<SubscriptionRecord>,
    #[serde(default)]
    payments: Vec<PaymentRecord>,
}

#[derive(Debug, Default)]
pub struct InMemoryTenants {
    subscriptions: RwLock<HashMap<String, SubscriptionRecord>>,
    payments: RwLock<HashMap<Uuid, Vec<PaymentRecord>>>,
}

impl InMemoryTenants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `{"subscriptions": [...], "payments": [...]}` from a JSON file.
    pub fn from_seed_file(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("cannot read tenant seed file {}: {e}", path.display()))
        })?;
        let seed: TenantSeed = serde_json::from_str(&raw).map_err(|e| {
            AppError::config(format!("invalid tenant seed file {}: {e}", path.display()))
        })?;

        let mut subscriptions = HashMap::new();
        for record in seed.subscriptions {
            subscriptions.insert(record.organization_id.clone(), record);
        }
        let mut payments: HashMap<Uuid, Vec<PaymentRecord>> = HashMap::new();
        for payment in seed.payments {
            payments.entry(payment.organization_id).or_default().push(payment);
        }

        Ok(Self {
            subscriptions: RwLock::new(subscriptions),
            payments: RwLock::new(payments),
        })
    }

    pub async fn upsert_subscription(&self, record: SubscriptionRecord) {
        self.subscriptions
            .write()
            .await
            .insert(record.organization_id.clone(), record);
    }

    pub async fn record_payment(&self, payment: PaymentRecord) {
        self.payments
            .write()
            .await
            .entry(payment.organization_id)
            .or_default()
            .push(payment);
    }
}

#[async_trait]
impl SubscriptionDirectory for InMemoryTenants {
    async fn find_by_organization(
        &self,
        organization_id: &str,
    ) -> Result<Option<SubscriptionRecord>, LookupError> {
        Ok(self.subscriptions.read().await.get(organization_id).cloned())
    }
}

#[async_trait]
impl PaymentHistory for InMemoryTenants {
    async fn recent_payments(
        &self,
        organization_id: Uuid,
        limit: usize,
    ) -> Result<Vec<PaymentRecord>, LookupError> {
        let guard = self.payments.read().await;
        let mut payments = guard.get(&organization_id).cloned().unwrap_or_default();
        payments.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        payments.truncate(limit);
        Ok(payments)
    }
}
