//! Subscription gate: admits or denies a tenant's request based on the
//! state of its subscription.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::time::timeout;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::pipeline::context::AccessContext;
use crate::pipeline::stage::AccessStage;
use crate::subscription::directory::{LookupError, PaymentHistory, SubscriptionDirectory};
use crate::subscription::model::{SubscriptionRecord, SubscriptionStatus};
use crate::subscription::policy::SubscriptionPolicy;

pub struct SubscriptionGate {
    directory: Arc<dyn SubscriptionDirectory>,
    payments: Arc<dyn PaymentHistory>,
    policy: SubscriptionPolicy,
    timeout: Duration,
}

impl SubscriptionGate {
    pub fn new(
        directory: Arc<dyn SubscriptionDirectory>,
        payments: Arc<dyn PaymentHistory>,
        policy: SubscriptionPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            directory,
            payments,
            policy,
            timeout,
        }
    }

    pub fn policy(&self) -> &SubscriptionPolicy {
        &self.policy
    }

    async fn lookup(&self, organization_id: &str) -> Result<SubscriptionRecord, AppError> {
        let found = timeout(self.timeout, self.directory.find_by_organization(organization_id))
            .await
            .map_err(|_| LookupError::Timeout)
            .and_then(|inner| inner)
            .map_err(|err| {
                error!(organization_id, error = %err, "failed to fetch company for subscription check");
                AppError::from(err)
            })?;

        found.ok_or_else(AppError::subscription_not_found)
    }

    async fn has_valid_payment(&self, organization_id: &str) -> Result<bool, AppError> {
        let org = Uuid::parse_str(organization_id).map_err(|e| {
            error!(organization_id, error = %e, "organization id is not a valid UUID");
            AppError::dependency(format!("invalid organization id: {e}"))
        })?;

        let payments = timeout(
            self.timeout,
            self.payments.recent_payments(org, self.policy.payment_window),
        )
        .await
        .map_err(|_| LookupError::Timeout)
        .and_then(|inner| inner)
        .map_err(|err| {
            error!(organization_id, error = %err, "failed to verify payment status");
            AppError::from(err)
        })?;

        Ok(payments.iter().any(|p| p.status.qualifies()))
    }

    /// Apply the status state machine to a tenant record.
    pub async fn evaluate(
        &self,
        record: &SubscriptionRecord,
        path: &str,
        now: OffsetDateTime,
    ) -> Result<(), AppError> {
        let organization_id = record.organization_id.as_str();

        if record.is_platform {
            info!(organization_id, "subscription check skipped for platform tenant");
            return Ok(());
        }

        let status = SubscriptionStatus::parse(&record.status).ok_or_else(|| {
            error!(organization_id, status = %record.status, "unknown subscription status");
            AppError::SubscriptionStateUnknown {
                status: record.status.clone(),
            }
        })?;

        match status {
            SubscriptionStatus::Trial => match record.trial_ends_at {
                Some(trial_ended_at) if now >= trial_ended_at => {
                    Err(AppError::TrialExpired { trial_ended_at })
                }
                _ => Ok(()),
            },
            SubscriptionStatus::Active | SubscriptionStatus::Permanent => {
                if self.has_valid_payment(organization_id).await? {
                    return Ok(());
                }
                if self.policy.is_payment_recovery(path) {
                    info!(organization_id, path, %status, "payment recovery access granted");
                    return Ok(());
                }
                Err(AppError::PaymentPending {
                    recovery_endpoints: self.policy.recovery_prefixes.clone(),
                })
            }
            SubscriptionStatus::Suspended => Err(AppError::Suspended),
            SubscriptionStatus::Cancelled => Err(AppError::Cancelled),
        }
    }
}

#[async_trait]
impl AccessStage for SubscriptionGate {
    fn name(&self) -> &'static str {
        "subscription"
    }

    async fn admit(&self, ctx: &mut AccessContext) -> Result<(), AppError> {
        if self.policy.is_public(ctx.path()) {
            return Ok(());
        }

        let is_platform_admin = ctx
            .claims()
            .is_some_and(|c| c.roles.contains(&self.policy.platform_admin_role));
        if is_platform_admin {
            info!(path = ctx.path(), "subscription check skipped for platform admin");
            return Ok(());
        }

        let organization_id = ctx
            .organization_id()
            .ok_or_else(AppError::organization_required)?;

        let record = self.lookup(organization_id).await?;
        self.evaluate(&record, ctx.path(), OffsetDateTime::now_utc()).await
    }
}
