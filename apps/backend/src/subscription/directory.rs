//! Client contracts for the company and payment services.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::error::AppError;
use crate::subscription::model::{PaymentRecord, SubscriptionRecord};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LookupError {
    #[error("lookup backend unavailable: {0}")]
    Unavailable(String),
    #[error("lookup timed out")]
    Timeout,
}

impl From<LookupError> for AppError {
    fn from(err: LookupError) -> Self {
        AppError::dependency(err.to_string())
    }
}

#[async_trait]
pub trait SubscriptionDirectory: Send + Sync {
    /// `Ok(None)` when the organization has no company record.
    async fn find_by_organization(
        &self,
        organization_id: &str,
    ) -> Result<Option<SubscriptionRecord>, LookupError>;
}

#[async_trait]
pub trait PaymentHistory: Send + Sync {
    /// The `limit` most recent payments, newest first.
    async fn recent_payments(
        &self,
        organization_id: Uuid,
        limit: usize,
    ) -> Result<Vec<PaymentRecord>, LookupError>;
}
