//! Tenant subscription and payment records as seen by the gate.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Canonical subscription states. Stored values are matched
/// case-insensitively; anything else is a data-integrity fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Trial,
    Active,
    Permanent,
    Suspended,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "trial" => Some(Self::Trial),
            "active" => Some(Self::Active),
            "permanent" => Some(Self::Permanent),
            "suspended" => Some(Self::Suspended),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trial => "trial",
            Self::Active => "active",
            Self::Permanent => "permanent",
            Self::Suspended => "suspended",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tenant's subscription as stored by the company service.
///
/// `status` is kept raw so integrity faults surface at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub organization_id: String,
    pub status: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub trial_ends_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub is_platform: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub next_payment_due: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Confirmed,
    Received,
    Anticipated,
    Other(String),
}

impl PaymentStatus {
    /// Whether a payment in this state counts as valid for an active tenant.
    pub fn qualifies(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Received | Self::Anticipated)
    }
}

impl From<String> for PaymentStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "confirmed" => Self::Confirmed,
            "received" => Self::Received,
            "anticipated" => Self::Anticipated,
            _ => Self::Other(raw),
        }
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Confirmed => "confirmed".to_string(),
            PaymentStatus::Received => "received".to_string(),
            PaymentStatus::Anticipated => "anticipated".to_string(),
            PaymentStatus::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub organization_id: Uuid,
    pub status: PaymentStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}
