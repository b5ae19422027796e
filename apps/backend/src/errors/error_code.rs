//! Error codes for the access pipeline.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//! All codes are SCREAMING_SNAKE_CASE and map 1:1 to the `code` field of
//! error responses.

use core::fmt;

/// Centralized error codes emitted by the access pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Authentication
    /// No credential was presented
    Unauthenticated,
    /// Token rejected by the identity provider
    InvalidToken,
    /// API key not recognised
    InvalidApiKey,
    /// Authenticated caller carries no organization
    OrganizationRequired,
    /// Identity provider call failed
    AuthServiceError,
    /// Token claims did not have the expected shape
    MalformedClaims,

    // Authorization
    /// Required role missing
    Forbidden,

    // Subscription gating
    /// No subscription record for the organization
    SubscriptionNotFound,
    /// Trial period is over
    SubscriptionTrialExpired,
    /// Active subscription without a qualifying payment
    SubscriptionPaymentPending,
    /// Subscription suspended
    SubscriptionSuspended,
    /// Subscription cancelled
    SubscriptionCancelled,
    /// Stored subscription status is not a known value
    SubscriptionStateUnknown,

    // System
    /// Lookup or storage failure unrelated to the caller
    DependencyError,
    /// Configuration error
    ConfigError,
}

impl ErrorCode {
    /// Returns the canonical string used in responses.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::InvalidApiKey => "INVALID_API_KEY",
            Self::OrganizationRequired => "ORGANIZATION_REQUIRED",
            Self::AuthServiceError => "AUTH_SERVICE_ERROR",
            Self::MalformedClaims => "MALFORMED_CLAIMS",

            Self::Forbidden => "FORBIDDEN",

            Self::SubscriptionNotFound => "SUBSCRIPTION_NOT_FOUND",
            Self::SubscriptionTrialExpired => "SUBSCRIPTION_TRIAL_EXPIRED",
            Self::SubscriptionPaymentPending => "SUBSCRIPTION_PAYMENT_PENDING",
            Self::SubscriptionSuspended => "SUBSCRIPTION_SUSPENDED",
            Self::SubscriptionCancelled => "SUBSCRIPTION_CANCELLED",
            Self::SubscriptionStateUnknown => "SUBSCRIPTION_STATE_UNKNOWN",

            Self::DependencyError => "DEPENDENCY_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
