use actix_web::error::ResponseError;
use actix_web::http::{header, StatusCode};
use actix_web::HttpResponse;
use serde::Serialize;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::errors::ErrorCode;
use crate::trace_ctx;

/// JSON body of every rejection produced by the pipeline.
///
/// Carries no per-request data, so repeating a denied request yields a
/// byte-identical body. The trace id travels in the `X-Trace-Id` header.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_ended_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_recovery_endpoints: Option<Vec<String>>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Unauthenticated: {detail}")]
    Unauthenticated { code: ErrorCode, detail: String },
    #[error("Invalid token")]
    InvalidToken,
    #[error("Invalid API key")]
    InvalidApiKey,
    #[error("Identity provider error: {detail}")]
    AuthService { detail: String },
    #[error("Malformed claims: {detail}")]
    MalformedClaims { detail: String },
    #[error("Forbidden")]
    Forbidden,
    #[error("Not found: {detail}")]
    NotFound { code: ErrorCode, detail: String },
    #[error("Trial expired at {trial_ended_at}")]
    TrialExpired { trial_ended_at: OffsetDateTime },
    #[error("Payment pending")]
    PaymentPending { recovery_endpoints: Vec<String> },
    #[error("Subscription suspended")]
    Suspended,
    #[error("Subscription cancelled")]
    Cancelled,
    #[error("Unknown subscription status: {status}")]
    SubscriptionStateUnknown { status: String },
    #[error("Dependency error: {detail}")]
    Dependency { detail: String },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Unauthenticated { code, .. } => *code,
            AppError::InvalidToken => ErrorCode::InvalidToken,
            AppError::InvalidApiKey => ErrorCode::InvalidApiKey,
            AppError::AuthService { .. } => ErrorCode::AuthServiceError,
            AppError::MalformedClaims { .. } => ErrorCode::MalformedClaims,
            AppError::Forbidden => ErrorCode::Forbidden,
            AppError::NotFound { code, .. } => *code,
            AppError::TrialExpired { .. } => ErrorCode::SubscriptionTrialExpired,
            AppError::PaymentPending { .. } => ErrorCode::SubscriptionPaymentPending,
            AppError::Suspended => ErrorCode::SubscriptionSuspended,
            AppError::Cancelled => ErrorCode::SubscriptionCancelled,
            AppError::SubscriptionStateUnknown { .. } => ErrorCode::SubscriptionStateUnknown,
            AppError::Dependency { .. } => ErrorCode::DependencyError,
            AppError::Config { .. } => ErrorCode::ConfigError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            AppError::AuthService { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::MalformedClaims { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::TrialExpired { .. } => StatusCode::PAYMENT_REQUIRED,
            AppError::PaymentPending { .. } => StatusCode::PAYMENT_REQUIRED,
            AppError::Suspended => StatusCode::PAYMENT_REQUIRED,
            AppError::Cancelled => StatusCode::FORBIDDEN,
            AppError::SubscriptionStateUnknown { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Dependency { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-friendly reason used in rejection logs.
    pub fn reason(&self) -> &'static str {
        match self {
            AppError::Unauthenticated { .. } => "unauthenticated",
            AppError::InvalidToken => "invalid_token",
            AppError::InvalidApiKey => "invalid_api_key",
            AppError::AuthService { .. } => "auth_service_error",
            AppError::MalformedClaims { .. } => "malformed_claims",
            AppError::Forbidden => "missing_role",
            AppError::NotFound { .. } => "not_found",
            AppError::TrialExpired { .. } => "trial_expired",
            AppError::PaymentPending { .. } => "payment_pending",
            AppError::Suspended => "suspended",
            AppError::Cancelled => "cancelled",
            AppError::SubscriptionStateUnknown { .. } => "unknown_status",
            AppError::Dependency { .. } => "dependency_error",
            AppError::Config { .. } => "config_error",
        }
    }

    pub fn missing_credentials() -> Self {
        Self::Unauthenticated {
            code: ErrorCode::Unauthenticated,
            detail: "Missing or malformed credentials".to_string(),
        }
    }

    pub fn organization_required() -> Self {
        Self::Unauthenticated {
            code: ErrorCode::OrganizationRequired,
            detail: "Organization ID required".to_string(),
        }
    }

    pub fn auth_service(detail: impl Into<String>) -> Self {
        Self::AuthService {
            detail: detail.into(),
        }
    }

    pub fn malformed_claims(detail: impl Into<String>) -> Self {
        Self::MalformedClaims {
            detail: detail.into(),
        }
    }

    pub fn subscription_not_found() -> Self {
        Self::NotFound {
            code: ErrorCode::SubscriptionNotFound,
            detail: "No subscription found for organization".to_string(),
        }
    }

    pub fn dependency(detail: impl Into<String>) -> Self {
        Self::Dependency {
            detail: detail.into(),
        }
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    /// Build the client-facing body. Internal details (provider messages,
    /// storage errors) stay in the logs.
    pub fn body(&self) -> ErrorBody {
        let mut body = ErrorBody {
            error: String::new(),
            code: self.code().as_str(),
            subscription_status: None,
            message: None,
            trial_ended_at: None,
            payment_recovery_endpoints: None,
        };

        match self {
            AppError::Unauthenticated { detail, .. } => body.error = detail.clone(),
            AppError::InvalidToken => body.error = "Invalid or inactive token".to_string(),
            AppError::InvalidApiKey => body.error = "Invalid API key".to_string(),
            AppError::AuthService { .. } => {
                body.error = "Authentication service unavailable".to_string();
            }
            AppError::MalformedClaims { .. } => {
                body.error = "Token claims could not be processed".to_string();
            }
            AppError::Forbidden => body.error = "Required access role missing".to_string(),
            AppError::NotFound { detail, .. } => body.error = detail.clone(),
            AppError::TrialExpired { trial_ended_at } => {
                body.error = "Trial period has expired".to_string();
                body.subscription_status = Some("trial_expired");
                body.trial_ended_at = trial_ended_at.format(&Rfc3339).ok();
                body.message = Some("Please subscribe to continue using the service".to_string());
            }
            AppError::PaymentPending { recovery_endpoints } => {
                body.error = "Payment required to access this feature".to_string();
                body.subscription_status = Some("payment_pending");
                body.message = Some(
                    "Your subscription is active but payment is still being processed. \
                     You can still access payment-related endpoints to resolve this issue."
                        .to_string(),
                );
                body.payment_recovery_endpoints = Some(recovery_endpoints.clone());
            }
            AppError::Suspended => {
                body.error = "Subscription suspended due to payment issues".to_string();
                body.subscription_status = Some("suspended");
                body.message = Some(
                    "Please update your payment information to reactivate your subscription"
                        .to_string(),
                );
            }
            AppError::Cancelled => {
                body.error = "Subscription has been cancelled".to_string();
                body.subscription_status = Some("cancelled");
                body.message = Some("Please contact support to reactivate your account".to_string());
            }
            AppError::SubscriptionStateUnknown { .. } => {
                body.error = "Unable to verify subscription status".to_string();
                body.subscription_status = Some("unknown_status");
                body.message = Some("Please contact support".to_string());
            }
            AppError::Dependency { .. } => {
                body.error = "Unable to verify subscription status".to_string();
                body.message = Some("Please contact support".to_string());
            }
            AppError::Config { .. } => body.error = "Service misconfigured".to_string(),
        }

        body
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status();
        let mut builder = HttpResponse::build(status);

        if let Some(trace_id) = trace_ctx::current() {
            builder.insert_header(("x-trace-id", trace_id));
        }
        if status == StatusCode::UNAUTHORIZED {
            builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }

        builder.json(self.body())
    }
}
