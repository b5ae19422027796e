/// Allow-lists and constants for subscription gating.
///
/// Prefixes match on path-segment boundaries: `/health` covers `/health`
/// and `/health/ready` but not `/healthz`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionPolicy {
    pub public_prefixes: Vec<String>,
    pub recovery_prefixes: Vec<String>,
    pub platform_admin_role: String,
    /// How many recent payments are inspected for a qualifying one.
    pub payment_window: usize,
}

const PUBLIC_PREFIXES: &[&str] = &[
    "/v1/register",
    "/v1/login",
    "/v1/logout",
    "/v1/refresh",
    "/health",
    "/metrics",
    "/docs",
    "/swagger",
    "/v1/webhooks",
    "/v1/subscriptions/plans",
];

const RECOVERY_PREFIXES: &[&str] = &[
    "/v1/payment-methods",
    "/v1/subscriptions/subscribe",
    "/v1/subscriptions/status",
    "/v1/subscriptions/plans",
];

impl Default for SubscriptionPolicy {
    fn default() -> Self {
        Self {
            public_prefixes: PUBLIC_PREFIXES.iter().map(|p| p.to_string()).collect(),
            recovery_prefixes: RECOVERY_PREFIXES.iter().map(|p| p.to_string()).collect(),
            platform_admin_role: "PlatformAdmin".to_string(),
            payment_window: 10,
        }
    }
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

impl SubscriptionPolicy {
    pub fn with_platform_admin_role(mut self, role: impl Into<String>) -> Self {
        self.platform_admin_role = role.into();
        self
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public_prefixes.iter().any(|p| matches_prefix(path, p))
    }

    pub fn is_payment_recovery(&self, path: &str) -> bool {
        self.recovery_prefixes.iter().any(|p| matches_prefix(path, p))
    }
}
