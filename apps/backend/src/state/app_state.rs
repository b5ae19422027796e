use std::sync::Arc;

use crate::auth::api_key::ApiKeyVerifier;
use crate::auth::token_validator::TokenValidator;
use crate::cache::response_cache::{CacheInvalidator, ResponseCache};
use crate::subscription::gate::SubscriptionGate;

/// Shared collaborators, built once and handed to every route's pipeline.
#[derive(Clone)]
pub struct AppState {
    pub token_validator: Arc<TokenValidator>,
    pub api_keys: Arc<dyn ApiKeyVerifier>,
    pub subscription_gate: Arc<SubscriptionGate>,
    pub response_cache: Arc<ResponseCache>,
    /// Exact-key invalidation for handlers that mutate cached resources.
    pub cache_invalidator: CacheInvalidator,
}
