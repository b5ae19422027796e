use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::auth::api_key::{ApiKeyVerifier, StaticApiKeyVerifier};
use crate::auth::identity::{IdentityProvider, KeycloakProvider};
use crate::auth::token_validator::TokenValidator;
use crate::cache::response_cache::{CacheInvalidator, ResponseCache};
use crate::cache::store::{CacheStore, MemoryCacheStore, RedisCacheStore};
use crate::config::app_config::{CacheSettings, Config};
use crate::error::AppError;
use crate::state::app_state::AppState;
use crate::subscription::directory::{PaymentHistory, SubscriptionDirectory};
use crate::subscription::gate::SubscriptionGate;
use crate::subscription::memory::InMemoryTenants;
use crate::subscription::policy::SubscriptionPolicy;

const DEFAULT_IDP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Builder for creating AppState instances (used in both tests and main)
pub struct StateBuilder {
    identity: Option<(Arc<dyn IdentityProvider>, String)>,
    identity_timeout: Duration,
    api_keys: Arc<dyn ApiKeyVerifier>,
    directory: Option<Arc<dyn SubscriptionDirectory>>,
    payments: Option<Arc<dyn PaymentHistory>>,
    policy: SubscriptionPolicy,
    backend_timeout: Duration,
    cache_store: Option<Arc<dyn CacheStore>>,
    cache_settings: CacheSettings,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            identity: None,
            identity_timeout: DEFAULT_IDP_TIMEOUT,
            api_keys: Arc::new(StaticApiKeyVerifier::default()),
            directory: None,
            payments: None,
            policy: SubscriptionPolicy::default(),
            backend_timeout: DEFAULT_BACKEND_TIMEOUT,
            cache_store: None,
            cache_settings: CacheSettings::default(),
        }
    }

    /// Wire every collaborator from configuration: Keycloak, Redis (or the
    /// in-process store), configured API keys and the tenant directory.
    pub async fn from_config(config: &Config) -> Result<Self, AppError> {
        let provider = KeycloakProvider::new(config.identity.clone())?;

        let cache_store: Arc<dyn CacheStore> = match &config.redis_url {
            Some(url) => Arc::new(RedisCacheStore::connect(url).await?),
            None => {
                info!("REDIS_URL not set, using in-process cache store");
                Arc::new(MemoryCacheStore::default())
            }
        };

        let tenants = Arc::new(match &config.tenant_seed_file {
            Some(path) => InMemoryTenants::from_seed_file(path)?,
            None => InMemoryTenants::new(),
        });

        Ok(Self::new()
            .with_identity(Arc::new(provider), config.identity.client_id.clone())
            .with_identity_timeout(config.identity.request_timeout)
            .with_api_keys(Arc::new(StaticApiKeyVerifier::new(config.api_keys.clone())))
            .with_tenants(tenants.clone(), tenants)
            .with_policy(SubscriptionPolicy::default().with_platform_admin_role(&config.platform_admin_role))
            .with_backend_timeout(config.backend_timeout)
            .with_cache_store(cache_store)
            .with_cache_settings(config.cache.clone()))
    }

    pub fn with_identity(mut self, provider: Arc<dyn IdentityProvider>, client_id: impl Into<String>) -> Self {
        self.identity = Some((provider, client_id.into()));
        self
    }

    pub fn with_identity_timeout(mut self, timeout: Duration) -> Self {
        self.identity_timeout = timeout;
        self
    }

    pub fn with_api_keys(mut self, verifier: Arc<dyn ApiKeyVerifier>) -> Self {
        self.api_keys = verifier;
        self
    }

    pub fn with_tenants(
        mut self,
        directory: Arc<dyn SubscriptionDirectory>,
        payments: Arc<dyn PaymentHistory>,
    ) -> Self {
        self.directory = Some(directory);
        self.payments = Some(payments);
        self
    }

    pub fn with_policy(mut self, policy: SubscriptionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout = timeout;
        self
    }

    pub fn with_cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.cache_store = Some(store);
        self
    }

    pub fn with_cache_settings(mut self, settings: CacheSettings) -> Self {
        self.cache_settings = settings;
        self
    }

    pub fn build(self) -> Result<AppState, AppError> {
        let (provider, client_id) = self
            .identity
            .ok_or_else(|| AppError::config("identity provider not configured"))?;
        let (directory, payments) = match (self.directory, self.payments) {
            (Some(directory), Some(payments)) => (directory, payments),
            _ => return Err(AppError::config("tenant directory not configured")),
        };
        let cache_store = self
            .cache_store
            .unwrap_or_else(|| Arc::new(MemoryCacheStore::default()));

        Ok(AppState {
            token_validator: Arc::new(TokenValidator::new(provider, client_id, self.identity_timeout)),
            api_keys: self.api_keys,
            subscription_gate: Arc::new(SubscriptionGate::new(
                directory,
                payments,
                self.policy,
                self.backend_timeout,
            )),
            response_cache: Arc::new(ResponseCache::new(cache_store.clone(), &self.cache_settings)),
            cache_invalidator: CacheInvalidator::new(cache_store, &self.cache_settings),
        })
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
