#![allow(dead_code)]

pub mod tenants;

pub use app_builder::{create_test_app, SpyHandler};
pub use identity::{FakeIdentity, CLIENT_ID};

use std::sync::Arc;

use tenant_access::state::StateBuilder;
use tenant_access::subscription::memory::InMemoryTenants;

/// State builder wired to the fake identity provider and in-memory tenants.
pub fn test_state(identity: Arc<FakeIdentity>, tenants: Arc<InMemoryTenants>) -> StateBuilder {
    StateBuilder::new()
        .with_identity(identity, CLIENT_ID)
        .with_tenants(tenants.clone(), tenants)
}
