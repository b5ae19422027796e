pub mod directory;
pub mod gate;
pub mod memory;
pub mod model;
pub mod policy;

pub use directory::{LookupError, PaymentHistory, SubscriptionDirectory};
pub use gate::SubscriptionGate;
pub use memory::InMemoryTenants;
pub use model::{PaymentRecord, PaymentStatus, SubscriptionRecord, SubscriptionStatus};
pub use policy::SubscriptionPolicy;
