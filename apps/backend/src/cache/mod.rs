pub mod entry;
pub mod key;
pub mod policy;
pub mod response_cache;
pub mod store;

pub use entry::CacheEntry;
pub use key::{derive_key, KeyParts, MAX_KEY_LEN};
pub use policy::CachePolicy;
pub use response_cache::{CacheInvalidator, ResponseCache};
pub use store::{CacheError, CacheStore, MemoryCacheStore, RedisCacheStore};
