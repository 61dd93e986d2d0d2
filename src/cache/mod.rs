//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and LRU eviction.

mod bounded;
mod entry;
mod expiry;
mod lru;
mod store;


// Re-export public types
pub use bounded::BoundedTtlCache;
pub use entry::CacheEntry;
pub use expiry::ExpiryQueue;
pub use lru::LruTracker;
pub use store::CacheStore;

pub(crate) use bounded::Shared;
