//! Hotcache - A bounded in-process cache for hot entities
//!
//! Provides a thread-safe key/value cache with LRU eviction and independent
//! per-entry TTL expiry driven by a background reaper.

pub mod cache;
pub mod config;
pub mod error;
mod tasks;

pub use cache::BoundedTtlCache;
pub use config::Config;
pub use error::{CacheError, Result};
