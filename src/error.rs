//! Error types for the cache
//!
//! Provides unified error handling using thiserror.
//!
//! Cache operations themselves never fail: a missing key is an ordinary
//! `None`. Errors only surface while building a cache.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Capacity or max age rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No Tokio runtime to host the expiry reaper
    #[error("No Tokio runtime available to run the expiry reaper")]
    RuntimeUnavailable,
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
