//! Configuration Module
//!
//! Handles loading and validating cache configuration.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Default maximum number of resident entries
pub const DEFAULT_MAX_SIZE: usize = 1000;

/// Default time an entry stays resident after its last `put`
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(60);

/// Longest accepted `max_age` (100 years). Deadlines derived from it stay
/// within the range of the monotonic clock.
pub const MAX_AGE_LIMIT: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Cache configuration parameters.
///
/// Fixed at construction; a running cache never changes its limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_size: usize,
    /// How long an entry stays resident after it was last written
    pub max_age: Duration,
}

impl Config {
    /// Creates a config with explicit limits.
    pub fn new(max_size: usize, max_age: Duration) -> Self {
        Self { max_size, max_age }
    }

    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Maximum resident entries (default: 1000)
    /// - `CACHE_MAX_AGE_SECS` - Entry lifetime in seconds (default: 60)
    pub fn from_env() -> Self {
        Self {
            max_size: env::var("CACHE_MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_SIZE),
            max_age: env::var("CACHE_MAX_AGE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_MAX_AGE),
        }
    }

    /// Rejects limits the cache cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(CacheError::InvalidConfig(
                "max_size must be at least 1".to_string(),
            ));
        }
        if self.max_age.is_zero() {
            return Err(CacheError::InvalidConfig(
                "max_age must be greater than zero".to_string(),
            ));
        }
        if self.max_age > MAX_AGE_LIMIT {
            return Err(CacheError::InvalidConfig(format!(
                "max_age must not exceed {} seconds",
                MAX_AGE_LIMIT.as_secs()
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            max_age: DEFAULT_MAX_AGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_size, 1000);
        assert_eq!(config.max_age, Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    // Single test so no other test races on the process environment
    #[test]
    fn test_config_from_env() {
        env::set_var("CACHE_MAX_SIZE", "42");
        env::set_var("CACHE_MAX_AGE_SECS", "5");
        let config = Config::from_env();
        assert_eq!(config.max_size, 42);
        assert_eq!(config.max_age, Duration::from_secs(5));

        // Unparseable values fall back to the defaults
        env::set_var("CACHE_MAX_SIZE", "lots");
        env::set_var("CACHE_MAX_AGE_SECS", "-1");
        assert_eq!(Config::from_env(), Config::default());

        env::remove_var("CACHE_MAX_SIZE");
        env::remove_var("CACHE_MAX_AGE_SECS");
        assert_eq!(Config::from_env(), Config::default());
    }

    #[test]
    fn test_validate_rejects_zero_size() {
        let config = Config::new(0, Duration::from_secs(1));
        assert!(matches!(
            config.validate(),
            Err(CacheError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_age() {
        let config = Config::new(10, Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(CacheError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_age_beyond_limit() {
        let config = Config::new(10, Duration::from_secs(u64::MAX));
        assert!(matches!(
            config.validate(),
            Err(CacheError::InvalidConfig(_))
        ));
        assert!(Config::new(10, MAX_AGE_LIMIT).validate().is_ok());
    }
}
