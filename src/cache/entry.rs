//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// Represents a single cache entry with value and write metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Time of the most recent `put` for this key
    pub inserted_at: Instant,
    /// Write sequence number, unique per `put`
    pub generation: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry written at `now`.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `now` - Write time
    /// * `generation` - Sequence number of the write
    pub fn new(value: V, now: Instant, generation: u64) -> Self {
        Self {
            value,
            inserted_at: now,
            generation,
        }
    }

    // == Expires At ==
    /// Returns the instant at which this entry stops being resident.
    ///
    /// `None` when the deadline lies beyond the clock's range, in which case
    /// the entry never expires.
    pub fn expires_at(&self, max_age: Duration) -> Option<Instant> {
        self.inserted_at.checked_add(max_age)
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once `now` reaches
    /// `inserted_at + max_age`, not one tick later.
    pub fn is_expired(&self, max_age: Duration, now: Instant) -> bool {
        self.expires_at(max_age)
            .is_some_and(|deadline| now >= deadline)
    }
}
