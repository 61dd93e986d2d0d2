//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and TTL expiration.
//!
//! `CacheStore` is not synchronized. `BoundedTtlCache` wraps it in a single
//! lock so the entry map, recency order and expiry queue always change together.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::cache::{CacheEntry, ExpiryQueue, LruTracker};

// == Cache Store ==
/// Main cache storage with LRU eviction and TTL support.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    /// Key-value storage
    entries: HashMap<K, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker<K>,
    /// Pending expiry per resident key
    expiries: ExpiryQueue<K>,
    /// Maximum number of entries allowed
    max_size: usize,
    /// Lifetime of an entry after its last write
    max_age: Duration,
    /// Generation handed to the next write
    next_generation: u64,
    /// Cleared once the expiry reaper is gone
    expiry_enabled: bool,
}

impl<K, V> CacheStore<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and max age.
    ///
    /// # Arguments
    /// * `max_size` - Maximum number of entries the cache can hold
    /// * `max_age` - How long an entry lives after its last `put`
    pub fn new(max_size: usize, max_age: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            expiries: ExpiryQueue::new(),
            max_size,
            max_age,
            next_generation: 0,
            expiry_enabled: true,
        }
    }

    // == Put ==
    /// Stores a key-value pair written at `now`.
    ///
    /// Overwriting a key resets its expiry clock. If the cache grows past
    /// capacity, the least recently used entry is evicted and returned.
    pub fn put(&mut self, key: K, value: V, now: Instant) -> Option<K> {
        let generation = self.next_generation;
        self.next_generation += 1;

        // Any pending expiry belongs to the previous write
        self.expiries.cancel(&key);

        self.entries
            .insert(key.clone(), CacheEntry::new(value, now, generation));
        self.lru.insert(key.clone());

        let mut evicted = None;
        if self.entries.len() > self.max_size {
            // The written key is most recent, so it is never the victim
            if let Some(victim) = self.lru.evict_oldest() {
                self.entries.remove(&victim);
                self.expiries.cancel(&victim);
                debug!(remaining = self.entries.len(), "Evicted least recently used entry");
                evicted = Some(victim);
            }
        }

        if self.expiry_enabled {
            // A deadline past the clock's range is never armed
            if let Some(deadline) = now.checked_add(self.max_age) {
                self.expiries.arm(key, deadline, generation);
            }
        }

        debug_assert_eq!(self.lru.len(), self.entries.len());
        evicted
    }

    // == Get ==
    /// Retrieves a value by key, marking it most recently used.
    ///
    /// An entry already past its deadline is removed here rather than
    /// waiting for the reaper. Does not touch the entry's expiry clock.
    pub fn get<Q>(&mut self, key: &Q, now: Instant) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.remove_if_expired(key, now) || !self.lru.touch(key) {
            return None;
        }
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Removes `key` if it is resident and past its deadline.
    fn remove_if_expired<Q>(&mut self, key: &Q, now: Instant) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if !self.expiry_enabled {
            return false;
        }
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired(self.max_age, now));
        if expired {
            self.remove(key);
            debug!("Removed expired entry on access");
        }
        expired
    }

    // == Remove ==
    /// Removes an entry by key, returning its value if it was resident.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        self.expiries.cancel(key);
        Some(entry.value)
    }

    // == Clear ==
    /// Removes every entry and pending expiry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.expiries.clear();
    }

    // == Expire Due ==
    /// Removes every entry whose expiry deadline has passed.
    ///
    /// Each due expiry is re-checked against the live entry before anything
    /// is removed: the entry must still carry the generation the expiry was
    /// armed for and must actually be past its deadline.
    ///
    /// Returns the removed keys.
    pub fn expire_due(&mut self, now: Instant) -> Vec<K> {
        let mut expired = Vec::new();

        for (key, generation) in self.expiries.pop_due(now) {
            let still_current = self.entries.get(&key).is_some_and(|entry| {
                entry.generation == generation && entry.is_expired(self.max_age, now)
            });
            if !still_current {
                debug!("Skipped stale expiry");
                continue;
            }
            self.entries.remove(&key);
            self.lru.remove(&key);
            expired.push(key);
        }

        expired
    }

    // == Next Deadline ==
    /// Earliest instant at which an entry is due to expire.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.expiries.next_deadline()
    }

    // == Disable Expiry ==
    /// Drops all pending expiries and stops arming new ones.
    pub fn disable_expiry(&mut self) {
        self.expiry_enabled = false;
        self.expiries.clear();
    }

    // == Contains Key ==
    /// Checks residency at `now` without affecting recency.
    pub fn contains_key<Q>(&mut self, key: &Q, now: Instant) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        !self.remove_if_expired(key, now) && self.entries.contains_key(key)
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of armed expiries.
    pub fn pending_expiries(&self) -> usize {
        self.expiries.len()
    }

    /// Resident keys from least to most recently used.
    pub fn keys_by_recency(&self) -> impl Iterator<Item = &K> {
        self.lru.iter()
    }
}
