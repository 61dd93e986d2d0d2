//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for cache eviction.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Every insert or touch stamps the key with a fresh tick:
/// - Lowest tick = Least recently used
/// - Highest tick = Most recently used
///
/// Ticks strictly increase, so two keys can never tie for eviction.
#[derive(Debug)]
pub struct LruTracker<K> {
    /// Keys ordered by last-use tick
    order: BTreeMap<u64, K>,
    /// Current tick of each tracked key
    ticks: HashMap<K, u64>,
    /// Next tick to hand out
    clock: u64,
}

impl<K> Default for LruTracker<K> {
    fn default() -> Self {
        Self {
            order: BTreeMap::new(),
            ticks: HashMap::new(),
            clock: 0,
        }
    }
}

impl<K: Hash + Eq + Clone> LruTracker<K> {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_tick(&mut self) -> u64 {
        let tick = self.clock;
        self.clock += 1;
        tick
    }

    // == Insert ==
    /// Marks `key` as most recently used, tracking it if it is new.
    pub fn insert(&mut self, key: K) {
        let tick = self.next_tick();
        if let Some(old) = self.ticks.insert(key.clone(), tick) {
            self.order.remove(&old);
        }
        self.order.insert(tick, key);
    }

    // == Touch ==
    /// Moves an already tracked key to the most recently used end.
    ///
    /// Returns false if the key is not tracked.
    pub fn touch<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let tick = self.clock;
        let Some(slot) = self.ticks.get_mut(key) else {
            return false;
        };
        let old = std::mem::replace(slot, tick);
        self.clock += 1;
        if let Some(owned) = self.order.remove(&old) {
            self.order.insert(tick, owned);
        }
        true
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.ticks.remove(key) {
            Some(tick) => {
                self.order.remove(&tick);
                true
            }
            None => false,
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<K> {
        let (_, key) = self.order.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.order.clear();
        self.ticks.clear();
    }

    /// Keys from least to most recently used.
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.order.values()
    }
}
