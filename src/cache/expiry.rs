//! Expiry Queue Module
//!
//! Pending expiries ordered by deadline, at most one per key.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use tokio::time::Instant;

/// Position of a pending expiry: its deadline plus the write generation it
/// was armed for. Generations are unique, so slots never collide.
type Slot = (Instant, u64);

// == Expiry Queue ==
/// Deadline-ordered set of scheduled removals.
#[derive(Debug)]
pub struct ExpiryQueue<K> {
    /// Pending removals ordered by deadline
    deadlines: BTreeMap<Slot, K>,
    /// Slot currently armed for each key
    armed: HashMap<K, Slot>,
}

impl<K> Default for ExpiryQueue<K> {
    fn default() -> Self {
        Self {
            deadlines: BTreeMap::new(),
            armed: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq + Clone> ExpiryQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    // == Arm ==
    /// Schedules removal of `key` at `deadline`, replacing any pending one.
    pub fn arm(&mut self, key: K, deadline: Instant, generation: u64) {
        let slot = (deadline, generation);
        if let Some(previous) = self.armed.insert(key.clone(), slot) {
            self.deadlines.remove(&previous);
        }
        self.deadlines.insert(slot, key);
    }

    // == Cancel ==
    /// Drops the pending expiry for `key`. Returns false if none was armed.
    pub fn cancel<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.armed.remove(key) {
            Some(slot) => {
                self.deadlines.remove(&slot);
                true
            }
            None => false,
        }
    }

    // == Pop Due ==
    /// Removes and returns every expiry whose deadline is at or before `now`,
    /// earliest first, paired with the generation it was armed for.
    pub fn pop_due(&mut self, now: Instant) -> Vec<(K, u64)> {
        let mut due = Vec::new();
        while let Some(entry) = self.deadlines.first_entry() {
            let (deadline, generation) = *entry.key();
            if deadline > now {
                break;
            }
            let key = entry.remove();
            self.armed.remove(&key);
            due.push((key, generation));
        }
        due
    }

    // == Next Deadline ==
    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.keys().next().map(|(deadline, _)| *deadline)
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn clear(&mut self) {
        self.deadlines.clear();
        self.armed.clear();
    }
}
