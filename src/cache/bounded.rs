//! Bounded TTL Cache
//!
//! Thread-safe handle over a `CacheStore`, plus the background reaper that
//! removes entries once their max age has passed.

use std::borrow::Borrow;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::tasks::{spawn_expiry_task, Reap};

/// Everything guarded by the cache lock.
struct State<K, V> {
    store: CacheStore<K, V>,
    shut_down: bool,
}

/// State shared between cache handles and the reaper task.
pub(crate) struct Shared<K, V> {
    config: Config,
    state: Mutex<State<K, V>>,
    /// Wakes the reaper when a new earliest deadline is armed
    notify: Arc<Notify>,
    reaper: Mutex<Option<JoinHandle<()>>>,
}

impl<K, V> State<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Removes every entry whose deadline has passed.
    fn sweep(&mut self, now: Instant) {
        let expired = self.store.expire_due(now);
        if !expired.is_empty() {
            debug!(
                count = expired.len(),
                remaining = self.store.len(),
                "Expired cache entries"
            );
        }
    }
}

impl<K, V> Shared<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Removes every due entry and reports when the reaper should next run.
    pub(crate) fn reap(&self) -> Reap {
        let mut state = self.state.lock();
        if state.shut_down {
            return Reap::Stopped;
        }

        state.sweep(Instant::now());

        match state.store.next_deadline() {
            Some(deadline) => Reap::Until(deadline),
            None => Reap::Idle,
        }
    }
}

impl<K, V> Drop for Shared<K, V> {
    fn drop(&mut self) {
        if let Some(task) = self.reaper.get_mut().take() {
            task.abort();
        }
    }
}

// == Bounded TTL Cache ==
/// Fixed-capacity, time-bounded, thread-safe key/value cache.
///
/// Least recently used entries are evicted when the cache is full, and every
/// entry is removed `max_age` after its most recent `put` whether or not it
/// was read in between. Reads refresh recency but never the expiry clock.
/// The reaper removes entries in the background; every operation also drops
/// entries whose deadline has passed, so an expired entry is never observed
/// even while the reaper's runtime is busy or not being driven.
///
/// Cloning is cheap and yields another handle to the same cache. Values are
/// handed out as clones; store an `Arc<T>` to share one instance instead,
/// in which case callers must not mutate it through interior mutability if
/// they rely on the cached copy staying stable.
pub struct BoundedTtlCache<K, V> {
    shared: Arc<Shared<K, V>>,
}

impl<K, V> Clone for BoundedTtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K, V> fmt::Debug for BoundedTtlCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedTtlCache")
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

impl<K, V> BoundedTtlCache<K, V>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    // == Constructor ==
    /// Creates a cache whose reaper runs on the current Tokio runtime.
    ///
    /// # Errors
    /// - `RuntimeUnavailable` when called outside a Tokio runtime
    /// - `InvalidConfig` when `config` fails validation
    pub fn new(config: Config) -> Result<Self> {
        let handle = Handle::try_current().map_err(|_| CacheError::RuntimeUnavailable)?;
        Self::with_handle(config, &handle)
    }

    /// Creates a cache whose reaper runs on `handle`.
    ///
    /// Useful when the cache is built from synchronous code that holds a
    /// runtime handle but is not itself inside the runtime.
    pub fn with_handle(config: Config, handle: &Handle) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(Shared {
            config,
            state: Mutex::new(State {
                store: CacheStore::new(config.max_size, config.max_age),
                shut_down: false,
            }),
            notify: Arc::new(Notify::new()),
            reaper: Mutex::new(None),
        });

        let task = spawn_expiry_task(
            Arc::downgrade(&shared),
            Arc::clone(&shared.notify),
            handle,
        );
        *shared.reaper.lock() = Some(task);

        info!(
            max_size = config.max_size,
            max_age = ?config.max_age,
            "Cache initialized"
        );

        Ok(Self { shared })
    }

    // == Put ==
    /// Inserts or overwrites the entry for `key`.
    ///
    /// Resets the key's expiry clock, marks it most recently used and evicts
    /// the least recently used entry if capacity is exceeded.
    pub fn put(&self, key: K, value: V) {
        let wake_reaper = {
            let now = Instant::now();
            let mut state = self.shared.state.lock();
            state.sweep(now);
            let previous_deadline = state.store.next_deadline();
            state.store.put(key, value, now);

            // Only an earlier deadline than the one the reaper sleeps on
            // needs a wake-up
            state
                .store
                .next_deadline()
                .is_some_and(|next| previous_deadline.map_or(true, |prev| next < prev))
        };

        if wake_reaper {
            self.shared.notify.notify_one();
        }
    }

    // == Get ==
    /// Returns the value for `key` if resident, marking it most recently used.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shared
            .state
            .lock()
            .store
            .get(key, Instant::now())
            .cloned()
    }

    // == Remove ==
    /// Removes `key` and cancels its pending expiry. No-op if absent.
    ///
    /// Returns the removed value, if any.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shared.state.lock().store.remove(key)
    }

    // == Clear ==
    /// Removes every entry and pending expiry in one critical section.
    pub fn clear(&self) {
        let mut state = self.shared.state.lock();
        let cleared = state.store.len();
        state.store.clear();
        debug!(cleared, "Cache cleared");
    }

    // == Size ==
    /// Current number of resident entries.
    ///
    /// Advisory under concurrency: other callers may change it immediately.
    pub fn size(&self) -> usize {
        let mut state = self.shared.state.lock();
        state.sweep(Instant::now());
        state.store.len()
    }

    /// Alias for [`size`](Self::size).
    pub fn len(&self) -> usize {
        self.size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Checks residency without affecting recency.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shared
            .state
            .lock()
            .store
            .contains_key(key, Instant::now())
    }

    /// Limits this cache was built with.
    pub fn config(&self) -> Config {
        self.shared.config
    }

    // == Read Through ==
    /// Returns the cached value for `key`, or computes, caches and returns it.
    ///
    /// `init` runs without the cache lock held, so concurrent misses on the
    /// same key may each run it; the last write wins.
    pub fn get_or_insert_with<F>(&self, key: K, init: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(&key) {
            return value;
        }
        let value = init();
        self.put(key, value.clone());
        value
    }

    /// Async, fallible variant of [`get_or_insert_with`](Self::get_or_insert_with).
    ///
    /// A loader error is returned to the caller and nothing is cached.
    pub async fn get_or_try_load<F, Fut, E>(&self, key: K, load: F) -> std::result::Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = load().await?;
        self.put(key, value.clone());
        Ok(value)
    }

    // == Shutdown ==
    /// Stops the expiry reaper. No expiry removes anything after this returns.
    ///
    /// Entries already resident stay resident. Repeated calls are no-ops.
    pub fn shutdown(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.shut_down {
                return;
            }
            state.shut_down = true;
            state.store.disable_expiry();
        }

        if let Some(task) = self.shared.reaper.lock().take() {
            task.abort();
        }
        info!("Cache shut down, expiry reaper stopped");
    }

    /// Entries held by the store, without dropping expired ones first.
    #[cfg(test)]
    pub(crate) fn stored_len(&self) -> usize {
        self.shared.state.lock().store.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::assert_err;

    fn config(max_size: usize, max_age_secs: u64) -> Config {
        Config::new(max_size, Duration::from_secs(max_age_secs))
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        let result = BoundedTtlCache::<String, String>::new(Config::default());
        assert_eq!(assert_err!(result), CacheError::RuntimeUnavailable);
    }

    #[test]
    fn test_with_handle_from_sync_code() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let cache = BoundedTtlCache::with_handle(config(10, 60), runtime.handle()).unwrap();
        cache.put("key".to_string(), 1u32);

        assert_eq!(cache.get("key"), Some(1));
        cache.shutdown();
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let result = BoundedTtlCache::<String, String>::new(config(0, 60));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_put_get_remove() {
        let cache = BoundedTtlCache::new(config(10, 60)).unwrap();

        cache.put("key".to_string(), "value".to_string());
        assert_eq!(cache.get("key"), Some("value".to_string()));
        assert!(cache.contains_key("key"));

        assert_eq!(cache.remove("key"), Some("value".to_string()));
        assert_eq!(cache.get("key"), None);
        assert_eq!(cache.remove("key"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let cache = BoundedTtlCache::new(config(10, 60)).unwrap();
        let other = cache.clone();

        cache.put(1u64, "one");
        assert_eq!(other.get(&1), Some("one"));
        assert_eq!(other.size(), 1);
    }

    #[tokio::test]
    async fn test_config_accessor() {
        let cache = BoundedTtlCache::<u64, u64>::new(config(5, 30)).unwrap();
        assert_eq!(cache.config(), config(5, 30));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let cache = BoundedTtlCache::<u64, u64>::new(config(5, 30)).unwrap();

        cache.put(1, 10);
        cache.shutdown();
        cache.shutdown();

        // Still a working LRU map afterwards
        cache.put(2, 20);
        assert_eq!(cache.get(&1), Some(10));
        assert_eq!(cache.get(&2), Some(20));
        assert_eq!(cache.size(), 2);
    }

    #[test]
    fn test_expired_entry_hidden_while_runtime_idle() {
        // The reaper is spawned but this runtime is never driven
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let cache = BoundedTtlCache::with_handle(
            Config::new(10, Duration::from_millis(200)),
            runtime.handle(),
        )
        .unwrap();

        cache.put("k".to_string(), 1u32);
        std::thread::sleep(Duration::from_millis(600));

        assert_eq!(cache.stored_len(), 1);
        assert!(!cache.contains_key("k"));
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_size_drops_expired_entries_while_runtime_idle() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let cache = BoundedTtlCache::with_handle(
            Config::new(10, Duration::from_millis(200)),
            runtime.handle(),
        )
        .unwrap();

        cache.put(1u32, "old");
        std::thread::sleep(Duration::from_millis(600));
        cache.put(2u32, "new");

        assert_eq!(cache.stored_len(), 1);
        assert_eq!(cache.size(), 1);
        assert_eq!(cache.get(&2), Some("new"));
    }

    #[tokio::test]
    async fn test_unbounded_max_age_rejected() {
        let result = BoundedTtlCache::<String, String>::new(Config::new(
            10,
            Duration::from_secs(u64::MAX),
        ));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_get_or_insert_with_caches_value() {
        let cache = BoundedTtlCache::new(config(10, 60)).unwrap();
        let mut calls = 0;

        let first = cache.get_or_insert_with(7u64, || {
            calls += 1;
            "loaded".to_string()
        });
        let second = cache.get_or_insert_with(7u64, || {
            calls += 1;
            "reloaded".to_string()
        });

        assert_eq!(first, "loaded");
        assert_eq!(second, "loaded");
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_get_or_try_load_does_not_cache_errors() {
        let cache: BoundedTtlCache<u64, String> = BoundedTtlCache::new(config(10, 60)).unwrap();

        let missing: std::result::Result<String, &str> =
            cache.get_or_try_load(1, || async { Err("not found") }).await;
        assert_eq!(missing, Err("not found"));
        assert!(!cache.contains_key(&1));

        let found: std::result::Result<String, &str> = cache
            .get_or_try_load(1, || async { Ok("food".to_string()) })
            .await;
        assert_eq!(found, Ok("food".to_string()));
        assert_eq!(cache.get(&1), Some("food".to_string()));
    }
}
