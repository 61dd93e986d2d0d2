//! Expiry Reaper Task
//!
//! Background task that removes cache entries when their deadline passes.

use std::hash::Hash;
use std::sync::{Arc, Weak};

use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::info;

use crate::cache::Shared;

/// What the reaper should do after a pass over the due expiries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reap {
    /// Sleep until the given deadline or until woken
    Until(Instant),
    /// Nothing is armed; wait for a `put` to wake us
    Idle,
    /// Cache was shut down
    Stopped,
}

/// Spawns the task that enforces entry expiry for one cache.
///
/// The task sleeps until the earliest pending deadline, then removes every
/// due entry under the cache lock. A `put` that arms an earlier deadline
/// wakes it through `notify`. The task only holds a weak reference, so it
/// exits once every cache handle is dropped, and it stops on shutdown.
///
/// # Arguments
/// * `cache` - Weak reference to the cache's shared state
/// * `notify` - Signalled when a new earliest deadline is armed
/// * `handle` - Runtime the task is spawned on
///
/// # Returns
/// A JoinHandle for the spawned task, which the cache aborts on shutdown.
pub(crate) fn spawn_expiry_task<K, V>(
    cache: Weak<Shared<K, V>>,
    notify: Arc<Notify>,
    handle: &Handle,
) -> JoinHandle<()>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Send + 'static,
{
    handle.spawn(async move {
        info!("Starting expiry reaper");

        loop {
            // Strong reference only lives for one pass
            let next = match cache.upgrade() {
                Some(shared) => shared.reap(),
                None => Reap::Stopped,
            };

            match next {
                Reap::Until(deadline) => {
                    tokio::select! {
                        _ = sleep_until(deadline) => {}
                        _ = notify.notified() => {}
                    }
                }
                Reap::Idle => notify.notified().await,
                Reap::Stopped => break,
            }
        }

        info!("Expiry reaper stopped");
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{BoundedTtlCache, Config};

    #[tokio::test(start_paused = true)]
    async fn test_reaper_removes_expired_entries() {
        let cache = BoundedTtlCache::new(Config::new(100, Duration::from_secs(1))).unwrap();

        cache.put("expire_soon".to_string(), "value".to_string());

        // Wait for entry to expire and the reaper to run
        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(
            cache.stored_len(),
            0,
            "Expired entry should have been removed"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaper_preserves_valid_entries() {
        let cache = BoundedTtlCache::new(Config::new(100, Duration::from_secs(3600))).unwrap();

        cache.put("long_lived".to_string(), "value".to_string());
        tokio::time::sleep(Duration::from_secs(1800)).await;

        assert_eq!(cache.get("long_lived"), Some("value".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaper_wakes_after_idle() {
        let cache = BoundedTtlCache::new(Config::new(100, Duration::from_secs(1))).unwrap();

        // Let the reaper park with nothing armed
        tokio::time::sleep(Duration::from_secs(10)).await;

        cache.put(1u32, 1u32);
        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(cache.stored_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaper_stops_on_shutdown() {
        let cache = BoundedTtlCache::new(Config::new(100, Duration::from_secs(1))).unwrap();

        cache.put(1u32, "kept");
        cache.shutdown();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(cache.get(&1), Some("kept"));
    }
}
