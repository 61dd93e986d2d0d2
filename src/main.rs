//! Hotcache demo
//!
//! Runs a short read-through workload over an in-memory food catalog to show
//! LRU eviction and TTL expiry in the logs.
//!
//! Set `RUST_LOG=hotcache=debug` to see individual evictions and expiries.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hotcache::{BoundedTtlCache, Config};

/// Catalog row served through the cache.
#[derive(Debug)]
struct Food {
    id: u64,
    name: String,
}

/// Stand-in for the relational store behind the cache.
struct Catalog {
    foods: HashMap<u64, Arc<Food>>,
}

impl Catalog {
    fn seeded() -> Self {
        let names = ["Borscht", "Pelmeni", "Syrniki", "Olivier", "Blini", "Kvass"];
        let foods = names
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let id = idx as u64 + 1;
                (
                    id,
                    Arc::new(Food {
                        id,
                        name: name.to_string(),
                    }),
                )
            })
            .collect();
        Self { foods }
    }

    async fn find_by_id(&self, id: u64) -> anyhow::Result<Arc<Food>> {
        // Simulated query latency
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.foods
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow!("Food with id {} not found", id))
    }
}

/// Main entry point for the demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache and its expiry reaper
/// 4. Run the read-through workload
/// 5. Shut the cache down
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hotcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_size={}, max_age={}s",
        config.max_size,
        config.max_age.as_secs()
    );

    let cache: BoundedTtlCache<u64, Arc<Food>> =
        BoundedTtlCache::new(config).context("failed to build food cache")?;
    let catalog = Catalog::seeded();

    // Repeated ids hit the cache; 99 misses in both cache and catalog
    for id in [1, 2, 1, 3, 2, 99, 1] {
        let lookup = cache
            .get_or_try_load(id, || catalog.find_by_id(id))
            .await;
        match lookup {
            Ok(food) => info!(id = food.id, name = %food.name, "Lookup served"),
            Err(err) => info!(id, error = %err, "Lookup failed"),
        }
    }
    info!(resident = cache.size(), "Workload finished");

    cache.shutdown();
    info!("Demo complete");

    Ok(())
}
