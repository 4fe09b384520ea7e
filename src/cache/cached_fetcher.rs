use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::TtlCache;

/// Wraps a single async loader behind a `TtlCache<T>` and keeps it warm with
/// a background refresh task. `shutdown()` flips an atomic flag the task
/// polls once per interval tick, so it exits within one tick (bounded above
/// by the refresh interval, matching the engine's shutdown grace window).
pub struct CachedFetcher<T> {
    key: String,
    cache: Arc<TtlCache<T>>,
    shutdown: Arc<AtomicBool>,
}

impl<T> CachedFetcher<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Spawn the background refresh loop. `loader` is cloned into the task
    /// and called on a fixed `interval`; failures are logged and the stale
    /// cache entry (if any) is left in place.
    pub fn spawn<F, Fut>(
        key: impl Into<String>,
        ttl: Duration,
        max_size: usize,
        interval: Duration,
        loader: F,
    ) -> (Arc<Self>, tokio::task::JoinHandle<()>)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send,
    {
        let key = key.into();
        let cache = Arc::new(TtlCache::new(ttl, max_size));
        let shutdown = Arc::new(AtomicBool::new(false));

        let fetcher = Arc::new(Self {
            key: key.clone(),
            cache: cache.clone(),
            shutdown: shutdown.clone(),
        });

        let task_key = key;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if shutdown.load(Ordering::Relaxed) {
                    debug!(key = %task_key, "cached fetcher refresh loop exiting");
                    break;
                }
                match loader().await {
                    Ok(value) => cache.set(task_key.clone(), value),
                    Err(err) => warn!(key = %task_key, error = %err, "background refresh failed, keeping stale entry"),
                }
            }
        });

        (fetcher, handle)
    }

    /// Latest cached value, if the background loop has populated one yet.
    pub fn get(&self) -> Option<T> {
        self.cache.get(&self.key)
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn stats(&self) -> super::CacheStats {
        self.cache.stats()
    }
}
