use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

struct CacheEntry<T> {
    data: T,
    timestamp: DateTime<Utc>,
    hit_count: u64,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self, ttl: Duration) -> bool {
        let age = Utc::now() - self.timestamp;
        age.to_std().map(|age| age > ttl).unwrap_or(false)
    }
}

/// Hit/miss counters for a `TtlCache`. Cheap to clone for periodic reporting.
#[derive(Debug, Default, Clone, Copy)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Inner<T> {
    entries: HashMap<String, CacheEntry<T>>,
    stats: CacheStats,
}

/// Generic time-to-live cache guarded by a single lock.
///
/// `get_or_load` intentionally runs the loader outside the lock: two
/// concurrent misses for the same key may both run the loader and the
/// second write wins. The original Python implementation held one lock
/// across the whole load; this crate trades a rare redundant fetch for
/// never blocking unrelated keys on a slow network call.
pub struct TtlCache<T> {
    ttl: Duration,
    max_size: usize,
    inner: Mutex<Inner<T>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self {
            ttl,
            max_size,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                stats: CacheStats::default(),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let mut inner = self.inner.lock();
        let ttl = self.ttl;
        let expired = inner
            .entries
            .get(key)
            .map(|e| e.is_expired(ttl))
            .unwrap_or(false);
        if expired {
            inner.entries.remove(key);
            inner.stats.evictions += 1;
        }
        match inner.entries.get_mut(key) {
            Some(entry) => {
                entry.hit_count += 1;
                inner.stats.hits += 1;
                Some(entry.data.clone())
            }
            None => {
                inner.stats.misses += 1;
                None
            }
        }
    }

    pub fn set(&self, key: impl Into<String>, value: T) {
        let key = key.into();
        let mut inner = self.inner.lock();
        if inner.entries.len() >= self.max_size && !inner.entries.contains_key(&key) {
            if let Some(oldest_key) = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.timestamp)
                .map(|(k, _)| k.clone())
            {
                inner.entries.remove(&oldest_key);
                inner.stats.evictions += 1;
            }
        }
        inner.entries.insert(
            key,
            CacheEntry {
                data: value,
                timestamp: Utc::now(),
                hit_count: 0,
            },
        );
        inner.stats.sets += 1;
    }

    /// Return the cached value, or invoke `loader` (outside the lock) and
    /// cache its result. `force` bypasses a fresh cache hit.
    pub fn get_or_load(&self, key: &str, loader: impl FnOnce() -> T, force: bool) -> T {
        if !force {
            if let Some(value) = self.get(key) {
                return value;
            }
        }
        let value = loader();
        self.set(key.to_string(), value.clone());
        value
    }

    pub fn delete(&self, key: &str) -> bool {
        self.inner.lock().entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cleanup_expired(&self) -> usize {
        let mut inner = self.inner.lock();
        let ttl = self.ttl;
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired(ttl));
        before - inner.entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }

    pub fn reset_stats(&self) {
        self.inner.lock().stats = CacheStats::default();
    }
}
