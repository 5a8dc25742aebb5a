// Policy cache
//
// Time-based cache for slowly changing policy tables (rate plans, special
// events). Reads take the shared lock; a stale entry is reloaded under the
// write lock with a second staleness check so concurrent misses load once.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::db::StorageError;
use crate::metrics::BookingMetrics;

struct CacheEntry<T> {
    value: Arc<T>,
    loaded_at: Instant,
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.loaded_at.elapsed() < ttl
    }
}

pub struct PolicyCache<T> {
    name: &'static str,
    entry: RwLock<Option<CacheEntry<T>>>,
    ttl: Duration,
    metrics: Option<BookingMetrics>,
}

impl<T> PolicyCache<T> {
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            entry: RwLock::new(None),
            ttl,
            metrics: None,
        }
    }

    pub fn with_metrics(name: &'static str, ttl: Duration, metrics: BookingMetrics) -> Self {
        Self {
            metrics: Some(metrics),
            ..Self::new(name, ttl)
        }
    }

    fn record_hit(&self) {
        if let Some(ref metrics) = self.metrics {
            metrics.record_cache_hit();
        }
    }

    fn record_miss(&self) {
        if let Some(ref metrics) = self.metrics {
            metrics.record_cache_miss();
        }
    }

    /// Return the cached value, reloading it with `load` when missing or stale.
    ///
    /// A failed load leaves the previous entry untouched and propagates the error;
    /// a stale value is never served in place of a storage failure.
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<Arc<T>, StorageError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, StorageError>>,
    {
        {
            let entry = self.entry.read().await;
            if let Some(cached) = entry.as_ref().filter(|cached| cached.is_fresh(self.ttl)) {
                self.record_hit();
                return Ok(Arc::clone(&cached.value));
            }
        }

        self.record_miss();
        let mut entry = self.entry.write().await;

        // Another task may have refreshed while we waited for the write lock
        if let Some(cached) = entry.as_ref().filter(|cached| cached.is_fresh(self.ttl)) {
            return Ok(Arc::clone(&cached.value));
        }

        tracing::debug!("Reloading {} cache", self.name);
        let value = Arc::new(load().await?);
        *entry = Some(CacheEntry {
            value: Arc::clone(&value),
            loaded_at: Instant::now(),
        });
        Ok(value)
    }

    /// Force the next read to reload
    pub async fn invalidate(&self) {
        tracing::debug!("Invalidating {} cache", self.name);
        *self.entry.write().await = None;
    }
}
