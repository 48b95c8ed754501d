//! Read-through caching over a [`CacheInterface`] store.

use super::metrics::{resource_of, CacheMetrics};
use super::{CacheExt, CacheInterface};
use cadgate_core::CadgateResult;
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

type InflightMap = DashMap<String, Arc<Mutex<()>>>;

/// Read-through cache.
///
/// A lookup returns the cached value when present; otherwise it runs the
/// supplied fetch and stores the result. Only `Some` results are stored, so a
/// declined upstream request is retried on the next lookup. Errors from the
/// store or the fetch are returned as-is and never cached.
///
/// With miss coalescing enabled, concurrent misses on one key share a single
/// upstream fetch.
#[derive(Clone)]
pub struct ReadThroughCache {
    store: Arc<dyn CacheInterface>,
    inflight: Option<Arc<InflightMap>>,
}

impl ReadThroughCache {
    /// Create a read-through cache without miss coalescing.
    #[must_use]
    pub fn new(store: Arc<dyn CacheInterface>) -> Self {
        Self {
            store,
            inflight: None,
        }
    }

    /// Create a read-through cache that coalesces concurrent misses per key.
    #[must_use]
    pub fn with_coalescing(store: Arc<dyn CacheInterface>) -> Self {
        Self {
            store,
            inflight: Some(Arc::new(DashMap::new())),
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CacheInterface> {
        &self.store
    }

    /// Return the cached value for `key`, or fetch, store and return it.
    ///
    /// `fetch` yields `Ok(None)` when the upstream declined; that outcome is
    /// passed through without touching the cache.
    pub async fn fetch_with_cache<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> CadgateResult<Option<T>>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = CadgateResult<Option<T>>> + Send,
    {
        if let Some(hit) = self.get(key).await? {
            return Ok(Some(hit));
        }

        let Some(_gate) = self.gate(key).await else {
            return self.load(key, ttl, fetch).await;
        };

        // Another caller may have filled the entry while we waited.
        if let Some(hit) = self.get(key).await? {
            return Ok(Some(hit));
        }

        self.load(key, ttl, fetch).await
    }

    /// Read a cached value without falling back to a fetch.
    ///
    /// An entry that no longer decodes as `T` is discarded and reported as
    /// absent.
    pub async fn get<T>(&self, key: &str) -> CadgateResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        let Some(raw) = self.store.get_raw(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                CacheMetrics::hit(resource_of(key));
                Ok(Some(value))
            }
            Err(e) => {
                warn!(key, error = %e, "Discarding unreadable cache entry");
                self.store.delete(key).await?;
                Ok(None)
            }
        }
    }

    /// Store `value` under `key` for `ttl`.
    pub async fn populate<T>(&self, key: &str, value: &T, ttl: Duration) -> CadgateResult<()>
    where
        T: Serialize + Send + Sync,
    {
        self.store.set(key, value, ttl).await?;
        CacheMetrics::stored(resource_of(key));
        Ok(())
    }

    /// Remove `key`. Returns whether an entry was present; absent keys are
    /// not an error.
    pub async fn evict(&self, key: &str) -> CadgateResult<bool> {
        let removed = self.store.delete(key).await?;
        if removed {
            CacheMetrics::evicted(resource_of(key));
        }
        debug!(key, removed, "Evicted cache entry");
        Ok(removed)
    }

    /// Evict `key`, then fetch and store a fresh value unconditionally.
    ///
    /// When the fetch yields `None` the key stays evicted.
    pub async fn refresh<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> CadgateResult<Option<T>>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = CadgateResult<Option<T>>> + Send,
    {
        let _gate = self.gate(key).await;
        self.evict(key).await?;
        self.load(key, ttl, fetch).await
    }

    async fn load<T, F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> CadgateResult<Option<T>>
    where
        T: Serialize + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = CadgateResult<Option<T>>> + Send,
    {
        let resource = resource_of(key);
        CacheMetrics::miss(resource);

        let started = Instant::now();
        let fetched = fetch().await;
        CacheMetrics::upstream_fetch(resource, started.elapsed());

        match fetched? {
            Some(value) => {
                self.populate(key, &value, ttl).await?;
                Ok(Some(value))
            }
            None => {
                CacheMetrics::upstream_empty(resource);
                debug!(key, "Upstream returned no data; not caching");
                Ok(None)
            }
        }
    }

    /// Serialize loads of `key` when coalescing is enabled.
    async fn gate(&self, key: &str) -> Option<InflightGuard> {
        let inflight = self.inflight.as_ref()?;
        let lock = inflight.entry(key.to_string()).or_default().clone();
        let guard = lock.lock_owned().await;
        Some(InflightGuard {
            guard: Some(guard),
            inflight: Arc::clone(inflight),
            key: key.to_string(),
        })
    }

    #[cfg(test)]
    fn inflight_len(&self) -> usize {
        self.inflight.as_ref().map_or(0, |m| m.len())
    }
}

/// Holds the per-key lock; drops the map entry once nobody else waits on it.
struct InflightGuard {
    guard: Option<OwnedMutexGuard<()>>,
    inflight: Arc<InflightMap>,
    key: String,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.guard.take();
        self.inflight
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
