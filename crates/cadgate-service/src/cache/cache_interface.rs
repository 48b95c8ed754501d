//! Cache interface trait for abstracted caching operations.

use cadgate_core::CadgateResult;
use async_trait::async_trait;
use std::time::Duration;

/// Cache port used by the read-through engine.
///
/// Every operation is atomic for a single key. Values are JSON strings so the
/// trait stays dyn-compatible.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheInterface: Send + Sync {
    /// Get a raw JSON value from the cache.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    async fn get_raw(&self, key: &str) -> CadgateResult<Option<String>>;

    /// Set a raw JSON value in the cache with a TTL.
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> CadgateResult<()>;

    /// Delete a value from the cache.
    ///
    /// Returns `true` if the key existed and was deleted.
    async fn delete(&self, key: &str) -> CadgateResult<bool>;

    /// Add `member` to the set stored at `key` and reset the set's TTL.
    async fn add_member(&self, key: &str, member: &str, ttl: Duration) -> CadgateResult<()>;

    /// Members of the set stored at `key`. Empty if the key doesn't exist or
    /// has expired.
    async fn members(&self, key: &str) -> CadgateResult<Vec<String>>;

    /// Remove `member` from the set stored at `key`. An emptied set is
    /// deleted.
    ///
    /// Returns `true` if the member was present.
    async fn remove_member(&self, key: &str, member: &str) -> CadgateResult<bool>;
}

/// Extension trait with typed methods for convenience.
#[async_trait]
pub trait CacheExt: CacheInterface {
    /// Get a typed value from the cache.
    async fn get<T: serde::de::DeserializeOwned + Send>(&self, key: &str) -> CadgateResult<Option<T>> {
        match self.get_raw(key).await? {
            Some(json) => {
                let value: T = serde_json::from_str(&json)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Set a typed value in the cache.
    async fn set<T: serde::Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> CadgateResult<()> {
        let json = serde_json::to_string(value)?;
        self.set_raw(key, &json, ttl).await
    }
}

// Blanket implementation for all CacheInterface implementations
impl<T: CacheInterface + ?Sized> CacheExt for T {}
