//! Redis-based cache implementation.

use super::CacheInterface;
use async_trait::async_trait;
use cadgate_core::{CadgateError, CadgateResult};
use deadpool_redis::{
    redis::{self, AsyncCommands},
    Config, Pool, PoolConfig, Runtime,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Redis-based cache service.
///
/// Lets several gateway processes share one cache, so a webhook handled by
/// any of them invalidates for all.
#[derive(Clone)]
pub struct RedisCacheService {
    /// Redis connection pool.
    pool: Arc<Pool>,
}

impl RedisCacheService {
    /// Create a new Redis cache service.
    #[must_use]
    pub fn new(pool: Arc<Pool>) -> Self {
        Self { pool }
    }

    /// Build a connection pool for `url` and wrap it.
    ///
    /// Connections are established lazily, so an unreachable server surfaces
    /// on first use rather than here.
    pub fn connect(url: &str, pool_size: usize) -> CadgateResult<Self> {
        let mut config = Config::from_url(url);
        config.pool = Some(PoolConfig::new(pool_size.max(1)));

        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| CadgateError::Cache(format!("Failed to create Redis pool: {}", e)))?;

        info!(pool_size, "Redis cache pool created");
        Ok(Self::new(Arc::new(pool)))
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> CadgateResult<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| CadgateError::Cache(format!("Failed to get Redis connection: {}", e)))
    }
}

#[async_trait]
impl CacheInterface for RedisCacheService {
    async fn get_raw(&self, key: &str) -> CadgateResult<Option<String>> {
        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| CadgateError::Cache(format!("Failed to get key '{}': {}", key, e)))?;

        match &value {
            Some(_) => debug!("Cache hit for key '{}'", key),
            None => debug!("Cache miss for key '{}'", key),
        }

        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> CadgateResult<()> {
        let mut conn = self.get_conn().await?;
        let ttl_secs = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .map_err(|e| CadgateError::Cache(format!("Failed to set key '{}': {}", key, e)))?;

        debug!("Cached key '{}' with TTL {}s", key, ttl_secs);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CadgateResult<bool> {
        let mut conn = self.get_conn().await?;
        let deleted: i64 = conn
            .del(key)
            .await
            .map_err(|e| CadgateError::Cache(format!("Failed to delete key '{}': {}", key, e)))?;

        debug!("Deleted key '{}': {}", key, deleted > 0);
        Ok(deleted > 0)
    }

    async fn add_member(&self, key: &str, member: &str, ttl: Duration) -> CadgateResult<()> {
        let mut conn = self.get_conn().await?;
        let ttl_secs = i64::try_from(ttl.as_secs().max(1)).unwrap_or(i64::MAX);

        let _: () = redis::pipe()
            .atomic()
            .sadd(key, member)
            .ignore()
            .expire(key, ttl_secs)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| CadgateError::Cache(format!("Failed to add to set '{}': {}", key, e)))?;

        debug!("Added member to set '{}' with TTL {}s", key, ttl_secs);
        Ok(())
    }

    async fn members(&self, key: &str) -> CadgateResult<Vec<String>> {
        let mut conn = self.get_conn().await?;
        conn.smembers(key)
            .await
            .map_err(|e| CadgateError::Cache(format!("Failed to read set '{}': {}", key, e)))
    }

    async fn remove_member(&self, key: &str, member: &str) -> CadgateResult<bool> {
        let mut conn = self.get_conn().await?;
        // Redis drops a set once its last member is removed.
        let removed: i64 = conn
            .srem(key, member)
            .await
            .map_err(|e| CadgateError::Cache(format!("Failed to remove from set '{}': {}", key, e)))?;

        debug!("Removed member from set '{}': {}", key, removed > 0);
        Ok(removed > 0)
    }
}
