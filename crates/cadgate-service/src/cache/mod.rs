//! Caching infrastructure for the service layer.
//!
//! The cache port ([`CacheInterface`]) has an in-memory and a Redis
//! implementation; which one backs the process is decided at startup.
//! [`ReadThroughCache`] layers lookup, population, eviction and refresh on
//! top of whichever store it is given.

mod cache_interface;
pub mod cache_keys;
mod memory_cache;
pub mod metrics;
mod read_through;
mod redis_cache;

#[cfg(test)]
pub use cache_interface::MockCacheInterface;
pub use cache_interface::{CacheExt, CacheInterface};
pub use memory_cache::InMemoryCache;
pub use read_through::ReadThroughCache;
pub use redis_cache::RedisCacheService;
