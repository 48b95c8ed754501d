//! Prometheus metrics for the read-through cache.
//!
//! Every series carries a `resource` label (`call-service`, `geofence`, ...)
//! taken from the cache key.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Metric names for the cache layer.
pub mod names {
    /// Lookups answered from the cache.
    pub const CACHE_HITS_TOTAL: &str = "cadgate_cache_hits_total";
    /// Lookups that had to go upstream.
    pub const CACHE_MISSES_TOTAL: &str = "cadgate_cache_misses_total";
    /// Values written to the cache.
    pub const CACHE_STORES_TOTAL: &str = "cadgate_cache_stores_total";
    /// Entries removed by invalidation.
    pub const CACHE_EVICTIONS_TOTAL: &str = "cadgate_cache_evictions_total";
    /// Upstream fetches that returned no data (non-2xx).
    pub const UPSTREAM_EMPTY_TOTAL: &str = "cadgate_upstream_empty_total";
    /// Upstream fetch duration in seconds.
    pub const UPSTREAM_FETCH_SECONDS: &str = "cadgate_upstream_fetch_seconds";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        names::CACHE_HITS_TOTAL,
        "Total number of lookups answered from the cache"
    );
    describe_counter!(
        names::CACHE_MISSES_TOTAL,
        "Total number of lookups that fetched from upstream"
    );
    describe_counter!(
        names::CACHE_STORES_TOTAL,
        "Total number of values written to the cache"
    );
    describe_counter!(
        names::CACHE_EVICTIONS_TOTAL,
        "Total number of cache entries removed by invalidation"
    );
    describe_counter!(
        names::UPSTREAM_EMPTY_TOTAL,
        "Total number of upstream fetches that returned no data"
    );
    describe_histogram!(
        names::UPSTREAM_FETCH_SECONDS,
        "Upstream fetch duration in seconds"
    );
}

/// Cache metrics recorder.
#[derive(Clone, Copy)]
pub struct CacheMetrics;

impl CacheMetrics {
    pub fn hit(resource: &str) {
        counter!(names::CACHE_HITS_TOTAL, "resource" => resource.to_string()).increment(1);
    }

    pub fn miss(resource: &str) {
        counter!(names::CACHE_MISSES_TOTAL, "resource" => resource.to_string()).increment(1);
    }

    pub fn stored(resource: &str) {
        counter!(names::CACHE_STORES_TOTAL, "resource" => resource.to_string()).increment(1);
    }

    pub fn evicted(resource: &str) {
        counter!(names::CACHE_EVICTIONS_TOTAL, "resource" => resource.to_string()).increment(1);
    }

    pub fn upstream_empty(resource: &str) {
        counter!(names::UPSTREAM_EMPTY_TOTAL, "resource" => resource.to_string()).increment(1);
    }

    /// Record how long an upstream fetch took.
    pub fn upstream_fetch(resource: &str, duration: Duration) {
        histogram!(names::UPSTREAM_FETCH_SECONDS, "resource" => resource.to_string())
            .record(duration.as_secs_f64());
    }
}

/// Resource label for a cache key: its second `:`-separated segment.
#[must_use]
pub fn resource_of(key: &str) -> &str {
    key.split(':').nth(1).unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_of() {
        assert_eq!(resource_of("cad:call-service:pm:42:abc"), "call-service");
        assert_eq!(resource_of("cad:geofence:pm:7"), "geofence");
        assert_eq!(resource_of("plain"), "unknown");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        register_metrics();
        CacheMetrics::hit("geofence");
        CacheMetrics::upstream_fetch("geofence", Duration::from_millis(5));
    }
}
