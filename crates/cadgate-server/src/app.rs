//! Application wiring.

use crate::startup::{print_banner, print_startup_info, shutdown_signal};
use axum::{routing::get, Router};
use cadgate_client::HttpCadClient;
use cadgate_config::{AppConfig, CacheBackend, CacheConfig};
use cadgate_core::{CadgateError, CadgateResult};
use cadgate_rest::{create_router, AppState};
use cadgate_service::{
    metrics::register_metrics, CacheInterface, CadServiceImpl, EventPublisher, InMemoryCache,
    ReadThroughCache, RedisCacheService,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// A fully wired gateway, ready to serve.
pub struct App {
    config: AppConfig,
    router: Router,
    sweeper: Option<JoinHandle<()>>,
}

impl App {
    /// Wires the cache store, CAD client, service and router from `config`.
    ///
    /// Must be called inside a tokio runtime: the in-memory store's sweeper
    /// is spawned here.
    pub fn build(config: AppConfig) -> CadgateResult<Self> {
        let (store, sweeper) = build_store(&config.cache)?;

        let cache = if config.cache.coalesce_misses {
            ReadThroughCache::with_coalescing(store.clone())
        } else {
            ReadThroughCache::new(store.clone())
        };

        let api = Arc::new(HttpCadClient::new(&config.cad)?);
        let events = EventPublisher::default();
        let service = CadServiceImpl::new(api, cache, events.clone());

        let state = AppState::new(Arc::new(service), store, events)
            .with_webhook_secret(config.webhooks.secret.clone())
            .with_maps(config.maps.clone());

        let mut router = create_router(state, &config.server);

        if config.observability.metrics_enabled {
            let handle = install_metrics_recorder()?;
            router = router.route(
                &config.observability.metrics_path,
                get(move || async move { handle.render() }),
            );
            info!(path = %config.observability.metrics_path, "Prometheus metrics enabled");
        }

        Ok(Self {
            config,
            router,
            sweeper,
        })
    }

    /// The assembled router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Binds the configured address and serves until a shutdown signal.
    pub async fn serve(self) -> CadgateResult<()> {
        let addr = self.config.server.addr();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| CadgateError::Internal(format!("Failed to bind {}: {}", addr, e)))?;

        print_banner();
        print_startup_info(&self.config);

        let result = axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| CadgateError::Internal(format!("Server error: {}", e)));

        if let Some(sweeper) = self.sweeper {
            sweeper.abort();
        }

        result?;
        info!("Server shutdown complete");
        Ok(())
    }
}

type StoreParts = (Arc<dyn CacheInterface>, Option<JoinHandle<()>>);

fn build_store(config: &CacheConfig) -> CadgateResult<StoreParts> {
    info!(backend = %config.backend, coalesce = config.coalesce_misses, "Creating cache store");

    match config.backend {
        CacheBackend::Memory => {
            let cache = Arc::new(InMemoryCache::new());
            let sweeper = (config.sweep_interval_secs > 0)
                .then(|| spawn_sweeper(cache.clone(), config.sweep_interval()));
            let store: Arc<dyn CacheInterface> = cache;
            Ok((store, sweeper))
        }
        CacheBackend::Redis => {
            let url = config.redis_url.as_deref().ok_or_else(|| {
                CadgateError::Configuration("cache.redis_url is required for the redis backend".to_string())
            })?;
            let store: Arc<dyn CacheInterface> =
                Arc::new(RedisCacheService::connect(url, config.redis_pool_size)?);
            Ok((store, None))
        }
    }
}

/// Purges expired entries from `cache` every `every`.
pub fn spawn_sweeper(cache: Arc<InMemoryCache>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let purged = cache.purge_expired();
            debug!(purged, remaining = cache.len(), "Cache sweep finished");
        }
    })
}

fn install_metrics_recorder() -> CadgateResult<PrometheusHandle> {
    if let Some(handle) = METRICS_HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| CadgateError::Internal(format!("Failed to install metrics recorder: {}", e)))?;
    register_metrics();
    Ok(METRICS_HANDLE.get_or_init(|| handle).clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_build_with_defaults_serves_health_and_metrics() {
        let app = App::build(AppConfig::default()).unwrap();

        let response = app
            .router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .router()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(std::str::from_utf8(&body).is_ok());
    }

    #[tokio::test]
    async fn test_metrics_route_absent_when_disabled() {
        let mut config = AppConfig::default();
        config.observability.metrics_enabled = false;
        let app = App::build(config).unwrap();

        let response = app
            .router()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_redis_backend_without_url_is_configuration_error() {
        let config = CacheConfig {
            backend: CacheBackend::Redis,
            redis_url: None,
            ..CacheConfig::default()
        };
        let err = build_store(&config).err().unwrap();
        assert!(matches!(err, CadgateError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_zero_sweep_interval_disables_sweeper() {
        let config = CacheConfig {
            sweep_interval_secs: 0,
            ..CacheConfig::default()
        };
        let (_, sweeper) = build_store(&config).unwrap();
        assert!(sweeper.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_purges_expired_entries() {
        let cache = Arc::new(InMemoryCache::new());
        cache
            .set_raw("cad:geofence:pm:7", "[]", Duration::from_secs(1))
            .await
            .unwrap();
        cache
            .set_raw("cad:geofence:pm:8", "[]", Duration::from_secs(600))
            .await
            .unwrap();

        let sweeper = spawn_sweeper(cache.clone(), Duration::from_secs(5));
        tokio::time::sleep(Duration::from_secs(6)).await;

        assert_eq!(cache.len(), 1);
        sweeper.abort();
    }
}
