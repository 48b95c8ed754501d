//! Application state for Axum handlers.

use cadgate_config::MapsConfig;
use cadgate_service::{CacheInterface, CadService, EventPublisher, GuestLoggerService};
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub cad_service: Arc<dyn CadService>,
    /// Store behind the service's cache, probed by the readiness check.
    pub cache_store: Arc<dyn CacheInterface>,
    pub guest_logger: GuestLoggerService,
    pub events: EventPublisher,
    /// Shared secret webhook callers must present, if configured.
    pub webhook_secret: Option<Arc<str>>,
    pub maps: Arc<MapsConfig>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        cad_service: Arc<dyn CadService>,
        cache_store: Arc<dyn CacheInterface>,
        events: EventPublisher,
    ) -> Self {
        Self {
            cad_service,
            cache_store,
            guest_logger: GuestLoggerService::new(),
            events,
            webhook_secret: None,
            maps: Arc::new(MapsConfig::default()),
        }
    }

    /// Requires webhook callers to send `secret`. Empty secrets are ignored.
    #[must_use]
    pub fn with_webhook_secret(mut self, secret: Option<String>) -> Self {
        self.webhook_secret = secret.filter(|s| !s.is_empty()).map(Arc::from);
        self
    }

    /// Sets the map settings handed to the guest view.
    #[must_use]
    pub fn with_maps(mut self, maps: MapsConfig) -> Self {
        self.maps = Arc::new(maps);
        self
    }
}
