//! OpenAPI documentation.

use crate::controllers::{HealthResponse, ReadinessResponse};
use crate::dto::{
    CacheWebhookResponse, ClearCallServiceRequest, ClearGeofenceRequest, GuestLogRequest,
    GuestLogResponse, GuestView, LocationRequest, LocationResponse, MapView,
    RefreshCallServiceRequest,
};
use cadgate_core::{ErrorResponse, FieldError};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// OpenAPI documentation for the CAD guest gateway.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "CAD Guest Gateway",
        version = "1.0.0",
        description = "Guest view and cache invalidation webhooks in front of the CAD API"
    ),
    paths(
        crate::controllers::guest_controller::show,
        crate::controllers::guest_api_controller::update_location,
        crate::controllers::guest_api_controller::record_log,
        crate::controllers::guest_api_controller::events,
        crate::controllers::webhook_controller::clear_call_service_cache,
        crate::controllers::webhook_controller::refresh_call_service_cache,
        crate::controllers::webhook_controller::clear_geofence_cache,
        crate::controllers::health_controller::health_check,
        crate::controllers::health_controller::readiness_check,
        crate::controllers::health_controller::liveness_check,
    ),
    components(
        schemas(
            ErrorResponse,
            FieldError,
            LocationRequest,
            LocationResponse,
            GuestLogRequest,
            GuestLogResponse,
            GuestView,
            MapView,
            ClearCallServiceRequest,
            ClearGeofenceRequest,
            RefreshCallServiceRequest,
            CacheWebhookResponse,
            HealthResponse,
            ReadinessResponse,
        )
    ),
    modifiers(&WebhookSecretAddon),
    tags(
        (name = "guest", description = "Guest view and guest page endpoints"),
        (name = "webhooks", description = "Cache invalidation called by the CAD"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;

/// Documents the shared webhook secret header.
struct WebhookSecretAddon;

impl Modify for WebhookSecretAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "webhook_secret",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "X-Webhook-Secret",
                    "Shared secret for cache webhooks",
                ))),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_webhook_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/webhooks/cad/cache/call-service/clear"));
        assert!(doc.paths.paths.contains_key("/webhooks/cad/cache/geofence/clear"));
        assert!(doc.paths.paths.contains_key("/api/guest/location"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("webhook_secret"));
    }
}
