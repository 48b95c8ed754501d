//! Main application router.

use crate::{
    controllers::{guest_api_controller, guest_controller, health_controller, webhook_controller},
    middleware::{logging_middleware, webhook_secret_middleware},
    openapi::ApiDoc,
    state::AppState,
};
use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware, Router,
};
use cadgate_config::ServerConfig;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Creates the main application router.
pub fn create_router(state: AppState, server_config: &ServerConfig) -> Router {
    let cors = create_cors_layer(server_config);

    let webhooks = webhook_controller::router()
        .layer(middleware::from_fn_with_state(
            state.clone(),
            webhook_secret_middleware,
        ))
        .with_state(state.clone());

    let router = Router::new()
        .merge(health_controller::router().with_state(state.clone()))
        .merge(guest_controller::router().with_state(state.clone()))
        .nest("/api/guest", guest_api_controller::router().with_state(state.clone()))
        .nest("/webhooks/cad/cache", webhooks)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TimeoutLayer::new(server_config.request_timeout()))
        // Span fields stay off the query string, which carries guest tokens.
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            info_span!(
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
            )
        }))
        .layer(middleware::from_fn(logging_middleware));

    info!(
        webhook_secret = state.webhook_secret.is_some(),
        "Router created with guest, webhook and health endpoints and Swagger UI at /swagger-ui"
    );
    router
}

/// Creates a CORS layer based on server configuration.
fn create_cors_layer(server_config: &ServerConfig) -> CorsLayer {
    if !server_config.cors_enabled {
        return CorsLayer::new();
    }
    if server_config.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = server_config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
