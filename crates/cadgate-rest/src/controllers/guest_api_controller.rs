//! Guest API controller: location updates, browser logs and live updates.

use crate::{
    dto::{GuestEventsQuery, GuestLogRequest, GuestLogResponse, LocationRequest, LocationResponse},
    extractors::ValidatedJson,
    responses::{ApiResult, AppError},
    state::AppState,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use cadgate_core::{GuestShare, Tenant};
use cadgate_service::{GuestLogLevel, LocationUpdate};
use futures::Stream;
use std::collections::HashSet;
use std::convert::Infallible;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tracing::{debug, error};

/// Creates the guest API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/location", post(update_location))
        .route("/logger", post(record_log))
        .route("/events", get(events))
}

/// Forward the guest's position to the CAD.
#[utoipa::path(
    post,
    path = "/api/guest/location",
    tag = "guest",
    request_body = LocationRequest,
    responses(
        (status = 200, description = "Location forwarded", body = LocationResponse),
        (status = 422, description = "Invalid request", body = cadgate_core::ErrorResponse),
        (status = 500, description = "Location could not be forwarded", body = LocationResponse)
    )
)]
pub async fn update_location(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LocationRequest>,
) -> ApiResult<(StatusCode, Json<LocationResponse>)> {
    let tenant = Tenant::parse(&request.tenant)?;
    let share = GuestShare::new(request.guest_share_id, request.token)?;
    let update = LocationUpdate {
        latitude: request.latitude,
        longitude: request.longitude,
        accuracy: request.accuracy,
    };

    match state
        .cad_service
        .update_guest_location(&tenant, &share, update)
        .await
    {
        Ok(()) => Ok((StatusCode::OK, Json(LocationResponse::ok()))),
        Err(e) => {
            error!(
                tenant = %tenant,
                guest_share_id = share.id,
                token_hash = %share.token_hash(),
                error = %e,
                "Failed to update location"
            );
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(LocationResponse::failed(e.to_string())),
            ))
        }
    }
}

/// Record a log line from the guest page.
#[utoipa::path(
    post,
    path = "/api/guest/logger",
    tag = "guest",
    request_body = GuestLogRequest,
    responses(
        (status = 200, description = "Log recorded", body = GuestLogResponse),
        (status = 422, description = "Invalid request", body = cadgate_core::ErrorResponse)
    )
)]
pub async fn record_log(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<GuestLogRequest>,
) -> Json<GuestLogResponse> {
    state.guest_logger.log(
        GuestLogLevel::parse(&request.level),
        &request.message,
        request.context.as_ref(),
    );
    Json(GuestLogResponse::recorded())
}

/// Stream cache invalidation notifications relevant to one guest.
#[utoipa::path(
    get,
    path = "/api/guest/events",
    tag = "guest",
    params(GuestEventsQuery),
    responses(
        (status = 200, description = "Server-Sent Events stream of update notifications"),
        (status = 400, description = "Invalid tenant", body = cadgate_core::ErrorResponse)
    )
)]
pub async fn events(
    State(state): State<AppState>,
    Query(query): Query<GuestEventsQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let tenant = Tenant::parse(&query.tenant)?;
    let topics = guest_topics(&tenant, &query);
    debug!(tenant = %tenant, guest_share_id = query.id, ?topics, "Guest subscribed to events");

    let stream = BroadcastStream::new(state.events.subscribe()).filter_map(move |received| {
        // Lagged receivers skip what they missed.
        let event = received.ok()?;
        if !topics.contains(&event.channel()) {
            return None;
        }
        Event::default().event(event.name()).json_data(&event).ok().map(Ok)
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Channels a guest listens on.
fn guest_topics(tenant: &Tenant, query: &GuestEventsQuery) -> HashSet<String> {
    let mut topics = HashSet::new();
    topics.insert(format!("guest-share.updated.{}.{}", tenant, query.id));
    if let Some(region) = query.region {
        topics.insert(format!("geofences.updated.{}.{}", tenant, region));
    }
    if let Some(guid) = query.call_service_guid.as_deref().filter(|g| !g.is_empty()) {
        topics.insert(format!("call-service.updated.{}.{}", tenant, guid));
    }
    topics
}
