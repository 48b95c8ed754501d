//! Cache invalidation webhooks called by the CAD.

use crate::{
    dto::{CacheWebhookResponse, ClearCallServiceRequest, ClearGeofenceRequest, RefreshCallServiceRequest},
    extractors::ValidatedJson,
    responses::ApiResult,
    state::AppState,
};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use cadgate_core::{CadgateError, CadgateResult, GuestShare, Tenant};
use tracing::{error, info};

type WebhookReply = (StatusCode, Json<CacheWebhookResponse>);

/// Creates the webhook router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/call-service/clear", post(clear_call_service_cache))
        .route("/call-service/refresh", post(refresh_call_service_cache))
        .route("/geofence/clear", post(clear_geofence_cache))
}

/// 200 with the success body, or 500 with `base` marked as failed.
fn reply(
    result: CadgateResult<CacheWebhookResponse>,
    base: CacheWebhookResponse,
    failure: &str,
) -> WebhookReply {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)),
        Err(e) => {
            error!(tenant = %base.tenant, error = %e, "{}", failure);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(base.failed(failure, e.to_string())),
            )
        }
    }
}

/// Evict a call service entry by guest share, by call service GUID, or both.
#[utoipa::path(
    post,
    path = "/webhooks/cad/cache/call-service/clear",
    tag = "webhooks",
    request_body = ClearCallServiceRequest,
    params(("X-Webhook-Secret" = Option<String>, Header, description = "Shared webhook secret, when configured")),
    responses(
        (status = 200, description = "Cache cleared", body = CacheWebhookResponse),
        (status = 401, description = "Missing or invalid webhook secret", body = cadgate_core::ErrorResponse),
        (status = 422, description = "Neither guest share nor GUID given", body = cadgate_core::ErrorResponse),
        (status = 500, description = "Cache could not be cleared", body = CacheWebhookResponse)
    )
)]
pub async fn clear_call_service_cache(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ClearCallServiceRequest>,
) -> ApiResult<WebhookReply> {
    let tenant = Tenant::parse(&request.tenant)?;
    let share = request
        .share()
        .map(|(id, token)| GuestShare::new(id, token))
        .transpose()?;
    let guid = request.call_service_guid.clone();

    let base = CacheWebhookResponse::new(CacheWebhookResponse::CLEARED, tenant.as_str())
        .guest_share_id(request.guest_share_id)
        .call_service_guid(guid.clone());

    let result = async {
        if let Some(share) = &share {
            state.cad_service.clear_call_service_cache(&tenant, share).await?;
        }
        if let Some(guid) = guid.as_deref() {
            state
                .cad_service
                .clear_call_service_cache_by_guid(&tenant, guid)
                .await?;
        }
        info!(
            tenant = %tenant,
            guest_share_id = ?request.guest_share_id,
            call_service_guid = ?guid,
            "Call service cache cleared via webhook"
        );
        Ok::<_, CadgateError>(base.clone())
    }
    .await;

    Ok(reply(result, base, CacheWebhookResponse::CLEAR_FAILED))
}

/// Evict a region's geofences.
#[utoipa::path(
    post,
    path = "/webhooks/cad/cache/geofence/clear",
    tag = "webhooks",
    request_body = ClearGeofenceRequest,
    params(("X-Webhook-Secret" = Option<String>, Header, description = "Shared webhook secret, when configured")),
    responses(
        (status = 200, description = "Cache cleared", body = CacheWebhookResponse),
        (status = 401, description = "Missing or invalid webhook secret", body = cadgate_core::ErrorResponse),
        (status = 500, description = "Cache could not be cleared", body = CacheWebhookResponse)
    )
)]
pub async fn clear_geofence_cache(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ClearGeofenceRequest>,
) -> ApiResult<WebhookReply> {
    let tenant = Tenant::parse(&request.tenant)?;
    let base = CacheWebhookResponse::new(CacheWebhookResponse::CLEARED, tenant.as_str())
        .region_id(request.region_id);

    let result = state
        .cad_service
        .clear_geofence_cache(&tenant, request.region_id)
        .await
        .map(|()| base.clone());

    Ok(reply(result, base, CacheWebhookResponse::CLEAR_FAILED))
}

/// Replace a guest's cached call service with a fresh upstream fetch.
#[utoipa::path(
    post,
    path = "/webhooks/cad/cache/call-service/refresh",
    tag = "webhooks",
    request_body = RefreshCallServiceRequest,
    params(("X-Webhook-Secret" = Option<String>, Header, description = "Shared webhook secret, when configured")),
    responses(
        (status = 200, description = "Cache refreshed", body = CacheWebhookResponse),
        (status = 401, description = "Missing or invalid webhook secret", body = cadgate_core::ErrorResponse),
        (status = 500, description = "Cache could not be refreshed", body = CacheWebhookResponse)
    )
)]
pub async fn refresh_call_service_cache(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RefreshCallServiceRequest>,
) -> ApiResult<WebhookReply> {
    let tenant = Tenant::parse(&request.tenant)?;
    let share = GuestShare::new(request.guest_share_id, request.token)?;
    let base = CacheWebhookResponse::new(CacheWebhookResponse::REFRESHED, tenant.as_str())
        .guest_share_id(Some(share.id))
        .call_service_guid(Some(request.call_service_guid.clone()));

    let result = state
        .cad_service
        .refresh_call_service_cache(&tenant, &share, &request.call_service_guid)
        .await
        .map(|record| base.clone().found(record.is_some()));

    Ok(reply(result, base, CacheWebhookResponse::REFRESH_FAILED))
}
