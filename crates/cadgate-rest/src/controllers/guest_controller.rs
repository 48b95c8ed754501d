//! Guest view controller.

use crate::{
    dto::{GuestView, GuestViewQuery, MapView},
    responses::{ApiResult, AppError},
    state::AppState,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use cadgate_core::{CadgateError, ErrorResponse, GuestShare, Tenant};
use tracing::{debug, error};

const GENERIC_FAILURE: &str = "An error occurred while processing your request.";

/// Creates the guest view router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(show))
}

/// Guest view: the guest's call service, its region's geofences and the map
/// settings.
#[utoipa::path(
    get,
    path = "/",
    tag = "guest",
    params(GuestViewQuery),
    responses(
        (status = 200, description = "Guest view", body = GuestView),
        (status = 404, description = "Missing or invalid guest parameters", body = ErrorResponse),
        (status = 500, description = "CAD data could not be loaded", body = ErrorResponse)
    )
)]
pub async fn show(
    State(state): State<AppState>,
    Query(query): Query<GuestViewQuery>,
) -> ApiResult<Response> {
    let (tenant, share) = parse_guest(query)?;

    match load_view(&state, tenant, share).await {
        Ok(view) => Ok(Json(view).into_response()),
        Err(e) => {
            error!(error = %e, "Failed to build guest view");
            let body = ErrorResponse {
                code: e.error_code().to_string(),
                message: GENERIC_FAILURE.to_string(),
                details: None,
            };
            Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response())
        }
    }
}

/// Any missing, empty or malformed parameter is reported as not found.
fn parse_guest(query: GuestViewQuery) -> Result<(Tenant, GuestShare), AppError> {
    let not_found = || AppError(CadgateError::not_found("Guest view", "requested page"));

    let tenant = query
        .tenant
        .filter(|t| !t.trim().is_empty())
        .and_then(|t| Tenant::parse(&t).ok())
        .ok_or_else(not_found)?;
    let id = query
        .id
        .and_then(|id| id.trim().parse::<u64>().ok())
        .ok_or_else(not_found)?;
    let token = query.token.ok_or_else(not_found)?;
    let share = GuestShare::new(id, token).map_err(|_| not_found())?;

    Ok((tenant, share))
}

async fn load_view(state: &AppState, tenant: Tenant, share: GuestShare) -> Result<GuestView, CadgateError> {
    let call_service = state.cad_service.get_call_service(&tenant, &share).await?;

    let geofences = match call_service.as_ref().and_then(|c| c.region_id) {
        Some(region_id) => {
            state
                .cad_service
                .get_geofence(&tenant, &share, region_id)
                .await?
        }
        None => {
            debug!(tenant = %tenant, guest_share_id = share.id, "No region for guest; skipping geofences");
            None
        }
    };

    Ok(GuestView {
        tenant,
        guest_share_id: share.id,
        call_service,
        geofences,
        map: MapView::from(state.maps.as_ref()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadgate_core::ShareToken;

    fn query(tenant: Option<&str>, id: Option<&str>, token: Option<&str>) -> GuestViewQuery {
        GuestViewQuery {
            tenant: tenant.map(str::to_string),
            id: id.map(str::to_string),
            token: token.map(ShareToken::new),
        }
    }

    #[test]
    fn test_parse_guest() {
        let (tenant, share) = parse_guest(query(Some("PM"), Some("42"), Some("abc123"))).unwrap();
        assert_eq!(tenant.as_str(), "pm");
        assert_eq!(share.id, 42);
    }

    #[test]
    fn test_missing_or_empty_parameters_are_not_found() {
        for q in [
            query(None, Some("42"), Some("abc123")),
            query(Some(""), Some("42"), Some("abc123")),
            query(Some("pm"), None, Some("abc123")),
            query(Some("pm"), Some("x"), Some("abc123")),
            query(Some("pm"), Some("42"), None),
            query(Some("pm"), Some("42"), Some("")),
        ] {
            let err = parse_guest(q).unwrap_err();
            assert_eq!(err.0.status_code(), 404);
        }
    }
}
