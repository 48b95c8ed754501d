//! Guest-facing DTOs.

use super::{validate_tenant, validate_token};
use cadgate_config::MapsConfig;
use cadgate_core::{ShareToken, Tenant};
use cadgate_service::{CallServiceRecord, GeofenceSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Guest position update.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationRequest {
    #[validate(custom(function = "validate_tenant"))]
    pub tenant: String,

    pub guest_share_id: u64,

    #[validate(custom(function = "validate_token"))]
    #[schema(value_type = String)]
    pub token: ShareToken,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    /// Accuracy in meters.
    #[validate(range(min = 0.0))]
    pub accuracy: Option<f64>,
}

/// Outcome of a location update.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LocationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LocationResponse {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some("Failed to update location".to_string()),
            error: Some(error.into()),
        }
    }
}

/// A log record sent by the guest page.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct GuestLogRequest {
    /// `debug`, `info`, `warning` or `error`; anything else logs as `info`.
    #[validate(length(min = 1))]
    pub level: String,

    #[validate(length(min = 1, max = 4096))]
    pub message: String,

    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub context: Option<Value>,
}

/// Acknowledgement of a guest log record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GuestLogResponse {
    pub success: bool,
    pub message: String,
}

impl GuestLogResponse {
    #[must_use]
    pub fn recorded() -> Self {
        Self {
            success: true,
            message: "Log recorded successfully".to_string(),
        }
    }
}

/// Query string of the guest view. Every field is required; the handler
/// answers 404 when one is missing.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GuestViewQuery {
    pub tenant: Option<String>,
    /// Guest share id.
    pub id: Option<String>,
    #[param(value_type = Option<String>)]
    pub token: Option<ShareToken>,
}

/// Map settings for the guest page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_id: Option<String>,
}

impl From<&MapsConfig> for MapView {
    fn from(config: &MapsConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            map_id: config.map_id.clone(),
        }
    }
}

/// Everything the guest page renders.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuestView {
    #[schema(value_type = String)]
    pub tenant: Tenant,
    pub guest_share_id: u64,
    #[schema(value_type = Option<Object>)]
    pub call_service: Option<CallServiceRecord>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub geofences: Option<GeofenceSet>,
    pub map: MapView,
}

/// Query string of the guest event stream.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GuestEventsQuery {
    pub tenant: String,
    /// Guest share id.
    pub id: u64,
    /// Region whose geofence updates to include.
    pub region: Option<u64>,
    /// Call service whose updates to include.
    #[serde(rename = "callServiceGUID")]
    pub call_service_guid: Option<String>,
}
