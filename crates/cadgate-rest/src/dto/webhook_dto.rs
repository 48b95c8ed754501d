//! Cache webhook DTOs.

use super::{validate_tenant, validate_token};
use cadgate_core::ShareToken;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Clear one call service entry, by guest share or by call service GUID.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_clear_target"))]
pub struct ClearCallServiceRequest {
    #[validate(custom(function = "validate_tenant"))]
    pub tenant: String,

    pub guest_share_id: Option<u64>,

    #[validate(custom(function = "validate_token"))]
    #[schema(value_type = Option<String>)]
    pub token: Option<ShareToken>,

    #[serde(rename = "callServiceGUID")]
    #[validate(length(min = 1))]
    pub call_service_guid: Option<String>,
}

impl ClearCallServiceRequest {
    /// Guest share id and token, when both were sent.
    #[must_use]
    pub fn share(&self) -> Option<(u64, ShareToken)> {
        match (self.guest_share_id, &self.token) {
            (Some(id), Some(token)) => Some((id, token.clone())),
            _ => None,
        }
    }
}

fn validate_clear_target(request: &ClearCallServiceRequest) -> Result<(), ValidationError> {
    if request.share().is_none() && request.call_service_guid.is_none() {
        return Err(ValidationError::new("missing_target")
            .with_message("guestShareId with token, or callServiceGUID, is required".into()));
    }
    Ok(())
}

/// Clear a region's geofences.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClearGeofenceRequest {
    #[validate(custom(function = "validate_tenant"))]
    pub tenant: String,

    pub region_id: u64,
}

/// Re-fetch a guest's call service record.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshCallServiceRequest {
    #[validate(custom(function = "validate_tenant"))]
    pub tenant: String,

    pub guest_share_id: u64,

    #[validate(custom(function = "validate_token"))]
    #[schema(value_type = String)]
    pub token: ShareToken,

    #[serde(rename = "callServiceGUID")]
    #[validate(length(min = 1))]
    pub call_service_guid: String,
}

/// Outcome of a cache webhook.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheWebhookResponse {
    pub message: String,

    /// Failure reason, on 500 only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub tenant: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_share_id: Option<u64>,

    #[serde(
        default,
        rename = "callServiceGUID",
        skip_serializing_if = "Option::is_none"
    )]
    pub call_service_guid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_id: Option<u64>,

    /// Whether upstream returned a record, on refresh only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found: Option<bool>,
}

impl CacheWebhookResponse {
    pub const CLEARED: &'static str = "Cache cleared successfully";
    pub const CLEAR_FAILED: &'static str = "Failed to clear cache";
    pub const REFRESHED: &'static str = "Cache refreshed successfully";
    pub const REFRESH_FAILED: &'static str = "Failed to refresh cache";

    #[must_use]
    pub fn new(message: &str, tenant: impl Into<String>) -> Self {
        Self {
            message: message.to_string(),
            error: None,
            tenant: tenant.into(),
            guest_share_id: None,
            call_service_guid: None,
            region_id: None,
            found: None,
        }
    }

    /// Turns the response into a failure with `message` and `error`.
    #[must_use]
    pub fn failed(mut self, message: &str, error: impl Into<String>) -> Self {
        self.message = message.to_string();
        self.error = Some(error.into());
        self.found = None;
        self
    }

    #[must_use]
    pub fn guest_share_id(mut self, id: Option<u64>) -> Self {
        self.guest_share_id = id;
        self
    }

    #[must_use]
    pub fn call_service_guid(mut self, guid: Option<String>) -> Self {
        self.call_service_guid = guid;
        self
    }

    #[must_use]
    pub fn region_id(mut self, region_id: u64) -> Self {
        self.region_id = Some(region_id);
        self
    }

    #[must_use]
    pub fn found(mut self, found: bool) -> Self {
        self.found = Some(found);
        self
    }
}
