//! CAD API trait definition.

use crate::{CallServiceRecord, GeofenceSet, LocationUpdate};
use async_trait::async_trait;
use cadgate_core::{CadgateResult, GuestShare, Tenant};

/// Operations the gateway consumes from the upstream CAD API.
#[async_trait]
pub trait CadApi: Send + Sync {
    /// `GET /api/guest/{id}/call-service/?token=…`
    ///
    /// Returns `None` when the upstream answers with a non-2xx status.
    async fn call_service(
        &self,
        tenant: &Tenant,
        share: &GuestShare,
    ) -> CadgateResult<Option<CallServiceRecord>>;

    /// `GET /api/guest/{id}/geofence/?token=…`
    ///
    /// Returns `None` when the upstream answers with a non-2xx status.
    async fn geofence(
        &self,
        tenant: &Tenant,
        share: &GuestShare,
    ) -> CadgateResult<Option<GeofenceSet>>;

    /// `POST /api/guest/{id}/location`
    ///
    /// Returns whether the upstream accepted the update (2xx).
    async fn update_location(
        &self,
        tenant: &Tenant,
        share: &GuestShare,
        update: &LocationUpdate,
    ) -> CadgateResult<bool>;
}
