//! CAD data service trait definition.

use cadgate_client::{CallServiceRecord, GeofenceSet, LocationUpdate};
use cadgate_core::{CadgateResult, GuestShare, Tenant};
use async_trait::async_trait;

/// Guest-facing access to CAD data.
///
/// Reads go through the cache; invalidation methods are for the webhook
/// surface. Upstream failures come back as a generic
/// [`CadgateError::ServiceFailure`](cadgate_core::CadgateError::ServiceFailure);
/// cache store failures are returned unmasked.
#[async_trait]
pub trait CadService: Send + Sync {
    /// Gets the guest's call service record.
    ///
    /// `None` when the upstream declined the request.
    async fn get_call_service(
        &self,
        tenant: &Tenant,
        share: &GuestShare,
    ) -> CadgateResult<Option<CallServiceRecord>>;

    /// Gets the geofences of `region_id`, shared by every guest in the region.
    async fn get_geofence(
        &self,
        tenant: &Tenant,
        share: &GuestShare,
        region_id: u64,
    ) -> CadgateResult<Option<GeofenceSet>>;

    /// Evicts the guest's call service record.
    async fn clear_call_service_cache(&self, tenant: &Tenant, share: &GuestShare)
        -> CadgateResult<()>;

    /// Evicts the call service record cached under `call_service_guid`.
    ///
    /// Returns whether a cached record was found for the GUID.
    async fn clear_call_service_cache_by_guid(
        &self,
        tenant: &Tenant,
        call_service_guid: &str,
    ) -> CadgateResult<bool>;

    /// Evicts a region's geofences.
    async fn clear_geofence_cache(&self, tenant: &Tenant, region_id: u64) -> CadgateResult<()>;

    /// Replaces the guest's cached call service record with a fresh fetch.
    async fn refresh_call_service_cache(
        &self,
        tenant: &Tenant,
        share: &GuestShare,
        call_service_guid: &str,
    ) -> CadgateResult<Option<CallServiceRecord>>;

    /// Forwards the guest's position upstream. Never touches the cache.
    async fn update_guest_location(
        &self,
        tenant: &Tenant,
        share: &GuestShare,
        update: LocationUpdate,
    ) -> CadgateResult<()>;
}
