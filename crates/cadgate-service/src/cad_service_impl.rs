//! CAD data service implementation.

use crate::cache::{cache_keys, ReadThroughCache};
use crate::cad_service::CadService;
use crate::events::{CadEvent, EventPublisher};
use async_trait::async_trait;
use cadgate_client::{CadApi, CallServiceRecord, GeofenceSet, LocationUpdate};
use cadgate_core::{CadgateError, CadgateResult, GuestShare, Tenant};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How long a call service record stays cached.
pub const CALL_SERVICE_TTL: Duration = Duration::from_secs(30 * 60);

/// How long a region's geofences stay cached.
pub const GEOFENCE_TTL: Duration = Duration::from_secs(120 * 60);

const CALL_SERVICE_FAILURE: &str = "Failed to retrieve call service data";
const GEOFENCE_FAILURE: &str = "Failed to retrieve geofence data";
const LOCATION_FAILURE: &str = "Failed to update guest location";

/// CAD data service backed by the read-through cache.
pub struct CadServiceImpl {
    api: Arc<dyn CadApi>,
    cache: ReadThroughCache,
    events: EventPublisher,
}

impl CadServiceImpl {
    /// Creates a new CAD data service.
    pub fn new(api: Arc<dyn CadApi>, cache: ReadThroughCache, events: EventPublisher) -> Self {
        Self { api, cache, events }
    }

    async fn fetch_call_service(
        &self,
        tenant: &Tenant,
        share: &GuestShare,
    ) -> CadgateResult<Option<CallServiceRecord>> {
        self.api
            .call_service(tenant, share)
            .await
            .map_err(|e| upstream_failure(e, tenant, share, CALL_SERVICE_FAILURE))
    }

    /// Adds `primary_key` to the GUID's alias set. Every guest share viewing
    /// one call service is a member, so a GUID clear reaches all of them.
    ///
    /// Called only once the primary entry is stored.
    async fn link_alias(&self, tenant: &Tenant, guid: &str, primary_key: &str) -> CadgateResult<()> {
        if guid.is_empty() {
            return Ok(());
        }
        let alias = cache_keys::call_service_alias(tenant, guid);
        self.cache
            .store()
            .add_member(&alias, primary_key, CALL_SERVICE_TTL)
            .await
    }
}

/// Logs an upstream failure with the guest's hashed identity and replaces it
/// with a generic message for the caller.
fn upstream_failure(
    err: CadgateError,
    tenant: &Tenant,
    share: &GuestShare,
    message: &'static str,
) -> CadgateError {
    error!(
        tenant = %tenant,
        guest_share_id = share.id,
        token_hash = %share.token_hash(),
        error = %err,
        "{}",
        message
    );
    CadgateError::service_failure(message)
}

#[async_trait]
impl CadService for CadServiceImpl {
    async fn get_call_service(
        &self,
        tenant: &Tenant,
        share: &GuestShare,
    ) -> CadgateResult<Option<CallServiceRecord>> {
        let key = cache_keys::call_service(tenant, share);
        let fetched = AtomicBool::new(false);

        let record = self
            .cache
            .fetch_with_cache(&key, CALL_SERVICE_TTL, || {
                fetched.store(true, Ordering::Relaxed);
                self.fetch_call_service(tenant, share)
            })
            .await?;

        if fetched.load(Ordering::Relaxed) {
            if let Some(guid) = record.as_ref().and_then(|r| r.call_service_guid.as_deref()) {
                self.link_alias(tenant, guid, &key).await?;
            }
        }

        Ok(record)
    }

    async fn get_geofence(
        &self,
        tenant: &Tenant,
        share: &GuestShare,
        region_id: u64,
    ) -> CadgateResult<Option<GeofenceSet>> {
        let key = cache_keys::geofence(tenant, region_id);

        self.cache
            .fetch_with_cache(&key, GEOFENCE_TTL, || async {
                self.api
                    .geofence(tenant, share)
                    .await
                    .map_err(|e| upstream_failure(e, tenant, share, GEOFENCE_FAILURE))
            })
            .await
    }

    async fn clear_call_service_cache(
        &self,
        tenant: &Tenant,
        share: &GuestShare,
    ) -> CadgateResult<()> {
        let key = cache_keys::call_service(tenant, share);

        // Read first so this share can leave its GUID alias set.
        let cached: Option<CallServiceRecord> = self.cache.get(&key).await?;
        self.cache.evict(&key).await?;

        info!(
            tenant = %tenant,
            guest_share_id = share.id,
            token_hash = %share.token_hash(),
            "Cleared call service cache"
        );

        self.events.publish(CadEvent::GuestShareUpdated {
            tenant: tenant.clone(),
            guest_share_id: share.id,
            token_hash: share.token_hash(),
        });

        if let Some(guid) = cached.and_then(|r| r.call_service_guid) {
            self.cache
                .store()
                .remove_member(&cache_keys::call_service_alias(tenant, &guid), &key)
                .await?;
            self.events.publish(CadEvent::CallServiceUpdated {
                tenant: tenant.clone(),
                call_service_guid: guid,
            });
        }

        Ok(())
    }

    async fn clear_call_service_cache_by_guid(
        &self,
        tenant: &Tenant,
        call_service_guid: &str,
    ) -> CadgateResult<bool> {
        let alias = cache_keys::call_service_alias(tenant, call_service_guid);

        let members = self.cache.store().members(&alias).await?;
        for primary in &members {
            self.cache.evict(primary).await?;
        }
        self.cache.evict(&alias).await?;

        let found = !members.is_empty();
        if !found {
            debug!(tenant = %tenant, call_service_guid, "No cached call service for GUID");
        }

        info!(
            tenant = %tenant,
            call_service_guid,
            shares = members.len(),
            "Cleared call service cache by GUID"
        );

        self.events.publish(CadEvent::CallServiceUpdated {
            tenant: tenant.clone(),
            call_service_guid: call_service_guid.to_string(),
        });

        Ok(found)
    }

    async fn clear_geofence_cache(&self, tenant: &Tenant, region_id: u64) -> CadgateResult<()> {
        let key = cache_keys::geofence(tenant, region_id);
        self.cache.evict(&key).await?;

        info!(tenant = %tenant, region_id, "Cleared geofence cache");

        self.events.publish(CadEvent::GeofencesUpdated {
            tenant: tenant.clone(),
            region: region_id,
        });

        Ok(())
    }

    async fn refresh_call_service_cache(
        &self,
        tenant: &Tenant,
        share: &GuestShare,
        call_service_guid: &str,
    ) -> CadgateResult<Option<CallServiceRecord>> {
        let key = cache_keys::call_service(tenant, share);

        let record = self
            .cache
            .refresh(&key, CALL_SERVICE_TTL, || self.fetch_call_service(tenant, share))
            .await?;

        if let Some(fresh) = &record {
            self.link_alias(tenant, call_service_guid, &key).await?;
            if let Some(own) = fresh.call_service_guid.as_deref() {
                if own != call_service_guid {
                    self.link_alias(tenant, own, &key).await?;
                }
            }
        }

        info!(
            tenant = %tenant,
            guest_share_id = share.id,
            token_hash = %share.token_hash(),
            call_service_guid,
            found = record.is_some(),
            "Refreshed call service cache"
        );

        self.events.publish(CadEvent::GuestShareUpdated {
            tenant: tenant.clone(),
            guest_share_id: share.id,
            token_hash: share.token_hash(),
        });
        if !call_service_guid.is_empty() {
            self.events.publish(CadEvent::CallServiceUpdated {
                tenant: tenant.clone(),
                call_service_guid: call_service_guid.to_string(),
            });
        }

        Ok(record)
    }

    async fn update_guest_location(
        &self,
        tenant: &Tenant,
        share: &GuestShare,
        update: LocationUpdate,
    ) -> CadgateResult<()> {
        let accepted = self
            .api
            .update_location(tenant, share, &update)
            .await
            .map_err(|e| upstream_failure(e, tenant, share, LOCATION_FAILURE))?;

        if !accepted {
            warn!(
                tenant = %tenant,
                guest_share_id = share.id,
                token_hash = %share.token_hash(),
                "Upstream rejected guest location update"
            );
            return Err(CadgateError::service_failure(LOCATION_FAILURE));
        }

        debug!(
            tenant = %tenant,
            guest_share_id = share.id,
            "Guest location forwarded"
        );
        Ok(())
    }
}
