//! Cache key generators for consistent key naming.
//!
//! Keys are `:`-separated. Guest tokens only ever appear as their SHA-1
//! digest. Tenants are DNS labels, so no segment can contain the separator.

use cadgate_core::{GuestShare, Tenant};

/// Prefix for all cache keys to namespace them.
const CACHE_PREFIX: &str = "cad";

/// Generate the key for a guest's call service record.
#[must_use]
pub fn call_service(tenant: &Tenant, share: &GuestShare) -> String {
    format!(
        "{}:call-service:{}:{}:{}",
        CACHE_PREFIX,
        tenant,
        share.id,
        share.token_hash()
    )
}

/// Generate the key for a region's geofences.
///
/// Not guest-specific: every guest in the region shares the entry.
#[must_use]
pub fn geofence(tenant: &Tenant, region_id: u64) -> String {
    format!("{}:geofence:{}:{}", CACHE_PREFIX, tenant, region_id)
}

/// Generate the key of the set holding every primary key cached for a call
/// service GUID.
#[must_use]
pub fn call_service_alias(tenant: &Tenant, call_service_guid: &str) -> String {
    format!(
        "{}:call-service-guid:{}:{}",
        CACHE_PREFIX, tenant, call_service_guid
    )
}
