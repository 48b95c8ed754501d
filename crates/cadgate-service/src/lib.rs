//! # Cadgate Service
//!
//! Read-through caching with webhook-driven invalidation in front of the
//! upstream CAD API, plus the guest-facing data service built on it.

pub mod cache;
pub mod cad_service;
pub mod cad_service_impl;
pub mod events;
pub mod guest_logger;

pub use cache::*;
pub use cad_service::*;
pub use cad_service_impl::*;
pub use events::*;
pub use guest_logger::*;

pub use cadgate_client::{CallServiceRecord, Geofence, GeofenceSet, LatLng, LocationUpdate};
