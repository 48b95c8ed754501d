//! # Cadgate Server
//!
//! Wiring and startup for the CAD guest gateway: builds the cache store,
//! CAD client and router from configuration and serves them.

pub mod app;
pub mod startup;

pub use app::App;
