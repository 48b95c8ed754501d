//! # Cadgate REST
//!
//! HTTP surface of the CAD guest gateway: the guest view and guest APIs,
//! the cache invalidation webhooks, health checks and API docs.

pub mod controllers;
pub mod dto;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod responses;
pub mod router;
pub mod state;

pub use router::*;
pub use state::*;
