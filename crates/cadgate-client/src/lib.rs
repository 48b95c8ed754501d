//! # Cadgate Client
//!
//! Client for the upstream multi-tenant CAD API.
//!
//! Reads distinguish three outcomes: data (`Ok(Some(_))`), a reachable
//! upstream that declined (`Ok(None)` for any non-2xx), and a transport or
//! decode failure (`Err(_)`). Callers decide what each means for caching.

pub mod cad_api;
pub mod http_client;
pub mod models;

pub use cad_api::*;
pub use http_client::*;
pub use models::*;
