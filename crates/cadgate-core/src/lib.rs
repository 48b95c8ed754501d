//! # Cadgate Core
//!
//! Core types, traits, and error definitions for the CAD guest gateway.
//! Everything here is shared by the client, service, and REST layers.

pub mod error;
pub mod guest;
pub mod result;
pub mod telemetry;
pub mod token;

pub use error::*;
pub use guest::*;
pub use result::*;
pub use telemetry::*;
pub use token::*;
