//! HTTP middleware.

mod logging;
mod webhook_secret;

pub use logging::*;
pub use webhook_secret::*;
