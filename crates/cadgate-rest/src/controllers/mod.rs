//! REST API controllers.

pub mod guest_api_controller;
pub mod guest_controller;
pub mod health_controller;
pub mod webhook_controller;

pub use health_controller::*;
