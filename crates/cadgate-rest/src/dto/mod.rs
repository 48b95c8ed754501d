//! Request and response bodies of the HTTP surface.

mod guest_dto;
mod webhook_dto;

pub use guest_dto::*;
pub use webhook_dto::*;

use cadgate_core::{ShareToken, Tenant};
use validator::ValidationError;

/// `validator` rule: the value parses as a [`Tenant`].
pub(crate) fn validate_tenant(tenant: &str) -> Result<(), ValidationError> {
    Tenant::parse(tenant).map(|_| ()).map_err(|e| {
        ValidationError::new("invalid_tenant").with_message(e.to_string().into())
    })
}

/// `validator` rule: the token is not empty.
pub(crate) fn validate_token(token: &ShareToken) -> Result<(), ValidationError> {
    if token.is_empty() {
        return Err(ValidationError::new("required").with_message("Token is required".into()));
    }
    Ok(())
}
