//! Unified error types for all layers of the gateway.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for the gateway.
///
/// Upstream failures never reach callers verbatim: the data service logs the
/// detail and converts them into [`CadgateError::ServiceFailure`] carrying a
/// generic, resource-scoped message.
#[derive(Error, Debug)]
pub enum CadgateError {
    // ============ Request Errors ============
    /// Resource not found
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unauthorized access
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // ============ Infrastructure Errors ============
    /// Upstream CAD API error (transport, decode, or rejected write)
    #[error("External service error: {service} - {message}")]
    Upstream { service: String, message: String },

    /// Cache store error
    #[error("Cache error: {0}")]
    Cache(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Timeout error
    #[error("Operation timed out: {0}")]
    Timeout(String),

    // ============ Service Errors ============
    /// Generic, resource-scoped failure surfaced to callers
    #[error("{0}")]
    ServiceFailure(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CadgateError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Validation(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Upstream { .. } => 502,
            Self::Timeout(_) => 503,
            Self::Cache(_)
            | Self::Configuration(_)
            | Self::ServiceFailure(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Upstream { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::ServiceFailure(_) => "SERVICE_FAILURE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates a not found error for a resource.
    #[must_use]
    pub fn not_found<T: ToString>(resource_type: &'static str, id: T) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an unauthorized error.
    #[must_use]
    pub fn unauthorized<T: Into<String>>(message: T) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Creates an upstream error for the named service.
    #[must_use]
    pub fn upstream<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::Upstream {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Creates a generic service failure.
    #[must_use]
    pub fn service_failure<T: Into<String>>(message: T) -> Self {
        Self::ServiceFailure(message.into())
    }
}

impl From<serde_json::Error> for CadgateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON serialization error: {}", err))
    }
}

/// Serializable error response for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional field-level errors for validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Field-level validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FieldError {
    /// Field name
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
}

impl ErrorResponse {
    /// Creates a new error response from a `CadgateError`.
    #[must_use]
    pub fn from_error(error: &CadgateError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.to_string(),
            details: None,
        }
    }
}

impl From<&CadgateError> for ErrorResponse {
    fn from(error: &CadgateError) -> Self {
        Self::from_error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(CadgateError::not_found("Guest", 1).status_code(), 404);
        assert_eq!(CadgateError::validation("bad tenant").status_code(), 400);
        assert_eq!(CadgateError::unauthorized("bad secret").status_code(), 401);
        assert_eq!(CadgateError::upstream("cad", "boom").status_code(), 502);
        assert_eq!(CadgateError::Timeout("slow".to_string()).status_code(), 503);
        assert_eq!(CadgateError::Cache("down".to_string()).status_code(), 500);
        assert_eq!(CadgateError::service_failure("nope").status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CadgateError::not_found("Guest", 1).error_code(), "NOT_FOUND");
        assert_eq!(CadgateError::validation("x").error_code(), "VALIDATION_ERROR");
        assert_eq!(CadgateError::upstream("cad", "x").error_code(), "EXTERNAL_SERVICE_ERROR");
        assert_eq!(CadgateError::Cache("x".to_string()).error_code(), "CACHE_ERROR");
        assert_eq!(CadgateError::service_failure("x").error_code(), "SERVICE_FAILURE");
        assert_eq!(CadgateError::Internal("x".to_string()).error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_service_failure_displays_only_its_message() {
        let err = CadgateError::service_failure("Failed to retrieve call service data");
        assert_eq!(err.to_string(), "Failed to retrieve call service data");
    }

    #[test]
    fn test_error_response_from_error() {
        let err = CadgateError::not_found("Guest", 42);
        let response = ErrorResponse::from_error(&err);
        assert_eq!(response.code, "NOT_FOUND");
        assert!(response.message.contains("42"));
        assert!(response.details.is_none());
    }
}
