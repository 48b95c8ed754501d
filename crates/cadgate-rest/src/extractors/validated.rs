//! Validated JSON extractor.
//!
//! `ValidatedJson<T>` deserializes the body and runs `validator` rules on it.
//! Malformed JSON is a 400; a body that parses but breaks a rule is a 422
//! with field-level details.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cadgate_core::{ErrorResponse, FieldError};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Field name reported for struct-level rules.
const STRUCT_LEVEL_FIELD: &str = "__all__";

/// JSON extractor that validates the deserialized value.
///
/// ```ignore
/// async fn clear(ValidatedJson(request): ValidatedJson<ClearGeofenceRequest>) {
///     // request.tenant is a valid tenant here
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T> std::ops::Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Rejection type for validated JSON extraction.
pub enum ValidatedJsonRejection {
    /// JSON parsing/deserialization error.
    JsonError(JsonRejection),
    /// Validation error with field-level details.
    ValidationError(ValidationErrors),
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        match self {
            Self::JsonError(rejection) => {
                let error_response = ErrorResponse {
                    code: "INVALID_JSON".to_string(),
                    message: format!("Invalid JSON: {}", rejection.body_text()),
                    details: None,
                };
                (StatusCode::BAD_REQUEST, Json(error_response)).into_response()
            }
            Self::ValidationError(errors) => {
                let error_response = ErrorResponse {
                    code: "VALIDATION_ERROR".to_string(),
                    message: "Request validation failed".to_string(),
                    details: Some(convert_validation_errors(&errors)),
                };
                (StatusCode::UNPROCESSABLE_ENTITY, Json(error_response)).into_response()
            }
        }
    }
}

/// Convert validator errors to field errors.
fn convert_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut field_errors = Vec::new();

    for (field, kind) in errors.errors() {
        let field: &str = field.as_ref();
        match kind {
            ValidationErrorsKind::Field(errs) => {
                for err in errs {
                    let message = err
                        .message
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| format!("Validation failed for field '{}'", field));

                    let name = if field == STRUCT_LEVEL_FIELD {
                        "body".to_string()
                    } else {
                        field.to_string()
                    };

                    field_errors.push(FieldError {
                        field: name,
                        message,
                        code: err.code.to_string(),
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                for nested_err in convert_validation_errors(nested) {
                    field_errors.push(FieldError {
                        field: format!("{}.{}", field, nested_err.field),
                        ..nested_err
                    });
                }
            }
            ValidationErrorsKind::List(items) => {
                for (index, item_errors) in items {
                    for nested_err in convert_validation_errors(item_errors) {
                        field_errors.push(FieldError {
                            field: format!("{}[{}].{}", field, index, nested_err.field),
                            ..nested_err
                        });
                    }
                }
            }
        }
    }

    field_errors
}

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::JsonError)?;

        value
            .validate()
            .map_err(ValidatedJsonRejection::ValidationError)?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use validator::{Validate, ValidationError};

    #[derive(Debug, Deserialize, Validate)]
    #[validate(schema(function = "validate_target"))]
    struct ClearRequest {
        #[validate(length(min = 1, max = 63, message = "Tenant is required"))]
        tenant: String,
        guest_share_id: Option<u64>,
        #[validate(length(min = 1))]
        call_service_guid: Option<String>,
    }

    fn validate_target(request: &ClearRequest) -> Result<(), ValidationError> {
        if request.guest_share_id.is_none() && request.call_service_guid.is_none() {
            return Err(ValidationError::new("missing_target")
                .with_message("guestShareId or callServiceGUID is required".into()));
        }
        Ok(())
    }

    #[test]
    fn test_field_error() {
        let req = ClearRequest {
            tenant: String::new(),
            guest_share_id: Some(42),
            call_service_guid: None,
        };

        let errors = req.validate().unwrap_err();
        let field_errors = convert_validation_errors(&errors);

        assert_eq!(field_errors.len(), 1);
        assert_eq!(field_errors[0].field, "tenant");
        assert_eq!(field_errors[0].message, "Tenant is required");
    }

    #[test]
    fn test_struct_level_error_is_reported_on_body() {
        let req = ClearRequest {
            tenant: "pm".to_string(),
            guest_share_id: None,
            call_service_guid: None,
        };

        let errors = req.validate().unwrap_err();
        let field_errors = convert_validation_errors(&errors);

        assert_eq!(field_errors.len(), 1);
        assert_eq!(field_errors[0].field, "body");
        assert_eq!(field_errors[0].code, "missing_target");
    }

    #[test]
    fn test_optional_field_validated_when_present() {
        let req = ClearRequest {
            tenant: "pm".to_string(),
            guest_share_id: None,
            call_service_guid: Some(String::new()),
        };

        let field_errors = convert_validation_errors(&req.validate().unwrap_err());
        assert!(field_errors.iter().any(|e| e.field == "call_service_guid"));
    }

    #[test]
    fn test_valid_request_passes() {
        let req = ClearRequest {
            tenant: "pm".to_string(),
            guest_share_id: None,
            call_service_guid: Some("cs-1".to_string()),
        };

        assert!(req.validate().is_ok());
    }
}
