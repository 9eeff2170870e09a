//! Request validation for the booking API.
//!
//! - **Error Handling**: ordered field-level errors joined into one message
//! - **Validators**: the [`Validate`] trait and the [`RequestValidator`] field parsers
//! - **Extractor**: [`ValidatedJson`] rejects malformed or invalid bodies with 400

pub mod error;
pub mod validator;

pub use error::{FieldError, ValidationErrorKind, ValidationErrors, ValidationResult};
pub use validator::{parse_timestamp, parse_uuid, RequestValidator, Validate, ValidatedJson};

use crate::error::{ErrorCode, SalonError};

/// `MissingRequiredField` when every error is a missing field,
/// `InvalidFormat` when none is, `ValidationError` for a mix.
fn shape_error_code(errors: &ValidationErrors) -> ErrorCode {
    let missing = errors
        .iter()
        .filter(|e| e.kind == ValidationErrorKind::Required)
        .count();

    match missing {
        0 if !errors.is_empty() => ErrorCode::InvalidFormat,
        n if n == errors.error_count() && n > 0 => ErrorCode::MissingRequiredField,
        _ => ErrorCode::ValidationError,
    }
}

impl From<ValidationErrors> for SalonError {
    fn from(errors: ValidationErrors) -> Self {
        let message = if errors.is_empty() {
            "Validation failed".to_string()
        } else {
            errors.to_string()
        };

        SalonError::new(shape_error_code(&errors), message).with_context("field_errors", &errors)
    }
}
