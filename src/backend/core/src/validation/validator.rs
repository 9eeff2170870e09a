//! Validator traits, field parsers and the validating JSON extractor.
//!
//! Request bodies arrive with loosely typed fields (strings for ids and
//! timestamps) so that every shape problem in a body can be reported at once.
//! A [`Validate`] impl turns the raw body into its typed counterpart.
//!
//! ```rust,ignore
//! impl Validate for CreateAppointmentRequest {
//!     type Output = AppointmentDraft;
//!
//!     fn validate(self) -> Result<AppointmentDraft> {
//!         let mut v = RequestValidator::new();
//!         let service_id = v.required_uuid("service_id", self.service_id.as_deref());
//!         // ...
//!         let service_id = v.finish(service_id)?;
//!     }
//! }
//! ```

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::str::FromStr;
use uuid::Uuid;

use super::error::{ValidationErrorKind, ValidationErrors, ValidationResult};
use crate::error::{Result, SalonError};

// ═══════════════════════════════════════════════════════════════════════════════
// Validate Trait
// ═══════════════════════════════════════════════════════════════════════════════

/// Trait for request bodies that validate into a typed value.
pub trait Validate: Sized {
    type Output;

    /// Validate and convert. The first failing rule short-circuits; shape
    /// problems found together are reported together.
    fn validate(self) -> Result<Self::Output>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Request Validator
// ═══════════════════════════════════════════════════════════════════════════════

/// Collects shape errors while parsing the fields of one request body.
///
/// Every parser that returns `None` for a present-but-malformed or missing
/// required value records an error, so [`finish`](Self::finish) only yields
/// `Ok` when every required value was parsed.
#[derive(Debug, Default)]
pub struct RequestValidator {
    errors: ValidationErrors,
}

impl RequestValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required_uuid(&mut self, field: &str, value: Option<&str>) -> Option<Uuid> {
        match value {
            Some(raw) => self.uuid(field, raw),
            None => {
                self.errors.add_required(field);
                None
            }
        }
    }

    /// `None` when absent. A malformed value records an error.
    pub fn optional_uuid(&mut self, field: &str, value: Option<&str>) -> Option<Uuid> {
        value.and_then(|raw| self.uuid(field, raw))
    }

    pub fn required_timestamp(&mut self, field: &str, value: Option<&str>) -> Option<DateTime<Utc>> {
        match value {
            Some(raw) => self.timestamp(field, raw),
            None => {
                self.errors.add_required(field);
                None
            }
        }
    }

    pub fn optional_timestamp(&mut self, field: &str, value: Option<&str>) -> Option<DateTime<Utc>> {
        value.and_then(|raw| self.timestamp(field, raw))
    }

    /// Parse a tag from a closed set.
    pub fn one_of<T: FromStr>(&mut self, field: &str, raw: &str, allowed: &[&str]) -> Option<T> {
        match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                self.errors.add_error(
                    field,
                    ValidationErrorKind::NotInSet {
                        allowed: allowed.iter().map(|s| s.to_string()).collect(),
                    },
                );
                None
            }
        }
    }

    fn uuid(&mut self, field: &str, raw: &str) -> Option<Uuid> {
        match parse_uuid(raw) {
            Some(id) => Some(id),
            None => {
                self.errors.add_error(field, ValidationErrorKind::InvalidUuid);
                None
            }
        }
    }

    fn timestamp(&mut self, field: &str, raw: &str) -> Option<DateTime<Utc>> {
        match parse_timestamp(raw) {
            Some(ts) => Some(ts),
            None => {
                self.errors.add_error(field, ValidationErrorKind::InvalidTimestamp);
                None
            }
        }
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Yield `parsed` if no error was recorded.
    pub fn finish<T>(self, parsed: Option<T>) -> ValidationResult<T> {
        match parsed {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(self.errors),
        }
    }
}

/// Parse a hyphenated or simple UUID.
pub fn parse_uuid(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Axum Extractor
// ═══════════════════════════════════════════════════════════════════════════════

/// JSON body extractor that runs [`Validate`] and yields the typed output.
/// Malformed JSON and failed validation are both rejected with 400.
pub struct ValidatedJson<T: Validate>(pub T::Output);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: Validate + DeserializeOwned,
{
    type Rejection = SalonError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| SalonError::validation(rejection.body_text()))?;

        body.validate().map(ValidatedJson)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_normalizes_to_utc() {
        let ts = parse_timestamp("2024-02-15T12:00:00+02:00").unwrap();
        assert_eq!(ts, parse_timestamp("2024-02-15T10:00:00Z").unwrap());
        assert!(parse_timestamp("2024-02-15 10:00").is_none());
        assert!(parse_timestamp("tomorrow").is_none());
    }

    #[test]
    fn test_request_validator_collects_all_shape_errors() {
        let mut v = RequestValidator::new();
        let service = v.required_uuid("service_id", None);
        let user = v.optional_uuid("user_id", Some("not-a-uuid"));
        let start = v.required_timestamp("start_time", Some("2024-02-15T10:00:00Z"));

        assert!(service.is_none());
        assert!(user.is_none());
        assert!(start.is_some());

        let errors = v.finish(service.zip(start)).unwrap_err();
        assert_eq!(errors.error_count(), 2);
        assert_eq!(
            errors.to_string(),
            "service_id: field is required; user_id: must be a valid UUID"
        );
    }

    #[test]
    fn test_request_validator_absent_optional_is_fine() {
        let mut v = RequestValidator::new();
        assert_eq!(v.optional_uuid("staff_id", None), None);
        assert_eq!(v.optional_timestamp("end_time", None), None);
        assert!(v.errors().is_empty());
        assert_eq!(v.finish(Some(1)).unwrap(), 1);
    }
}
