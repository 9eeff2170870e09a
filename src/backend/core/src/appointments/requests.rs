//! Request bodies for the appointment endpoints and their validation.

use serde::{Deserialize, Serialize};

use super::model::{nullable, AppointmentDraft, AppointmentPatch, AppointmentStatus, CustomerRef, TimeWindow};
use super::status::{StatusAction, StatusCommand};
use crate::error::{Result, SalonError};
use crate::validation::{RequestValidator, Validate};

/// `POST /businesses/:business_id/appointments`. Any `status` sent by the
/// caller is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateAppointmentRequest {
    pub service_id: Option<String>,
    pub user_id: Option<String>,
    pub business_customer_id: Option<String>,
    pub staff_id: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl Validate for CreateAppointmentRequest {
    type Output = AppointmentDraft;

    fn validate(self) -> Result<AppointmentDraft> {
        let mut v = RequestValidator::new();
        let service_id = v.required_uuid("service_id", self.service_id.as_deref());
        let user_id = v.optional_uuid("user_id", self.user_id.as_deref());
        let business_customer_id =
            v.optional_uuid("business_customer_id", self.business_customer_id.as_deref());
        let staff_id = v.optional_uuid("staff_id", self.staff_id.as_deref());
        let start = v.required_timestamp("start_time", self.start_time.as_deref());
        let end = v.required_timestamp("end_time", self.end_time.as_deref());

        let (service_id, (start, end)) = v.finish(service_id.zip(start.zip(end)))?;
        let window = TimeWindow::new(start, end)?;
        let customer = CustomerRef::from_pair(user_id, business_customer_id)?;

        Ok(AppointmentDraft {
            service_id,
            customer,
            staff_id,
            window,
        })
    }
}

/// `PUT /appointments/:id`. Absent fields are left alone; an explicit `null`
/// clears a nullable reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub business_customer_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<Option<String>>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Validate for UpdateAppointmentRequest {
    type Output = AppointmentPatch;

    fn validate(self) -> Result<AppointmentPatch> {
        let mut v = RequestValidator::new();
        let service_id = v.optional_uuid("service_id", self.service_id.as_deref());
        let user_id = self
            .user_id
            .map(|raw| v.optional_uuid("user_id", raw.as_deref()));
        let business_customer_id = self
            .business_customer_id
            .map(|raw| v.optional_uuid("business_customer_id", raw.as_deref()));
        let staff_id = self
            .staff_id
            .map(|raw| v.optional_uuid("staff_id", raw.as_deref()));
        let start_time = v.optional_timestamp("start_time", self.start_time.as_deref());
        let end_time = v.optional_timestamp("end_time", self.end_time.as_deref());
        let status = self
            .status
            .as_deref()
            .and_then(|raw| v.one_of::<AppointmentStatus>("status", raw, &AppointmentStatus::TAGS));

        let patch = v.finish(Some(AppointmentPatch {
            service_id,
            user_id,
            business_customer_id,
            staff_id,
            start_time,
            end_time,
            status,
        }))?;

        // Cross-field rules only apply when both fields are in the patch.
        if let (Some(start), Some(end)) = (patch.start_time, patch.end_time) {
            TimeWindow::new(start, end)?;
        }
        if let (Some(user_id), Some(customer_id)) = (patch.user_id, patch.business_customer_id) {
            CustomerRef::from_pair(user_id, customer_id)?;
        }

        Ok(patch)
    }
}

/// `PATCH /appointments/:id/status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusActionRequest {
    pub action: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl Validate for StatusActionRequest {
    type Output = StatusCommand;

    fn validate(self) -> Result<StatusCommand> {
        let action = self
            .action
            .as_deref()
            .and_then(|raw| raw.parse::<StatusAction>().ok())
            .ok_or_else(|| SalonError::validation("invalid action"))?;

        match action {
            StatusAction::Approve => Ok(StatusCommand::Approve),
            StatusAction::Cancel => Ok(StatusCommand::Cancel),
            StatusAction::Reschedule => {
                if self.start_time.is_none() || self.end_time.is_none() {
                    return Err(SalonError::validation(
                        "missing start_time or end_time for reschedule",
                    ));
                }

                let mut v = RequestValidator::new();
                let start = v.required_timestamp("start_time", self.start_time.as_deref());
                let end = v.required_timestamp("end_time", self.end_time.as_deref());
                let (start, end) = v.finish(start.zip(end))?;

                Ok(StatusCommand::Reschedule(TimeWindow::new(start, end)?))
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
