//! Appointment domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Result, SalonError};
use crate::rbac::UnknownTag;

// ═══════════════════════════════════════════════════════════════════════════════
// Status
// ═══════════════════════════════════════════════════════════════════════════════

/// Appointment lifecycle state. New appointments always start `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub const TAGS: [&'static str; 4] = ["pending", "confirmed", "cancelled", "completed"];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = UnknownTag;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(UnknownTag {
                kind: "status",
                tag: other.to_string(),
            }),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Time Window
// ═══════════════════════════════════════════════════════════════════════════════

/// A booking window with `end > start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end <= start {
            return Err(SalonError::validation(
                "end_time must be strictly after start_time",
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Half-open overlap: windows that only touch do not overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Customer Reference
// ═══════════════════════════════════════════════════════════════════════════════

/// Who the appointment is for: a registered user or an ad-hoc customer
/// record of the business. Exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerRef {
    User(Uuid),
    BusinessCustomer(Uuid),
}

impl CustomerRef {
    pub fn from_pair(user_id: Option<Uuid>, business_customer_id: Option<Uuid>) -> Result<Self> {
        match (user_id, business_customer_id) {
            (Some(user_id), None) => Ok(Self::User(user_id)),
            (None, Some(customer_id)) => Ok(Self::BusinessCustomer(customer_id)),
            _ => Err(SalonError::validation(
                "either user or business-customer must be set, not both or neither",
            )),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Self::User(id) => Some(*id),
            Self::BusinessCustomer(_) => None,
        }
    }

    pub fn business_customer_id(&self) -> Option<Uuid> {
        match self {
            Self::User(_) => None,
            Self::BusinessCustomer(id) => Some(*id),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Appointment
// ═══════════════════════════════════════════════════════════════════════════════

/// A stored appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub business_id: Uuid,
    pub service_id: Uuid,
    pub user_id: Option<Uuid>,
    pub business_customer_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Whether booking `self` would double-book `existing`.
    ///
    /// Cancelled appointments never conflict. When both name a staff member
    /// the staff member is the contended resource, otherwise the service is.
    pub fn conflicts_with(&self, existing: &Appointment) -> bool {
        if self.id == existing.id
            || self.status == AppointmentStatus::Cancelled
            || existing.status == AppointmentStatus::Cancelled
        {
            return false;
        }

        let same_resource = match (self.staff_id, existing.staff_id) {
            (Some(mine), Some(theirs)) => mine == theirs,
            _ => self.service_id == existing.service_id,
        };

        same_resource && self.start_time < existing.end_time && existing.start_time < self.end_time
    }
}

/// A validated create request. Turned into a `pending` [`Appointment`] by
/// [`AppointmentDraft::into_appointment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentDraft {
    pub service_id: Uuid,
    pub customer: CustomerRef,
    pub staff_id: Option<Uuid>,
    pub window: TimeWindow,
}

impl AppointmentDraft {
    pub fn into_appointment(self, business_id: Uuid, now: DateTime<Utc>) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            business_id,
            service_id: self.service_id,
            user_id: self.customer.user_id(),
            business_customer_id: self.customer.business_customer_id(),
            staff_id: self.staff_id,
            start_time: self.window.start(),
            end_time: self.window.end(),
            status: AppointmentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Patch
// ═══════════════════════════════════════════════════════════════════════════════

/// A partial update. `None` leaves a column untouched; for nullable
/// references `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<Uuid>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub business_customer_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<Option<Uuid>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
}

impl AppointmentPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn reschedule(window: TimeWindow) -> Self {
        Self {
            start_time: Some(window.start()),
            end_time: Some(window.end()),
            status: Some(AppointmentStatus::Pending),
            ..Self::default()
        }
    }

    /// Whether applying the patch can create an overlap: it moves the
    /// window, changes the contended staff member or service, or makes the
    /// row live again.
    pub fn touches_schedule(&self) -> bool {
        self.start_time.is_some()
            || self.end_time.is_some()
            || self.staff_id.is_some()
            || self.service_id.is_some()
            || self.status.is_some_and(|status| status != AppointmentStatus::Cancelled)
    }

    /// Apply to a stored row, bumping `updated_at` when anything changed.
    pub fn apply_to(&self, appointment: &mut Appointment, now: DateTime<Utc>) {
        if self.is_empty() {
            return;
        }
        if let Some(service_id) = self.service_id {
            appointment.service_id = service_id;
        }
        if let Some(user_id) = self.user_id {
            appointment.user_id = user_id;
        }
        if let Some(customer_id) = self.business_customer_id {
            appointment.business_customer_id = customer_id;
        }
        if let Some(staff_id) = self.staff_id {
            appointment.staff_id = staff_id;
        }
        if let Some(start) = self.start_time {
            appointment.start_time = start;
        }
        if let Some(end) = self.end_time {
            appointment.end_time = end;
        }
        if let Some(status) = self.status {
            appointment.status = status;
        }
        appointment.updated_at = now;
    }
}

/// Deserialize a present field (including `null`) as `Some(..)`; combined
/// with `#[serde(default)]` an absent field stays `None`.
pub fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 15, hour, minute, 0).unwrap()
    }

    fn appointment(service_id: Uuid, staff_id: Option<Uuid>, start: DateTime<Utc>, end: DateTime<Utc>) -> Appointment {
        AppointmentDraft {
            service_id,
            customer: CustomerRef::User(Uuid::new_v4()),
            staff_id,
            window: TimeWindow::new(start, end).unwrap(),
        }
        .into_appointment(Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn test_time_window_rejects_non_positive_length() {
        assert!(TimeWindow::new(at(10, 0), at(11, 0)).is_ok());

        for end in [at(10, 0), at(9, 0)] {
            let err = TimeWindow::new(at(10, 0), end).unwrap_err();
            assert_eq!(err.user_message(), "end_time must be strictly after start_time");
        }
    }

    #[test]
    fn test_time_window_overlap_is_half_open() {
        let morning = TimeWindow::new(at(10, 0), at(11, 0)).unwrap();
        let touching = TimeWindow::new(at(11, 0), at(12, 0)).unwrap();
        let inside = TimeWindow::new(at(10, 15), at(10, 45)).unwrap();

        assert!(!morning.overlaps(&touching));
        assert!(morning.overlaps(&inside));
        assert!(inside.overlaps(&morning));
    }

    #[test]
    fn test_customer_ref_exactly_one() {
        let id = Uuid::new_v4();
        assert_eq!(CustomerRef::from_pair(Some(id), None).unwrap(), CustomerRef::User(id));
        assert_eq!(
            CustomerRef::from_pair(None, Some(id)).unwrap(),
            CustomerRef::BusinessCustomer(id)
        );

        for (user, customer) in [(Some(id), Some(id)), (None, None)] {
            let err = CustomerRef::from_pair(user, customer).unwrap_err();
            assert_eq!(
                err.user_message(),
                "either user or business-customer must be set, not both or neither"
            );
        }
    }

    #[test]
    fn test_draft_is_always_pending() {
        let appt = appointment(Uuid::new_v4(), None, at(10, 0), at(11, 0));
        assert_eq!(appt.status, AppointmentStatus::Pending);
        assert_eq!(appt.created_at, appt.updated_at);
        assert!(appt.user_id.is_some());
        assert!(appt.business_customer_id.is_none());
    }

    #[test]
    fn test_conflicts_prefer_staff_over_service() {
        let service = Uuid::new_v4();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        let a = appointment(service, Some(alice), at(10, 0), at(11, 0));
        let same_staff = appointment(Uuid::new_v4(), Some(alice), at(10, 30), at(11, 30));
        let other_staff = appointment(service, Some(bob), at(10, 30), at(11, 30));
        let no_staff = appointment(service, None, at(10, 30), at(11, 30));

        assert!(same_staff.conflicts_with(&a));
        assert!(!other_staff.conflicts_with(&a));
        assert!(no_staff.conflicts_with(&a));
    }

    #[test]
    fn test_cancelled_never_conflicts() {
        let service = Uuid::new_v4();
        let mut existing = appointment(service, None, at(10, 0), at(11, 0));
        existing.status = AppointmentStatus::Cancelled;
        let candidate = appointment(service, None, at(10, 0), at(11, 0));

        assert!(!candidate.conflicts_with(&existing));
    }

    #[test]
    fn test_patch_touches_schedule() {
        assert!(!AppointmentPatch::default().touches_schedule());
        assert!(!AppointmentPatch::status(AppointmentStatus::Cancelled).touches_schedule());
        assert!(AppointmentPatch::status(AppointmentStatus::Confirmed).touches_schedule());
        assert!(AppointmentPatch::reschedule(TimeWindow::new(at(9, 0), at(9, 30)).unwrap()).touches_schedule());

        let customer_only = AppointmentPatch {
            user_id: Some(Some(Uuid::new_v4())),
            ..AppointmentPatch::default()
        };
        assert!(!customer_only.touches_schedule());
    }

    #[test]
    fn test_patch_apply_and_clear() {
        let mut appt = appointment(Uuid::new_v4(), Some(Uuid::new_v4()), at(10, 0), at(11, 0));
        let before = appt.clone();
        let later = Utc::now() + Duration::minutes(5);

        AppointmentPatch::default().apply_to(&mut appt, later);
        assert_eq!(appt, before);

        let patch = AppointmentPatch {
            staff_id: Some(None),
            status: Some(AppointmentStatus::Completed),
            ..AppointmentPatch::default()
        };
        patch.apply_to(&mut appt, later);
        assert!(appt.staff_id.is_none());
        assert_eq!(appt.status, AppointmentStatus::Completed);
        assert_eq!(appt.updated_at, later);
        assert_eq!(appt.start_time, before.start_time);
    }

    #[test]
    fn test_nullable_distinguishes_null_from_absent() {
        let cleared: AppointmentPatch = serde_json::from_str(r#"{"staff_id": null}"#).unwrap();
        assert_eq!(cleared.staff_id, Some(None));

        let untouched: AppointmentPatch = serde_json::from_str("{}").unwrap();
        assert_eq!(untouched.staff_id, None);
        assert!(untouched.is_empty());
    }
}
