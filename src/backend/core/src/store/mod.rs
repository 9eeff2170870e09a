//! Storage collaborator for the booking core.
//!
//! [`BookingStore`] is the only way the appointment service touches data.
//! Two implementations ship: [`PgStore`] (PostgreSQL through sqlx) and
//! [`InMemoryStore`] (DashMap, for tests and `memory://` URLs).

pub mod memory;
pub mod pg;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::appointments::{Appointment, AppointmentPatch, AppointmentStatus, TimeWindow};
use crate::error::Result;

pub use memory::InMemoryStore;
pub use pg::PgStore;

// ═══════════════════════════════════════════════════════════════════════════════
// Referenced Records
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Business {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Service {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
}

/// A registered user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub display_name: String,
}

/// An ad-hoc customer record scoped to one business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BusinessCustomer {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Store Trait
// ═══════════════════════════════════════════════════════════════════════════════

/// Typed access to the records the booking core reads and writes.
///
/// `find_*` return `Ok(None)` for missing rows; errors are reserved for
/// backend failures.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn find_business(&self, id: Uuid) -> Result<Option<Business>>;

    async fn find_service(&self, id: Uuid) -> Result<Option<Service>>;

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>>;

    async fn find_business_customer(&self, id: Uuid) -> Result<Option<BusinessCustomer>>;

    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>>;

    /// A business's appointments ordered by start time.
    async fn list_appointments(&self, business_id: Uuid) -> Result<Vec<Appointment>>;

    async fn insert_appointment(&self, appointment: &Appointment) -> Result<Appointment>;

    /// Apply `patch` and bump `updated_at`. `Ok(None)` when the row is gone.
    async fn update_appointment(&self, id: Uuid, patch: &AppointmentPatch) -> Result<Option<Appointment>>;

    /// [`update_appointment`](Self::update_appointment) guarded by the stored
    /// status: applied only while the row is still `expected`. `Ok(None)`
    /// when the row is gone or its status has moved on.
    async fn update_appointment_from(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        patch: &AppointmentPatch,
    ) -> Result<Option<Appointment>>;

    /// `Ok(false)` when there was nothing to delete.
    async fn delete_appointment(&self, id: Uuid) -> Result<bool>;

    /// Non-cancelled appointments of `business_id` whose window overlaps `window`.
    async fn find_overlapping(&self, business_id: Uuid, window: &TimeWindow) -> Result<Vec<Appointment>>;

    /// Liveness check for the health endpoint.
    async fn ping(&self) -> Result<()>;

    fn backend(&self) -> &'static str;
}

/// Shared handle to a store.
pub type DynStore = Arc<dyn BookingStore>;
