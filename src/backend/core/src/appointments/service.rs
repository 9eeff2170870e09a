//! Appointment service: the create, update, status, delete and read operations.

use chrono::Utc;
use dashmap::DashMap;
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::model::{Appointment, AppointmentDraft, AppointmentPatch, AppointmentStatus, TimeWindow};
use super::status::{StatusAction, StatusCommand, StatusMachine, TransitionPolicy};
use super::validator::AppointmentValidator;
use crate::error::{Result, SalonError};
use crate::store::DynStore;

/// Whether overlapping bookings are allowed on create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoubleBookingPolicy {
    /// No overlap check.
    #[default]
    Allow,
    /// Reject a create whose window overlaps a live booking of the same staff
    /// member (or the same service when either side has no staff member).
    Reject,
}

/// Booking behaviour knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPolicies {
    #[serde(default)]
    pub transition_policy: TransitionPolicy,
    #[serde(default)]
    pub double_booking: DoubleBookingPolicy,
}

/// Status writes retried when a concurrent request changed the row between
/// the transition check and the guarded write.
const TRANSITION_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct AppointmentService {
    store: DynStore,
    validator: AppointmentValidator,
    machine: StatusMachine,
    double_booking: DoubleBookingPolicy,
    /// Per-business serialization of overlap check + write. Entries are
    /// evicted once no request holds or awaits them.
    booking_locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl AppointmentService {
    pub fn new(store: DynStore, policies: BookingPolicies) -> Self {
        Self {
            validator: AppointmentValidator::new(store.clone()),
            store,
            machine: StatusMachine::new(policies.transition_policy),
            double_booking: policies.double_booking,
            booking_locks: Arc::new(DashMap::new()),
        }
    }

    pub fn store(&self) -> &DynStore {
        &self.store
    }

    pub fn policies(&self) -> BookingPolicies {
        BookingPolicies {
            transition_policy: self.machine.policy(),
            double_booking: self.double_booking,
        }
    }

    /// Create a `pending` appointment for `business_id`.
    #[instrument(skip(self, draft), fields(service_id = %draft.service_id))]
    pub async fn create(&self, business_id: Uuid, draft: AppointmentDraft) -> Result<Appointment> {
        self.validator.check_references(business_id, &draft).await?;

        let appointment = draft.into_appointment(business_id, Utc::now());

        let created = match self.double_booking {
            DoubleBookingPolicy::Allow => self.store.insert_appointment(&appointment).await?,
            DoubleBookingPolicy::Reject => {
                self.exclusive(business_id, async {
                    self.ensure_free(&appointment).await?;
                    self.store.insert_appointment(&appointment).await
                })
                .await?
            }
        };

        info!(
            appointment_id = %created.id,
            business_id = %business_id,
            start_time = %created.start_time,
            end_time = %created.end_time,
            "Appointment created"
        );
        record_operation("create");
        Ok(created)
    }

    fn checks_overlap(&self, patch: &AppointmentPatch) -> bool {
        self.double_booking == DoubleBookingPolicy::Reject && patch.touches_schedule()
    }

    /// Run `work` while holding the business's booking lock.
    async fn exclusive<T>(&self, business_id: Uuid, work: impl Future<Output = Result<T>>) -> Result<T> {
        let lock = self.booking_locks.entry(business_id).or_default().clone();
        let result = {
            let _guard = lock.lock().await;
            work.await
        };
        drop(lock);

        // Both this and `entry` hold the shard lock, so a count of one means
        // nobody else holds or awaits the mutex.
        self.booking_locks
            .remove_if(&business_id, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    /// Fail with a scheduling conflict when `candidate` overlaps a live
    /// booking of the same business.
    async fn ensure_free(&self, candidate: &Appointment) -> Result<()> {
        // An empty or inverted window overlaps nothing.
        if candidate.end_time <= candidate.start_time {
            return Ok(());
        }
        let window = TimeWindow::new(candidate.start_time, candidate.end_time)?;
        let overlapping = self
            .store
            .find_overlapping(candidate.business_id, &window)
            .await?;

        if let Some(existing) = overlapping.iter().find(|existing| candidate.conflicts_with(existing)) {
            warn!(
                business_id = %candidate.business_id,
                appointment_id = %candidate.id,
                conflicting_id = %existing.id,
                "Rejected overlapping booking"
            );
            record_operation("conflict");
            return Err(SalonError::scheduling_conflict(existing.id));
        }
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Appointment> {
        self.store
            .find_appointment(id)
            .await?
            .ok_or_else(|| SalonError::not_found("appointment", id))
    }

    /// A business's appointments ordered by start time.
    pub async fn list_for_business(&self, business_id: Uuid) -> Result<Vec<Appointment>> {
        if self.store.find_business(business_id).await?.is_none() {
            return Err(SalonError::not_found("business", business_id));
        }
        self.store.list_appointments(business_id).await
    }

    /// General partial update. References are not re-checked and the status
    /// column is written as given.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: Uuid, patch: AppointmentPatch) -> Result<Appointment> {
        if patch.is_empty() {
            return self.get(id).await;
        }

        let written = if self.checks_overlap(&patch) {
            let business_id = self.get(id).await?.business_id;
            self.exclusive(business_id, async {
                let current = self.get(id).await?;
                self.ensure_free(&patched(&current, &patch)).await?;
                self.store.update_appointment(id, &patch).await
            })
            .await?
        } else {
            self.store.update_appointment(id, &patch).await?
        };
        let updated = written.ok_or_else(|| SalonError::not_found("appointment", id))?;

        info!(appointment_id = %id, status = %updated.status, "Appointment updated");
        record_operation("update");
        Ok(updated)
    }

    /// Apply approve, cancel or reschedule under the configured transition policy.
    #[instrument(skip(self, command), fields(action = %command.action()))]
    pub async fn apply_status(&self, id: Uuid, command: StatusCommand) -> Result<Appointment> {
        let action = command.action();
        let patch = command.into_patch();

        let (from, updated) = if self.checks_overlap(&patch) {
            let business_id = self.get(id).await?.business_id;
            self.exclusive(business_id, self.transition(id, action, &patch, true))
                .await?
        } else {
            self.transition(id, action, &patch, false).await?
        };

        info!(
            appointment_id = %id,
            from = %from,
            to = %updated.status,
            "Appointment status changed"
        );
        record_operation(action.as_str());
        Ok(updated)
    }

    /// Check the transition against the stored row and write it. Under the
    /// strict policy the write is conditional on the status that was
    /// checked, so a concurrent change forces a re-check.
    async fn transition(
        &self,
        id: Uuid,
        action: StatusAction,
        patch: &AppointmentPatch,
        check_overlap: bool,
    ) -> Result<(AppointmentStatus, Appointment)> {
        let mut current = self.get(id).await?;

        for _ in 0..TRANSITION_ATTEMPTS {
            self.machine.transition(current.status, action)?;
            if check_overlap {
                self.ensure_free(&patched(&current, patch)).await?;
            }

            let written = match self.machine.policy() {
                TransitionPolicy::Permissive => self.store.update_appointment(id, patch).await?,
                TransitionPolicy::Strict => {
                    self.store
                        .update_appointment_from(id, current.status, patch)
                        .await?
                }
            };

            match written {
                Some(updated) => return Ok((current.status, updated)),
                None => {
                    let moved = self.get(id).await?;
                    debug!(
                        appointment_id = %id,
                        expected = %current.status,
                        found = %moved.status,
                        "Status changed concurrently, re-checking transition"
                    );
                    current = moved;
                }
            }
        }

        Err(SalonError::invalid_state_transition(current.status, action))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.store.delete_appointment(id).await? {
            return Err(SalonError::not_found("appointment", id));
        }

        info!(appointment_id = %id, "Appointment deleted");
        record_operation("delete");
        Ok(())
    }
}

/// `current` as it would be stored after `patch`.
fn patched(current: &Appointment, patch: &AppointmentPatch) -> Appointment {
    let mut next = current.clone();
    patch.apply_to(&mut next, Utc::now());
    next
}

fn record_operation(operation: &'static str) {
    counter!("salon_appointment_operations_total", "operation" => operation).increment(1);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
