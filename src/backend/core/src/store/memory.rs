//! In-memory [`BookingStore`] backed by `DashMap`.
//!
//! Used by the test suites and selected at startup by a `memory://`
//! database URL. Referenced records are seeded with the `add_*` methods.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::{BookingStore, Business, BusinessCustomer, Profile, Service};
use crate::appointments::{Appointment, AppointmentPatch, AppointmentStatus, TimeWindow};
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    businesses: Arc<DashMap<Uuid, Business>>,
    services: Arc<DashMap<Uuid, Service>>,
    profiles: Arc<DashMap<Uuid, Profile>>,
    business_customers: Arc<DashMap<Uuid, BusinessCustomer>>,
    appointments: Arc<DashMap<Uuid, Appointment>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_business(&self, name: impl Into<String>) -> Business {
        let business = Business {
            id: Uuid::new_v4(),
            name: name.into(),
        };
        self.businesses.insert(business.id, business.clone());
        business
    }

    pub fn add_service(&self, business_id: Uuid, name: impl Into<String>) -> Service {
        let service = Service {
            id: Uuid::new_v4(),
            business_id,
            name: name.into(),
        };
        self.services.insert(service.id, service.clone());
        service
    }

    pub fn add_profile(&self, display_name: impl Into<String>) -> Profile {
        let profile = Profile {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
        };
        self.profiles.insert(profile.id, profile.clone());
        profile
    }

    pub fn add_business_customer(&self, business_id: Uuid, name: impl Into<String>) -> BusinessCustomer {
        let customer = BusinessCustomer {
            id: Uuid::new_v4(),
            business_id,
            name: name.into(),
        };
        self.business_customers.insert(customer.id, customer.clone());
        customer
    }

    pub fn appointment_count(&self) -> usize {
        self.appointments.len()
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn find_business(&self, id: Uuid) -> Result<Option<Business>> {
        Ok(self.businesses.get(&id).map(|r| r.clone()))
    }

    async fn find_service(&self, id: Uuid) -> Result<Option<Service>> {
        Ok(self.services.get(&id).map(|r| r.clone()))
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>> {
        Ok(self.profiles.get(&id).map(|r| r.clone()))
    }

    async fn find_business_customer(&self, id: Uuid) -> Result<Option<BusinessCustomer>> {
        Ok(self.business_customers.get(&id).map(|r| r.clone()))
    }

    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>> {
        Ok(self.appointments.get(&id).map(|r| r.clone()))
    }

    async fn list_appointments(&self, business_id: Uuid) -> Result<Vec<Appointment>> {
        let mut found: Vec<Appointment> = self
            .appointments
            .iter()
            .filter(|entry| entry.business_id == business_id)
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by_key(|a| (a.start_time, a.created_at));
        Ok(found)
    }

    async fn insert_appointment(&self, appointment: &Appointment) -> Result<Appointment> {
        self.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment.clone())
    }

    async fn update_appointment(&self, id: Uuid, patch: &AppointmentPatch) -> Result<Option<Appointment>> {
        Ok(self.appointments.get_mut(&id).map(|mut entry| {
            patch.apply_to(entry.value_mut(), Utc::now());
            entry.value().clone()
        }))
    }

    async fn update_appointment_from(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        patch: &AppointmentPatch,
    ) -> Result<Option<Appointment>> {
        // The entry guard holds the shard lock across the compare and the write.
        Ok(self.appointments.get_mut(&id).and_then(|mut entry| {
            if entry.status != expected {
                return None;
            }
            patch.apply_to(entry.value_mut(), Utc::now());
            Some(entry.value().clone())
        }))
    }

    async fn delete_appointment(&self, id: Uuid) -> Result<bool> {
        Ok(self.appointments.remove(&id).is_some())
    }

    async fn find_overlapping(&self, business_id: Uuid, window: &TimeWindow) -> Result<Vec<Appointment>> {
        Ok(self
            .appointments
            .iter()
            .filter(|entry| {
                entry.business_id == business_id
                    && entry.status != AppointmentStatus::Cancelled
                    && entry.start_time < window.end()
                    && window.start() < entry.end_time
            })
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
