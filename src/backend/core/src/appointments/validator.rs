//! Referential checks run on create, after the request shape is valid.
//!
//! Checks run in a fixed order and the first failure wins:
//! business exists, service belongs to the business, the user profile
//! exists, the business-customer belongs to the business.

use tracing::debug;
use uuid::Uuid;

use super::model::{AppointmentDraft, CustomerRef};
use crate::error::{Result, SalonError};
use crate::store::DynStore;

#[derive(Clone)]
pub struct AppointmentValidator {
    store: DynStore,
}

impl AppointmentValidator {
    pub fn new(store: DynStore) -> Self {
        Self { store }
    }

    pub async fn check_references(&self, business_id: Uuid, draft: &AppointmentDraft) -> Result<()> {
        if self.store.find_business(business_id).await?.is_none() {
            return Err(SalonError::not_found("business", business_id));
        }

        let service_ok = self
            .store
            .find_service(draft.service_id)
            .await?
            .is_some_and(|service| service.business_id == business_id);
        if !service_ok {
            return Err(SalonError::validation(
                "service not found or does not belong to this business",
            ));
        }

        match draft.customer {
            CustomerRef::User(user_id) => {
                if self.store.find_profile(user_id).await?.is_none() {
                    return Err(SalonError::validation("user profile not found"));
                }
            }
            CustomerRef::BusinessCustomer(customer_id) => {
                let customer_ok = self
                    .store
                    .find_business_customer(customer_id)
                    .await?
                    .is_some_and(|customer| customer.business_id == business_id);
                if !customer_ok {
                    return Err(SalonError::validation(
                        "business-customer not found or does not belong to this business",
                    ));
                }
            }
        }

        debug!(business_id = %business_id, service_id = %draft.service_id, "Appointment references verified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointments::TimeWindow;
    use crate::error::ErrorCode;
    use crate::store::InMemoryStore;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    struct Fixture {
        store: InMemoryStore,
        validator: AppointmentValidator,
        business_id: Uuid,
        service_id: Uuid,
    }

    fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let business = store.add_business("Shear Bliss");
        let service = store.add_service(business.id, "Balayage");
        Fixture {
            validator: AppointmentValidator::new(Arc::new(store.clone())),
            store,
            business_id: business.id,
            service_id: service.id,
        }
    }

    fn draft(service_id: Uuid, customer: CustomerRef) -> AppointmentDraft {
        AppointmentDraft {
            service_id,
            customer,
            staff_id: None,
            window: TimeWindow::new(
                Utc.with_ymd_and_hms(2024, 2, 15, 10, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 2, 15, 11, 0, 0).unwrap(),
            )
            .unwrap(),
        }
    }

    #[tokio::test]
    async fn test_valid_references() {
        let f = fixture();
        let profile = f.store.add_profile("Ada");
        let walk_in = f.store.add_business_customer(f.business_id, "Walk-in");

        f.validator
            .check_references(f.business_id, &draft(f.service_id, CustomerRef::User(profile.id)))
            .await
            .unwrap();
        f.validator
            .check_references(f.business_id, &draft(f.service_id, CustomerRef::BusinessCustomer(walk_in.id)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_business_is_not_found() {
        let f = fixture();
        let err = f
            .validator
            .check_references(Uuid::new_v4(), &draft(f.service_id, CustomerRef::User(Uuid::new_v4())))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::RecordNotFound);
        assert_eq!(err.user_message(), "business not found");
    }

    #[tokio::test]
    async fn test_service_of_other_business_rejected_before_customer() {
        let f = fixture();
        let other = f.store.add_business("Elsewhere");
        let foreign_service = f.store.add_service(other.id, "Shave");

        // The unknown profile would also fail; the service check runs first.
        let err = f
            .validator
            .check_references(f.business_id, &draft(foreign_service.id, CustomerRef::User(Uuid::new_v4())))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "service not found or does not belong to this business");
    }

    #[tokio::test]
    async fn test_unknown_profile_rejected() {
        let f = fixture();
        let err = f
            .validator
            .check_references(f.business_id, &draft(f.service_id, CustomerRef::User(Uuid::new_v4())))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(err.user_message(), "user profile not found");
    }

    #[tokio::test]
    async fn test_customer_of_other_business_rejected() {
        let f = fixture();
        let other = f.store.add_business("Elsewhere");
        let theirs = f.store.add_business_customer(other.id, "Regular");

        let err = f
            .validator
            .check_references(f.business_id, &draft(f.service_id, CustomerRef::BusinessCustomer(theirs.id)))
            .await
            .unwrap_err();
        assert_eq!(
            err.user_message(),
            "business-customer not found or does not belong to this business"
        );
    }
}
