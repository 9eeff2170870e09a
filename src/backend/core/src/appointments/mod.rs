//! Appointment booking: domain model, request validation, referential
//! checks, the status machine and the service that ties them to storage.
//!
//! ```rust,ignore
//! let service = AppointmentService::new(store, BookingPolicies::default());
//! let draft = CreateAppointmentRequest { .. }.validate()?;
//! let created = service.create(business_id, draft).await?;
//! let confirmed = service.apply_status(created.id, StatusCommand::Approve).await?;
//! ```

pub mod model;
pub mod requests;
pub mod service;
pub mod status;
pub mod validator;

pub use model::{
    Appointment, AppointmentDraft, AppointmentPatch, AppointmentStatus, CustomerRef, TimeWindow,
};
pub use requests::{CreateAppointmentRequest, StatusActionRequest, UpdateAppointmentRequest};
pub use service::{AppointmentService, BookingPolicies, DoubleBookingPolicy};
pub use status::{StatusAction, StatusCommand, StatusMachine, TransitionPolicy};
pub use validator::AppointmentValidator;
