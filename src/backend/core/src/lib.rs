#![allow(clippy::result_large_err)]
//! # Salon Core
//!
//! Access control and booking rules for a salon booking API.
//!
//! ## Architecture
//!
//! - **RBAC**: static role to permission table, default-deny checks and a per-route tower gate
//! - **Appointments**: request validation, referential checks and the status machine
//! - **Store**: the storage seam, with PostgreSQL and in-memory implementations
//! - **Middleware**: bearer token authentication resolving a principal
//! - **API**: axum router, handlers and the JSON envelope
//! - **Telemetry**: structured logging, optional OTLP export, Prometheus metrics

pub mod api;
pub mod appointments;
pub mod config;
pub mod error;
pub mod middleware;
pub mod rbac;
pub mod store;
pub mod telemetry;
pub mod validation;

pub use error::{ErrorCode, ErrorDetails, ErrorSeverity, Result, SalonError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::api::{build_router, ApiResponse, AppState};
    pub use crate::appointments::{
        Appointment, AppointmentDraft, AppointmentPatch, AppointmentService, AppointmentStatus,
        BookingPolicies, CreateAppointmentRequest, CustomerRef, DoubleBookingPolicy,
        StatusAction, StatusActionRequest, StatusCommand, StatusMachine, TimeWindow,
        TransitionPolicy, UpdateAppointmentRequest,
    };
    pub use crate::config::Config;
    pub use crate::error::{ErrorCode, ErrorDetails, ErrorSeverity, Result, SalonError};
    pub use crate::middleware::{AuthConfig, AuthLayer, Authenticator, Claims, IdentityResolver};
    pub use crate::rbac::{
        Action, GateContext, Permission, PermissionEngine, PermissionTable, PolicyDecision,
        Principal, RequirePermissionLayer, Resource, Role, RoleSet,
    };
    pub use crate::store::{BookingStore, DynStore, InMemoryStore, PgStore};
    pub use crate::validation::{Validate, ValidatedJson, ValidationErrors};
}
