//! Route table and permission gates.
//!
//! # Endpoints
//!
//! ## Appointments
//! - `POST /businesses/:id/appointments` - Create (appointment:create)
//! - `GET /businesses/:id/appointments` - List a business's bookings (appointment:view)
//! - `GET /appointments/:id` - Fetch one (appointment:view)
//! - `PUT /appointments/:id` - Partial update (appointment:update)
//! - `PATCH /appointments/:id/status` - Approve, cancel or reschedule (appointment:update)
//! - `DELETE /appointments/:id` - Delete (appointment:delete)
//!
//! ## System
//! - `GET /me/permissions` - Caller's effective permissions
//! - `GET /health`, `GET /metrics` - Ungated

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use super::{handlers, AppState};
use crate::rbac::{Action, PermissionEngine, RequirePermissionLayer, Resource};

/// Appointment routes, each behind its own permission gate.
pub fn appointment_routes(permissions: &PermissionEngine) -> Router<AppState> {
    let gate = |action| RequirePermissionLayer::new(permissions.clone(), Resource::Appointment, action);

    Router::new()
        .route(
            paths::BUSINESS_APPOINTMENTS,
            post(handlers::create_appointment).route_layer(gate(Action::Create)),
        )
        .route(
            paths::BUSINESS_APPOINTMENTS,
            get(handlers::list_appointments).route_layer(gate(Action::View)),
        )
        .route(
            paths::APPOINTMENT,
            get(handlers::get_appointment).route_layer(gate(Action::View)),
        )
        .route(
            paths::APPOINTMENT,
            put(handlers::update_appointment).route_layer(gate(Action::Update)),
        )
        .route(
            paths::APPOINTMENT,
            delete(handlers::delete_appointment).route_layer(gate(Action::Delete)),
        )
        .route(
            paths::APPOINTMENT_STATUS,
            patch(handlers::change_status).route_layer(gate(Action::Update)),
        )
}

/// Route constants for use in clients and documentation.
pub mod paths {
    pub const BUSINESS_APPOINTMENTS: &str = "/businesses/:id/appointments";
    pub const APPOINTMENT: &str = "/appointments/:id";
    pub const APPOINTMENT_STATUS: &str = "/appointments/:id/status";

    pub const MY_PERMISSIONS: &str = "/me/permissions";
    pub const HEALTH: &str = "/health";
    pub const METRICS: &str = "/metrics";
}
