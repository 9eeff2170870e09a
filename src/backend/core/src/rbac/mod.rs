//! Role-based access control for the booking API.
//!
//! This module provides:
//! - **Models**: Role, Resource, Action, Permission, RoleSet and Principal
//! - **Permission Table**: the static role -> resource -> actions mapping
//! - **Permission Engine**: evaluates whether a role set may perform an action
//! - **Permission Gate**: tower layer enforcing one permission per route
//!
//! # Usage
//!
//! ```rust,ignore
//! use salon_core::rbac::{Action, PermissionEngine, RequirePermissionLayer, Resource, Role, RoleSet};
//!
//! let engine = PermissionEngine::standard();
//! let roles: RoleSet = [Role::Customer].into();
//! assert!(engine.authorize(&roles, Resource::Appointment, Action::Create));
//!
//! let app = Router::new().route(
//!     "/businesses/:business_id/appointments",
//!     post(create_appointment)
//!         .layer(RequirePermissionLayer::new(engine, Resource::Appointment, Action::Create)),
//! );
//! ```

pub mod middleware;
pub mod models;
pub mod policy;
pub mod roles;

pub use middleware::{GateContext, RequirePermissionLayer, RequirePermissionService};
pub use models::{Action, Permission, Principal, Resource, Role, RoleSet, UnknownTag};
pub use policy::{PermissionEngine, PolicyDecision};
pub use roles::{PermissionTable, PermissionTableBuilder};
