//! HTTP surface for the booking core.
//!
//! Success bodies are wrapped as `{"success": true, "data": ...}`; failures
//! use the [`ErrorResponse`](crate::error::ErrorResponse) envelope produced by
//! [`SalonError`](crate::error::SalonError).
//!
//! Layer order, outermost first: CORS, compression, HTTP trace span,
//! request timeout, request id and metrics, bearer authentication. Each
//! appointment route additionally carries its own permission gate.

mod extract;
mod handlers;
pub mod middleware;
pub mod routes;

use axum::{middleware as axum_middleware, routing::get, Router};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::appointments::AppointmentService;
use crate::middleware::{AuthLayer, IdentityResolver};
use crate::rbac::PermissionEngine;

pub use extract::PathId;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub appointments: AppointmentService,
    pub permissions: PermissionEngine,
    pub identity: Arc<dyn IdentityResolver>,
}

/// Build the API router.
///
/// # Example
///
/// ```rust,ignore
/// let state = AppState { appointments, permissions, identity };
/// let app = build_router(state, Duration::from_secs(30));
/// ```
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(routes::paths::HEALTH, get(handlers::health_check))
        .route(routes::paths::METRICS, get(handlers::prometheus_metrics))
        .route(routes::paths::MY_PERMISSIONS, get(handlers::my_permissions))
        .merge(routes::appointment_routes(&state.permissions))
        .fallback(handlers::route_not_found)
        .layer(AuthLayer::new(state.identity.clone()))
        .layer(axum_middleware::from_fn(middleware::request_context))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// Standard API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { success: true, data }
    }
}
