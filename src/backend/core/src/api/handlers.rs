//! API request handlers.
//!
//! Handlers return `Result<impl IntoResponse, SalonError>`; the permission
//! gate has already run by the time any appointment handler is entered.
//! Writes run inside the caller's [`GateContext::actor_span`], so the
//! service's state-change logs name who made them.

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{error, Instrument};
use uuid::Uuid;

use super::{extract::PathId, ApiResponse, AppState};
use crate::appointments::{CreateAppointmentRequest, StatusActionRequest, UpdateAppointmentRequest};
use crate::error::SalonError;
use crate::rbac::{Action, GateContext, Principal, Resource, RoleSet};
use crate::telemetry;
use crate::validation::ValidatedJson;

// ═══════════════════════════════════════════════════════════════════════════════
// System
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.appointments.store();
    let (status, health) = match store.ping().await {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(e) => {
            error!(backend = store.backend(), error = %e, "Storage health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
    };

    (
        status,
        Json(serde_json::json!({
            "status": health,
            "storage": store.backend(),
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}

pub async fn prometheus_metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        telemetry::metrics::render(),
    )
}

pub async fn route_not_found(uri: Uri) -> SalonError {
    SalonError::not_found("route", uri.path())
}

#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    pub user_id: Uuid,
    pub roles: RoleSet,
    pub permissions: BTreeMap<Resource, BTreeSet<Action>>,
}

/// Everything the caller's roles grant, grouped by resource.
pub async fn my_permissions(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<impl IntoResponse, SalonError> {
    let permissions = state.permissions.effective_permissions(&principal.roles);

    Ok(Json(ApiResponse::success(PermissionsResponse {
        user_id: principal.user_id,
        roles: principal.roles,
        permissions,
    })))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Appointments
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn create_appointment(
    State(state): State<AppState>,
    gate: GateContext,
    PathId(business_id): PathId,
    ValidatedJson(draft): ValidatedJson<CreateAppointmentRequest>,
) -> Result<impl IntoResponse, SalonError> {
    let created = state
        .appointments
        .create(business_id, draft)
        .instrument(gate.actor_span())
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

pub async fn list_appointments(
    State(state): State<AppState>,
    PathId(business_id): PathId,
) -> Result<impl IntoResponse, SalonError> {
    let appointments = state.appointments.list_for_business(business_id).await?;
    Ok(Json(ApiResponse::success(appointments)))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<impl IntoResponse, SalonError> {
    let appointment = state.appointments.get(id).await?;
    Ok(Json(ApiResponse::success(appointment)))
}

pub async fn update_appointment(
    State(state): State<AppState>,
    gate: GateContext,
    PathId(id): PathId,
    ValidatedJson(patch): ValidatedJson<UpdateAppointmentRequest>,
) -> Result<impl IntoResponse, SalonError> {
    let updated = state
        .appointments
        .update(id, patch)
        .instrument(gate.actor_span())
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn change_status(
    State(state): State<AppState>,
    gate: GateContext,
    PathId(id): PathId,
    ValidatedJson(command): ValidatedJson<StatusActionRequest>,
) -> Result<impl IntoResponse, SalonError> {
    let updated = state
        .appointments
        .apply_status(id, command)
        .instrument(gate.actor_span())
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_appointment(
    State(state): State<AppState>,
    gate: GateContext,
    PathId(id): PathId,
) -> Result<impl IntoResponse, SalonError> {
    state
        .appointments
        .delete(id)
        .instrument(gate.actor_span())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
