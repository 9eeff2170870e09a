//! Permission gate: a tower layer that enforces one `(resource, action)` pair
//! before the wrapped handler runs.
//!
//! The gate reads the [`Principal`] injected by the authentication layer.
//! No principal yields 401 (carrying the credential failure recorded by the
//! authentication layer, if any), a principal whose roles do not grant the
//! pair yields 403. Otherwise the request continues with a [`GateContext`]
//! naming the permission and the role that granted it.

use axum::{
    body::Body,
    extract::{FromRequestParts, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{info_span, Span};

use super::models::{Action, Permission, Principal, Resource, Role};
use super::policy::PermissionEngine;
use crate::error::SalonError;
use crate::middleware::auth::AuthError;

/// Inserted into request extensions once the gate has granted access.
#[derive(Debug, Clone)]
pub struct GateContext {
    pub principal: Principal,
    pub checked_permission: Permission,
    pub granted_by: Role,
}

impl GateContext {
    /// Span attributing the work done for this request to its caller.
    pub fn actor_span(&self) -> Span {
        info_span!(
            "gated",
            user_id = %self.principal.user_id,
            permission = %self.checked_permission,
            granted_by = %self.granted_by,
        )
    }
}

/// Available only behind a [`RequirePermissionLayer`]; a handler mounted
/// without one is a routing bug and answers 500.
#[axum::async_trait]
impl<S> FromRequestParts<S> for GateContext
where
    S: Send + Sync,
{
    type Rejection = SalonError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<GateContext>()
            .cloned()
            .ok_or_else(|| SalonError::internal("handler mounted without a permission gate"))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tower Layer
// ═══════════════════════════════════════════════════════════════════════════════

/// Layer that wraps services with permission enforcement.
///
/// # Example
///
/// ```rust,ignore
/// use salon_core::rbac::{Action, PermissionEngine, RequirePermissionLayer, Resource};
///
/// let engine = PermissionEngine::standard();
///
/// let app = Router::new().route(
///     "/appointments/:id",
///     delete(delete_appointment)
///         .route_layer(RequirePermissionLayer::new(engine.clone(), Resource::Appointment, Action::Delete)),
/// );
/// ```
#[derive(Clone)]
pub struct RequirePermissionLayer {
    engine: PermissionEngine,
    permission: Permission,
}

impl RequirePermissionLayer {
    pub fn new(engine: PermissionEngine, resource: Resource, action: Action) -> Self {
        Self {
            engine,
            permission: Permission::new(resource, action),
        }
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }
}

impl<S> Layer<S> for RequirePermissionLayer {
    type Service = RequirePermissionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequirePermissionService {
            inner,
            engine: self.engine.clone(),
            permission: self.permission,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tower Service
// ═══════════════════════════════════════════════════════════════════════════════

/// Service that enforces a required permission per request.
#[derive(Clone)]
pub struct RequirePermissionService<S> {
    inner: S,
    engine: PermissionEngine,
    permission: Permission,
}

impl<S> Service<Request<Body>> for RequirePermissionService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let engine = self.engine.clone();
        let permission = self.permission;
        // Take the service that was driven to readiness, leave a fresh clone.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let principal = match request.extensions().get::<Principal>().cloned() {
                Some(principal) => principal,
                None => {
                    let response = match request.extensions().get::<AuthError>().cloned() {
                        Some(rejected) => rejected.into_response(),
                        None => SalonError::unauthorized("authentication required").into_response(),
                    };
                    return Ok(response);
                }
            };

            let granted_by = match engine.grant(&principal.roles, permission.resource, permission.action) {
                Ok(role) => role,
                Err(denied) => return Ok(denied.into_response()),
            };

            request.extensions_mut().insert(GateContext {
                principal,
                checked_permission: permission,
                granted_by,
            });

            inner.call(request).await
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
