//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use salon_core::api::{build_router, AppState};
use salon_core::appointments::{AppointmentService, BookingPolicies};
use salon_core::middleware::{AuthConfig, Authenticator, Claims};
use salon_core::rbac::PermissionEngine;
use salon_core::store::{Business, InMemoryStore, Profile, Service};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

pub const SECRET: &str = "integration-test-secret";

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 15, hour, minute, 0).unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub store: InMemoryStore,
    pub authenticator: Arc<Authenticator>,
    pub business: Business,
    pub service: Service,
    pub customer: Profile,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_policies(BookingPolicies::default())
    }

    pub fn with_policies(policies: BookingPolicies) -> Self {
        let store = InMemoryStore::new();
        let business = store.add_business("Shear Bliss");
        let service = store.add_service(business.id, "Balayage");
        let customer = store.add_profile("Ada Lovelace");

        let authenticator = Arc::new(
            Authenticator::new(AuthConfig::builder().jwt_secret(SECRET).build()).unwrap(),
        );

        let state = AppState {
            appointments: AppointmentService::new(Arc::new(store.clone()), policies),
            permissions: PermissionEngine::standard(),
            identity: authenticator.clone(),
        };

        Self {
            router: build_router(state, Duration::from_secs(5)),
            store,
            authenticator,
            business,
            service,
            customer,
        }
    }

    /// A signed token for a fresh user holding `roles`.
    pub fn token(&self, roles: &[&str]) -> String {
        let claims = Claims::builder(Uuid::new_v4())
            .roles(roles.iter().copied())
            .build();
        self.authenticator.generate_token(&claims).unwrap()
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub fn create_body(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Value {
        serde_json::json!({
            "service_id": self.service.id,
            "user_id": self.customer.id,
            "start_time": start.to_rfc3339(),
            "end_time": end.to_rfc3339(),
        })
    }

    pub fn appointments_uri(&self) -> String {
        format!("/businesses/{}/appointments", self.business.id)
    }
}
