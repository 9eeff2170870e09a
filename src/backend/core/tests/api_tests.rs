//! End-to-end tests against the real router with the in-memory store.
//!
//! Tests cover:
//! - Appointment lifecycle (create, approve, reschedule, update, delete)
//! - Authentication (401) and permission gate (403) outcomes
//! - Validation and referential failures with their messages
//! - Double-booking and transition policies
//! - Concurrent creates, health, metrics, request ids

mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::{at, TestApp};
use salon_core::appointments::{BookingPolicies, DoubleBookingPolicy, TransitionPolicy};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

fn data(body: &Value) -> &Value {
    assert_eq!(body["success"], json!(true), "unexpected body: {body}");
    &body["data"]
}

fn error_message(body: &Value) -> &str {
    assert_eq!(body["success"], json!(false), "unexpected body: {body}");
    body["error"]["message"].as_str().unwrap()
}

async fn create_pending(app: &TestApp, token: &str) -> String {
    let (status, body) = app
        .send(
            Method::POST,
            &app.appointments_uri(),
            Some(token),
            Some(app.create_body(at(10, 0), at(11, 0))),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    data(&body)["id"].as_str().unwrap().to_string()
}

// ============================================================================
// Appointment Lifecycle
// ============================================================================

#[tokio::test]
async fn test_create_returns_pending_appointment() {
    let app = TestApp::new();
    let token = app.token(&["customer"]);

    let mut body = app.create_body(at(10, 0), at(11, 0));
    body["status"] = json!("confirmed");

    let (status, body) = app.send(Method::POST, &app.appointments_uri(), Some(&token), Some(body)).await;

    assert_eq!(status, StatusCode::CREATED);
    let appointment = data(&body);
    assert_eq!(appointment["status"], "pending");
    assert_eq!(appointment["business_id"], json!(app.business.id));
    assert_eq!(appointment["user_id"], json!(app.customer.id));
    assert_eq!(appointment["business_customer_id"], Value::Null);
    assert_eq!(app.store.appointment_count(), 1);
}

#[tokio::test]
async fn test_approve_then_reschedule() {
    let app = TestApp::new();
    let token = app.token(&["businessOwner"]);
    let id = create_pending(&app, &token).await;
    let status_uri = format!("/appointments/{}/status", id);

    let (status, body) = app
        .send(Method::PATCH, &status_uri, Some(&token), Some(json!({"action": "approve"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body)["status"], "confirmed");

    let (status, body) = app
        .send(
            Method::PATCH,
            &status_uri,
            Some(&token),
            Some(json!({
                "action": "reschedule",
                "start_time": "2024-02-15T15:00:00Z",
                "end_time": "2024-02-15T15:45:00Z",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let moved = data(&body);
    assert_eq!(moved["status"], "pending");
    assert_eq!(moved["start_time"], json!(at(15, 0)));
    assert_eq!(moved["end_time"], json!(at(15, 45)));
}

#[tokio::test]
async fn test_approving_twice_stays_confirmed() {
    let app = TestApp::new();
    let token = app.token(&["businessOwner"]);
    let id = create_pending(&app, &token).await;
    let status_uri = format!("/appointments/{}/status", id);

    for _ in 0..2 {
        let (status, body) = app
            .send(Method::PATCH, &status_uri, Some(&token), Some(json!({"action": "approve"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(data(&body)["status"], "confirmed");
    }
}

#[tokio::test]
async fn test_get_list_update_delete() {
    let app = TestApp::new();
    let token = app.token(&["businessOwner"]);
    let id = create_pending(&app, &token).await;
    let uri = format!("/appointments/{}", id);

    let (status, body) = app.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body)["id"], json!(id));

    let (status, body) = app.send(Method::GET, &app.appointments_uri(), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body).as_array().unwrap().len(), 1);

    let staff_id = Uuid::new_v4();
    let (status, body) = app
        .send(Method::PUT, &uri, Some(&token), Some(json!({"staff_id": staff_id, "status": "completed"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body)["staff_id"], json!(staff_id));
    assert_eq!(data(&body)["status"], "completed");

    let (status, body) = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = app.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "appointment not found");
}

#[tokio::test]
async fn test_concurrent_identical_creates_both_succeed() {
    let app = TestApp::new();
    let token = app.token(&["customer"]);
    let uri = app.appointments_uri();
    let body = app.create_body(at(10, 0), at(11, 0));

    let (first, second) = tokio::join!(
        app.send(Method::POST, &uri, Some(&token), Some(body.clone())),
        app.send(Method::POST, &uri, Some(&token), Some(body.clone())),
    );

    assert_eq!(first.0, StatusCode::CREATED);
    assert_eq!(second.0, StatusCode::CREATED);
    assert_ne!(data(&first.1)["id"], data(&second.1)["id"]);
    assert_eq!(app.store.appointment_count(), 2);
}

// ============================================================================
// Validation and References
// ============================================================================

#[tokio::test]
async fn test_service_of_another_business_is_rejected() {
    let app = TestApp::new();
    let token = app.token(&["customer"]);
    let other = app.store.add_business("Elsewhere");
    let foreign = app.store.add_service(other.id, "Shave");

    let mut body = app.create_body(at(10, 0), at(11, 0));
    body["service_id"] = json!(foreign.id);

    let (status, body) = app.send(Method::POST, &app.appointments_uri(), Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(&body),
        "service not found or does not belong to this business"
    );
    assert_eq!(app.store.appointment_count(), 0);
}

#[tokio::test]
async fn test_unknown_business_is_not_found() {
    let app = TestApp::new();
    let token = app.token(&["customer"]);
    let uri = format!("/businesses/{}/appointments", Uuid::new_v4());

    let (status, body) = app
        .send(Method::POST, &uri, Some(&token), Some(app.create_body(at(10, 0), at(11, 0))))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "business not found");
}

#[tokio::test]
async fn test_both_customer_references_rejected() {
    let app = TestApp::new();
    let token = app.token(&["customer"]);
    let walk_in = app.store.add_business_customer(app.business.id, "Walk-in");

    let mut body = app.create_body(at(10, 0), at(11, 0));
    body["business_customer_id"] = json!(walk_in.id);

    let (status, body) = app.send(Method::POST, &app.appointments_uri(), Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(&body),
        "either user or business-customer must be set, not both or neither"
    );
}

#[tokio::test]
async fn test_inverted_window_rejected_on_create_and_reschedule() {
    let app = TestApp::new();
    let token = app.token(&["businessOwner"]);

    let (status, body) = app
        .send(
            Method::POST,
            &app.appointments_uri(),
            Some(&token),
            Some(app.create_body(at(11, 0), at(10, 0))),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "end_time must be strictly after start_time");

    let id = create_pending(&app, &token).await;
    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/appointments/{}/status", id),
            Some(&token),
            Some(json!({
                "action": "reschedule",
                "start_time": "2024-02-15T12:00:00Z",
                "end_time": "2024-02-15T12:00:00Z",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "end_time must be strictly after start_time");
}

#[tokio::test]
async fn test_status_body_errors() {
    let app = TestApp::new();
    let token = app.token(&["businessOwner"]);
    let id = create_pending(&app, &token).await;
    let status_uri = format!("/appointments/{}/status", id);

    let (status, body) = app
        .send(Method::PATCH, &status_uri, Some(&token), Some(json!({"action": "archive"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "invalid action");

    let (status, body) = app
        .send(
            Method::PATCH,
            &status_uri,
            Some(&token),
            Some(json!({"action": "reschedule", "start_time": "2024-02-15T12:00:00Z"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "missing start_time or end_time for reschedule");

    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/appointments/{}/status", Uuid::new_v4()),
            Some(&token),
            Some(json!({"action": "cancel"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_uniform_body_errors_use_specific_codes() {
    let app = TestApp::new();
    let token = app.token(&["businessOwner"]);

    let (status, body) = app
        .send(Method::POST, &app.appointments_uri(), Some(&token), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MISSING_REQUIRED_FIELD");
    assert_eq!(app.store.appointment_count(), 0);

    let id = create_pending(&app, &token).await;
    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/appointments/{}", id),
            Some(&token),
            Some(json!({"staff_id": "nope", "start_time": "later"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_FORMAT");
}

#[tokio::test]
async fn test_malformed_path_id_is_bad_request() {
    let app = TestApp::new();
    let token = app.token(&["customer"]);
    let (status, body) = app.send(Method::GET, "/appointments/not-a-uuid", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

// ============================================================================
// Authentication and Permission Gate
// ============================================================================

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new();
    let (status, body) = app
        .send(Method::POST, &app.appointments_uri(), None, Some(app.create_body(at(10, 0), at(11, 0))))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
    assert_eq!(app.store.appointment_count(), 0);
}

#[tokio::test]
async fn test_tampered_token_is_unauthorized() {
    let app = TestApp::new();
    let token = format!("{}x", app.token(&["admin"]));
    let (status, body) = app.send(Method::GET, &app.appointments_uri(), Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_bad_credentials_do_not_block_ungated_routes() {
    let app = TestApp::new();
    let tampered = format!("{}x", app.token(&["admin"]));

    for token in ["garbage", tampered.as_str()] {
        let (status, body) = app.send(Method::GET, "/health", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, _) = app.send(Method::GET, "/metrics", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app.send(Method::GET, "/me/permissions", Some(token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_TOKEN");

        let (status, body) = app.send(Method::GET, &app.appointments_uri(), Some(token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    }
}

#[tokio::test]
async fn test_customer_cannot_delete() {
    let app = TestApp::new();
    let owner = app.token(&["businessOwner"]);
    let customer = app.token(&["customer"]);
    let id = create_pending(&app, &owner).await;

    let (status, body) = app
        .send(Method::DELETE, &format!("/appointments/{}", id), Some(&customer), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_message(&body), "missing permission appointment:delete");
    assert_eq!(app.store.appointment_count(), 1);
}

#[tokio::test]
async fn test_staff_and_empty_roles_are_forbidden() {
    let app = TestApp::new();
    for roles in [&["businessStaff"][..], &[][..], &["superuser"][..]] {
        let token = app.token(roles);
        let (status, _) = app
            .send(
                Method::POST,
                &app.appointments_uri(),
                Some(&token),
                Some(app.create_body(at(10, 0), at(11, 0))),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "roles {:?}", roles);
    }
    assert_eq!(app.store.appointment_count(), 0);
}

#[tokio::test]
async fn test_gate_runs_before_body_validation() {
    let app = TestApp::new();
    let token = app.token(&["businessStaff"]);
    let (status, _) = app
        .send(Method::POST, &app.appointments_uri(), Some(&token), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_union_of_roles_grants_delete() {
    let app = TestApp::new();
    let owner = app.token(&["businessOwner"]);
    let id = create_pending(&app, &owner).await;

    let mixed = app.token(&["customer", "businessOwner"]);
    let (status, _) = app
        .send(Method::DELETE, &format!("/appointments/{}", id), Some(&mixed), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_my_permissions() {
    let app = TestApp::new();
    let token = app.token(&["customer"]);

    let (status, body) = app.send(Method::GET, "/me/permissions", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let perms = data(&body);
    assert_eq!(perms["roles"], json!(["customer"]));
    assert_eq!(perms["permissions"]["appointment"], json!(["create", "update", "view"]));
    assert!(perms["permissions"].get("admin-user").is_none());

    let (status, _) = app.send(Method::GET, "/me/permissions", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Policies
// ============================================================================

#[tokio::test]
async fn test_strict_policy_rejects_approve_after_cancel() {
    let app = TestApp::with_policies(BookingPolicies {
        transition_policy: TransitionPolicy::Strict,
        ..BookingPolicies::default()
    });
    let token = app.token(&["businessOwner"]);
    let id = create_pending(&app, &token).await;
    let status_uri = format!("/appointments/{}/status", id);

    let (status, _) = app
        .send(Method::PATCH, &status_uri, Some(&token), Some(json!({"action": "cancel"})))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(Method::PATCH, &status_uri, Some(&token), Some(json!({"action": "approve"})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_STATE_TRANSITION");
}

#[tokio::test]
async fn test_reject_policy_refuses_overlap() {
    let app = TestApp::with_policies(BookingPolicies {
        double_booking: DoubleBookingPolicy::Reject,
        ..BookingPolicies::default()
    });
    let token = app.token(&["customer"]);
    create_pending(&app, &token).await;

    let (status, body) = app
        .send(
            Method::POST,
            &app.appointments_uri(),
            Some(&token),
            Some(app.create_body(at(10, 30), at(11, 30))),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "SCHEDULING_CONFLICT");
    assert_eq!(app.store.appointment_count(), 1);
}

#[tokio::test]
async fn test_reject_policy_refuses_moves_into_taken_slot() {
    let app = TestApp::with_policies(BookingPolicies {
        double_booking: DoubleBookingPolicy::Reject,
        ..BookingPolicies::default()
    });
    let token = app.token(&["businessOwner"]);
    let morning = create_pending(&app, &token).await;

    let (status, body) = app
        .send(
            Method::POST,
            &app.appointments_uri(),
            Some(&token),
            Some(app.create_body(at(12, 0), at(13, 0))),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let noon = data(&body)["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/appointments/{}/status", noon),
            Some(&token),
            Some(json!({
                "action": "reschedule",
                "start_time": "2024-02-15T10:00:00Z",
                "end_time": "2024-02-15T11:00:00Z",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "SCHEDULING_CONFLICT");
    assert_eq!(body["error"]["details"]["entity_id"], json!(morning));

    let uri = format!("/appointments/{}", noon);
    let (status, body) = app
        .send(
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({
                "start_time": "2024-02-15T10:30:00Z",
                "end_time": "2024-02-15T11:30:00Z",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "SCHEDULING_CONFLICT");

    let (_, body) = app.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(data(&body)["start_time"], json!(at(12, 0)));
}

// ============================================================================
// System Endpoints
// ============================================================================

#[tokio::test]
async fn test_health_is_ungated() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn test_unknown_route_uses_error_envelope() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "route not found");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-123");

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
