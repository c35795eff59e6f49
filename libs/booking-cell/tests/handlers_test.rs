mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use booking_cell::router::booking_routes;
use common::{offering_for, publish_slot, register_patient, test_db};
use serde_json::{json, Value};
use shared_config::AppConfig;
use shared_database::{AppState, Database};
use tower::ServiceExt;

fn test_state(db: Database) -> Arc<AppState> {
    let config = AppConfig {
        database_url: "clinic.db".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        sms_gateway_url: String::new(),
        sms_gateway_token: String::new(),
        sms_from_number: String::new(),
    };
    Arc::new(AppState::new(config, db))
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_booking(slot_id: &str, patient_id: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/appointments")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_vec(&json!({
                "slot_id": slot_id,
                "patient_id": patient_id,
            }))
            .unwrap(),
        ))
        .unwrap()
}

#[tokio::test]
async fn booking_endpoint_books_once_and_conflicts_after() {
    let (db, _dir) = test_db().await;
    let (_, offering) = offering_for(&db, "Alice Moreno", "Cardiology").await;
    let slot = publish_slot(&db, offering, "2025-05-01", "09:00", "10:00").await;
    let carla = register_patient(&db, "Carla Ruiz").await;
    let diego = register_patient(&db, "Diego Vega").await;

    let app = booking_routes(test_state(db));

    let response = app
        .clone()
        .oneshot(post_booking(&slot.id.to_string(), &carla.id.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["success"], json!(true));
    let code = body["appointment"]["reservation_code"].as_str().unwrap();
    assert_eq!(code.len(), 6);

    let response = app
        .oneshot(post_booking(&slot.id.to_string(), &diego.id.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = response_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("booked"));
}

#[tokio::test]
async fn unknown_appointments_return_not_found() {
    let (db, _dir) = test_db().await;
    let app = booking_routes(test_state(db));

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/appointments/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_codes_are_bad_requests() {
    let (db, _dir) = test_db().await;
    let (_, offering) = offering_for(&db, "Alice Moreno", "Cardiology").await;
    let slot = publish_slot(&db, offering, "2025-05-01", "09:00", "10:00").await;
    let carla = register_patient(&db, "Carla Ruiz").await;

    let app = booking_routes(test_state(db));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/appointments")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_vec(&json!({
                        "slot_id": slot.id.to_string(),
                        "patient_id": carla.id.to_string(),
                        "reservation_code": "nope",
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
