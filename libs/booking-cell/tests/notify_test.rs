mod common;

use assert_matches::assert_matches;
use booking_cell::models::BookAppointmentRequest;
use booking_cell::services::booking::BookingService;
use booking_cell::services::notify::{ConfirmationNotifier, NotifyError};
use common::{date, offering_for, publish_slot, register_patient, test_db, time};
use shared_config::AppConfig;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(gateway_url: &str) -> AppConfig {
    AppConfig {
        database_url: "clinic.db".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        sms_gateway_url: gateway_url.to_string(),
        sms_gateway_token: "test-token".to_string(),
        sms_from_number: "+15550000".to_string(),
    }
}

#[tokio::test]
async fn confirmation_posts_the_code_and_window_to_the_gateway() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_partial_json(serde_json::json!({
            "to": "+15550123",
            "from": "+15550000"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let notifier = ConfirmationNotifier::new(
        format!("{}/messages", mock_server.uri()),
        "test-token".to_string(),
        "+15550000".to_string(),
    );

    notifier
        .send_confirmation(
            "+15550123",
            "AB23CD",
            date("2025-05-01"),
            time("09:00"),
            time("10:00"),
        )
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    let text = body["body"].as_str().unwrap();
    assert!(text.contains("AB23CD"));
    assert!(text.contains("2025-05-01"));
}

#[tokio::test]
async fn gateway_rejections_surface_as_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let notifier = ConfirmationNotifier::new(
        mock_server.uri(),
        "test-token".to_string(),
        "+15550000".to_string(),
    );

    let err = notifier
        .send_confirmation(
            "+15550123",
            "AB23CD",
            date("2025-05-01"),
            time("09:00"),
            time("10:00"),
        )
        .await
        .unwrap_err();

    assert_matches!(err, NotifyError::Gateway { status: 500, .. });
}

#[tokio::test]
async fn notifier_requires_full_gateway_configuration() {
    let mut config = test_config("https://sms.example.com/messages");
    assert!(ConfirmationNotifier::from_config(&config).is_some());

    config.sms_gateway_token = String::new();
    assert!(ConfirmationNotifier::from_config(&config).is_none());
}

/// A failing gateway must never reach the booking caller: the booking has
/// already committed when the notification goes out.
#[tokio::test]
async fn booking_survives_a_dead_gateway() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let (db, _dir) = test_db().await;
    let (_, offering) = offering_for(&db, "Alice Moreno", "Cardiology").await;
    let slot = publish_slot(&db, offering, "2025-05-01", "09:00", "10:00").await;
    let patient = register_patient(&db, "Carla Ruiz").await;

    let notifier = Arc::new(ConfirmationNotifier::new(
        mock_server.uri(),
        "test-token".to_string(),
        "+15550000".to_string(),
    ));
    let booking = BookingService::new(db).with_notifier(Some(notifier));

    let appointment = booking
        .book_appointment(BookAppointmentRequest {
            slot_id: slot.id,
            patient_id: patient.id,
            reservation_code: None,
        })
        .await
        .unwrap();

    assert_eq!(appointment.slot_id, slot.id);
}
