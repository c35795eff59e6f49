mod common;

use assert_matches::assert_matches;
use common::{date, offering_for, test_db, time};
use schedule_cell::models::{CreateSlotRequest, ScheduleError, SlotQuery, UpdateSlotRequest};
use schedule_cell::services::slots::SlotService;
use uuid::Uuid;

fn slot_request(offering_id: Uuid, day: &str, start: &str, end: &str) -> CreateSlotRequest {
    CreateSlotRequest {
        offering_id,
        slot_date: date(day),
        start_time: time(start),
        end_time: time(end),
    }
}

#[tokio::test]
async fn valid_ranges_pass_and_inverted_ranges_fail() {
    let (db, _dir) = test_db().await;
    let (_, offering) = offering_for(&db, "Alice Moreno", "Cardiology").await;
    let slots = SlotService::new(db);

    slots
        .create_slot(slot_request(offering, "2025-05-01", "09:00", "10:00"))
        .await
        .unwrap();

    let err = slots
        .create_slot(slot_request(offering, "2025-05-02", "10:00", "09:00"))
        .await
        .unwrap_err();
    assert_matches!(err, ScheduleError::InvalidTimeRange { .. });

    let err = slots
        .create_slot(slot_request(offering, "2025-05-02", "09:00", "09:00"))
        .await
        .unwrap_err();
    assert_matches!(err, ScheduleError::InvalidTimeRange { .. });
}

#[tokio::test]
async fn overlapping_windows_for_one_doctor_are_rejected() {
    let (db, _dir) = test_db().await;
    let (_, offering) = offering_for(&db, "Alice Moreno", "Cardiology").await;
    let slots = SlotService::new(db);

    // Slot A: 09:00-10:00.
    slots
        .create_slot(slot_request(offering, "2025-05-01", "09:00", "10:00"))
        .await
        .unwrap();

    // Slot B: 09:30-10:30 overlaps A.
    let err = slots
        .create_slot(slot_request(offering, "2025-05-01", "09:30", "10:30"))
        .await
        .unwrap_err();
    assert_matches!(err, ScheduleError::Overlap { .. });

    // Slot C: 10:00-11:00 is adjacent, not overlapping.
    slots
        .create_slot(slot_request(offering, "2025-05-01", "10:00", "11:00"))
        .await
        .unwrap();

    // Same window on another date is fine.
    slots
        .create_slot(slot_request(offering, "2025-05-02", "09:30", "10:30"))
        .await
        .unwrap();
}

#[tokio::test]
async fn overlap_applies_across_all_offerings_of_a_doctor() {
    let (db, _dir) = test_db().await;
    let (_, cardio) = offering_for(&db, "Alice Moreno", "Cardiology").await;
    let slots = SlotService::new(db.clone());

    // Second offering for the same doctor (different service).
    let service = catalog_cell::services::catalog::CatalogService::new(db.clone())
        .create_service(catalog_cell::models::CreateServiceRequest {
            name: "Checkups".to_string(),
            description: String::new(),
        })
        .await
        .unwrap();
    let first = catalog_cell::services::offerings::OfferingService::new(db.clone())
        .get_offering(cardio)
        .await
        .unwrap();
    let checkups = catalog_cell::services::offerings::OfferingService::new(db)
        .create_offering(catalog_cell::models::CreateOfferingRequest {
            service_id: service.id,
            doctor_id: first.doctor_id,
        })
        .await
        .unwrap();

    slots
        .create_slot(slot_request(cardio, "2025-05-01", "09:00", "10:00"))
        .await
        .unwrap();

    // The doctor is one person: a colliding window under another offering
    // is still a collision.
    let err = slots
        .create_slot(slot_request(checkups.id, "2025-05-01", "09:30", "10:30"))
        .await
        .unwrap_err();
    assert_matches!(err, ScheduleError::Overlap { .. });
}

#[tokio::test]
async fn different_doctors_may_share_a_window() {
    let (db, _dir) = test_db().await;
    let (_, alice) = offering_for(&db, "Alice Moreno", "Cardiology").await;
    let (_, bruno) = offering_for(&db, "Bruno Silva", "Cardiology").await;
    let slots = SlotService::new(db);

    slots
        .create_slot(slot_request(alice, "2025-05-01", "09:00", "10:00"))
        .await
        .unwrap();
    slots
        .create_slot(slot_request(bruno, "2025-05-01", "09:00", "10:00"))
        .await
        .unwrap();
}

#[tokio::test]
async fn update_excludes_the_slot_being_updated() {
    let (db, _dir) = test_db().await;
    let (_, offering) = offering_for(&db, "Alice Moreno", "Cardiology").await;
    let slots = SlotService::new(db);

    let morning = slots
        .create_slot(slot_request(offering, "2025-05-01", "09:00", "10:00"))
        .await
        .unwrap();
    slots
        .create_slot(slot_request(offering, "2025-05-01", "11:00", "12:00"))
        .await
        .unwrap();

    // Extending a slot over itself is not a conflict.
    let updated = slots
        .update_slot(
            morning.id,
            UpdateSlotRequest {
                offering_id: None,
                slot_date: None,
                start_time: None,
                end_time: Some(time("10:30")),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.end_time, time("10:30"));

    // Extending it into the 11:00 slot is.
    let err = slots
        .update_slot(
            morning.id,
            UpdateSlotRequest {
                offering_id: None,
                slot_date: None,
                start_time: None,
                end_time: Some(time("11:30")),
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ScheduleError::Overlap { .. });
}

#[tokio::test]
async fn lists_filter_by_doctor_and_date() {
    let (db, _dir) = test_db().await;
    let (alice_id, alice) = offering_for(&db, "Alice Moreno", "Cardiology").await;
    let (_, bruno) = offering_for(&db, "Bruno Silva", "Cardiology").await;
    let slots = SlotService::new(db);

    slots
        .create_slot(slot_request(alice, "2025-05-01", "09:00", "10:00"))
        .await
        .unwrap();
    slots
        .create_slot(slot_request(alice, "2025-05-02", "09:00", "10:00"))
        .await
        .unwrap();
    slots
        .create_slot(slot_request(bruno, "2025-05-01", "09:00", "10:00"))
        .await
        .unwrap();

    let alices = slots
        .list_slots(SlotQuery {
            doctor_id: Some(alice_id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(alices.len(), 2);
    assert!(alices.iter().all(|s| !s.booked));

    let first_of_may = slots
        .list_slots(SlotQuery {
            slot_date: Some(date("2025-05-01")),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(first_of_may.len(), 2);
}

#[tokio::test]
async fn unbooked_slots_delete_without_confirmation() {
    let (db, _dir) = test_db().await;
    let (_, offering) = offering_for(&db, "Alice Moreno", "Cardiology").await;
    let slots = SlotService::new(db);

    let slot = slots
        .create_slot(slot_request(offering, "2025-05-01", "09:00", "10:00"))
        .await
        .unwrap();
    slots.delete_slot(slot.id, false).await.unwrap();

    assert_matches!(
        slots.get_slot(slot.id).await.unwrap_err(),
        ScheduleError::SlotNotFound
    );
}

#[tokio::test]
async fn missing_offering_is_reported() {
    let (db, _dir) = test_db().await;
    let slots = SlotService::new(db);

    let err = slots
        .create_slot(slot_request(Uuid::new_v4(), "2025-05-01", "09:00", "10:00"))
        .await
        .unwrap_err();
    assert_matches!(err, ScheduleError::OfferingNotFound);
}
