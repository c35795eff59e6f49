// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use catalog_cell::models::{CreateOfferingRequest, CreateServiceRequest};
use catalog_cell::services::catalog::CatalogService;
use catalog_cell::services::offerings::OfferingService;
use chrono::{NaiveDate, NaiveTime};
use directory_cell::models::{Patient, RegisterDoctorRequest, RegisterPatientRequest};
use directory_cell::services::directory::DirectoryService;
use schedule_cell::models::{CreateSlotRequest, TimeSlot};
use schedule_cell::services::slots::SlotService;
use shared_database::Database;
use tempfile::TempDir;
use uuid::Uuid;

pub async fn test_db() -> (Database, TempDir) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.db");
    let db = Database::init(path.to_str().unwrap()).await.unwrap();
    (db, dir)
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").unwrap()
}

pub async fn register_patient(db: &Database, name: &str) -> Patient {
    DirectoryService::new(db.clone())
        .register_patient(RegisterPatientRequest {
            identity_id: format!("auth0|{}", name),
            full_name: name.to_string(),
            phone: Some("+15550123".to_string()),
        })
        .await
        .unwrap()
}

/// Doctor + service + offering in one go; returns (doctor_id, offering_id).
pub async fn offering_for(db: &Database, doctor_name: &str, service_name: &str) -> (Uuid, Uuid) {
    let doctor = DirectoryService::new(db.clone())
        .register_doctor(RegisterDoctorRequest {
            identity_id: format!("auth0|{}", doctor_name),
            full_name: doctor_name.to_string(),
            phone: None,
        })
        .await
        .unwrap();

    let service = CatalogService::new(db.clone())
        .create_service(CreateServiceRequest {
            name: format!("{} ({})", service_name, doctor_name),
            description: String::new(),
        })
        .await
        .unwrap();

    let offering = OfferingService::new(db.clone())
        .create_offering(CreateOfferingRequest {
            service_id: service.id,
            doctor_id: doctor.id,
        })
        .await
        .unwrap();

    (doctor.id, offering.id)
}

pub async fn publish_slot(
    db: &Database,
    offering_id: Uuid,
    day: &str,
    start: &str,
    end: &str,
) -> TimeSlot {
    SlotService::new(db.clone())
        .create_slot(CreateSlotRequest {
            offering_id,
            slot_date: date(day),
            start_time: time(start),
            end_time: time(end),
        })
        .await
        .unwrap()
}
