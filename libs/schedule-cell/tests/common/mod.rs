// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use catalog_cell::models::{CreateOfferingRequest, CreateServiceRequest};
use catalog_cell::services::catalog::CatalogService;
use catalog_cell::services::offerings::OfferingService;
use chrono::{NaiveDate, NaiveTime};
use directory_cell::models::RegisterDoctorRequest;
use directory_cell::services::directory::DirectoryService;
use shared_database::Database;
use tempfile::TempDir;
use uuid::Uuid;

pub async fn test_db() -> (Database, TempDir) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.db");
    let db = Database::init(path.to_str().unwrap()).await.unwrap();
    (db, dir)
}

/// Register a doctor and declare an offering for them; returns
/// (doctor_id, offering_id).
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

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").unwrap()
}
