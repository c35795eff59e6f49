// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use directory_cell::models::{Doctor, RegisterDoctorRequest};
use directory_cell::services::directory::DirectoryService;
use shared_database::Database;
use tempfile::TempDir;

pub async fn test_db() -> (Database, TempDir) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.db");
    let db = Database::init(path.to_str().unwrap()).await.unwrap();
    (db, dir)
}

pub async fn register_doctor(db: &Database, name: &str) -> Doctor {
    DirectoryService::new(db.clone())
        .register_doctor(RegisterDoctorRequest {
            identity_id: format!("auth0|{}", name),
            full_name: name.to_string(),
            phone: Some("+15550100".to_string()),
        })
        .await
        .unwrap()
}
