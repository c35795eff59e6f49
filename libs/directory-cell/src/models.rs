use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Reference record for a doctor. Credentials and sessions live in the
/// external identity provider; `identity_id` points back at it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub identity_id: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub identity_id: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterDoctorRequest {
    pub identity_id: String,
    pub full_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterPatientRequest {
    pub identity_id: String,
    pub full_name: String,
    pub phone: Option<String>,
}

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("A record for this identity already exists")]
    DuplicateIdentity,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Patient still holds {0} appointment(s)")]
    PatientInUse(i64),

    #[error("Doctor deletion cascades to {offerings} offering(s), {slots} slot(s) and {appointments} appointment(s); repeat with confirm=true")]
    DeletionNeedsConfirmation {
        offerings: i64,
        slots: i64,
        appointments: i64,
    },

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for DirectoryError {
    fn from(err: sqlx::Error) -> Self {
        DirectoryError::Database(err.to_string())
    }
}
