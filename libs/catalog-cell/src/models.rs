use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A doctor's declared willingness to provide a given service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offering {
    pub id: Uuid,
    pub service_id: Uuid,
    pub doctor_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Offering joined with its display context, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct OfferingSummary {
    pub id: Uuid,
    pub service_id: Uuid,
    pub service_name: String,
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOfferingRequest {
    pub service_id: Uuid,
    pub doctor_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOfferingRequest {
    pub service_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Service not found")]
    ServiceNotFound,

    #[error("Offering not found")]
    OfferingNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("This doctor already offers this service")]
    DuplicateOffering,

    #[error("Deletion cascades to {offerings} offering(s), {slots} slot(s) and {appointments} appointment(s); repeat with confirm=true")]
    ServiceDeletionNeedsConfirmation {
        offerings: i64,
        slots: i64,
        appointments: i64,
    },

    #[error("Deletion cascades to {slots} slot(s) and {appointments} appointment(s); repeat with confirm=true")]
    OfferingDeletionNeedsConfirmation { slots: i64, appointments: i64 },

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        CatalogError::Database(err.to_string())
    }
}
