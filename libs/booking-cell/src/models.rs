use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub patient_id: Uuid,
    pub reservation_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Appointment joined with its slot and patient context, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentSummary {
    pub id: Uuid,
    pub reservation_code: String,
    pub slot_id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Deserialize)]
pub struct BookAppointmentRequest {
    pub slot_id: Uuid,
    pub patient_id: Uuid,
    /// Optional caller-supplied code; generated when absent.
    pub reservation_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub slot_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppointmentQuery {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub slot_date: Option<NaiveDate>,
}

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Slot not found")]
    SlotNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Slot already has a booked appointment")]
    SlotTaken,

    #[error("Patient already holds an appointment on {date} between {start} and {end}")]
    PatientDoubleBooked {
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    },

    #[error("Invalid reservation code: {0}")]
    InvalidReservationCode(String),

    #[error("Reservation code {0} is already in use")]
    DuplicateReservationCode(String),

    #[error("Could not allocate a unique reservation code")]
    CodeSpaceExhausted,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for BookingError {
    fn from(err: sqlx::Error) -> Self {
        BookingError::Database(err.to_string())
    }
}
