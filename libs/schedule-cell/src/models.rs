use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A bounded time window during which an offering accepts one booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: Uuid,
    pub offering_id: Uuid,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Slot joined with its owning doctor and booking state, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct TimeSlotSummary {
    pub id: Uuid,
    pub offering_id: Uuid,
    pub doctor_id: Uuid,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub booked: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateSlotRequest {
    pub offering_id: Uuid,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSlotRequest {
    pub offering_id: Option<Uuid>,
    pub slot_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SlotQuery {
    pub offering_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub slot_date: Option<NaiveDate>,
}

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Slot not found")]
    SlotNotFound,

    #[error("Offering not found")]
    OfferingNotFound,

    #[error("Start time {start} must be before end time {end}")]
    InvalidTimeRange { start: NaiveTime, end: NaiveTime },

    #[error("Slot overlaps an existing slot for this doctor on {date} ({start}-{end})")]
    Overlap {
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    },

    #[error("Slot has a booked appointment that deletion would cancel; repeat with confirm=true")]
    DeletionNeedsConfirmation,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for ScheduleError {
    fn from(err: sqlx::Error) -> Self {
        ScheduleError::Database(err.to_string())
    }
}
