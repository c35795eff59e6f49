use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, Transaction};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::Database;

use crate::models::{
    Appointment, AppointmentQuery, AppointmentSummary, BookAppointmentRequest, BookingError,
    UpdateAppointmentRequest,
};
use crate::services::notify::ConfirmationNotifier;
use crate::services::reservation;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Booking register. Every create/update runs its availability checks and
/// its write inside one transaction; the UNIQUE constraints on slot_id and
/// reservation_code arbitrate anything that slips past a concurrent racer's
/// snapshot, so the loser gets a conflict, never a partial write.
pub struct BookingService {
    db: Database,
    notifier: Option<Arc<ConfirmationNotifier>>,
}

/// Slot fields the booking checks and the confirmation message need.
struct SlotContext {
    doctor_id: Uuid,
    slot_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
}

impl BookingService {
    pub fn new(db: Database) -> Self {
        Self { db, notifier: None }
    }

    pub fn with_notifier(mut self, notifier: Option<Arc<ConfirmationNotifier>>) -> Self {
        self.notifier = notifier;
        self
    }

    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, BookingError> {
        debug!(
            "Booking slot {} for patient {}",
            request.slot_id, request.patient_id
        );

        let mut tx = self.db.begin().await?;

        let slot = fetch_slot(&mut tx, request.slot_id).await?;
        let patient_phone = fetch_patient_phone(&mut tx, request.patient_id).await?;

        let taken = sqlx::query("SELECT 1 FROM appointments WHERE slot_id = ?")
            .bind(request.slot_id.to_string())
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if taken {
            return Err(BookingError::SlotTaken);
        }

        check_patient_window(&mut tx, request.patient_id, &slot, None).await?;

        let code = match request.reservation_code {
            Some(code) => {
                let code = code.trim().to_uppercase();
                if !reservation::is_valid_code(&code) {
                    return Err(BookingError::InvalidReservationCode(code));
                }
                if code_in_use(&mut tx, &code).await? {
                    return Err(BookingError::DuplicateReservationCode(code));
                }
                code
            }
            None => allocate_code(&mut tx).await?,
        };

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            slot_id: request.slot_id,
            patient_id: request.patient_id,
            reservation_code: code,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO appointments (id, slot_id, patient_id, reservation_code, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(appointment.id.to_string())
        .bind(appointment.slot_id.to_string())
        .bind(appointment.patient_id.to_string())
        .bind(&appointment.reservation_code)
        .bind(appointment.created_at.to_rfc3339())
        .bind(appointment.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_constraint(e, &appointment.reservation_code))?;
        tx.commit().await?;

        info!(
            "Booked appointment {} (code {}) for patient {} with doctor {} on slot {}",
            appointment.id,
            appointment.reservation_code,
            appointment.patient_id,
            slot.doctor_id,
            appointment.slot_id
        );

        self.spawn_confirmation(patient_phone, appointment.reservation_code.clone(), slot);

        Ok(appointment)
    }

    /// Rebind an appointment to a different slot and/or patient, re-running
    /// the exclusivity checks minus the appointment's own binding.
    pub async fn update_appointment(
        &self,
        id: Uuid,
        request: UpdateAppointmentRequest,
    ) -> Result<Appointment, BookingError> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query(
            "SELECT id, slot_id, patient_id, reservation_code, created_at, updated_at \
             FROM appointments WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(BookingError::AppointmentNotFound)?;

        let mut appointment = row_to_appointment(&row)?;

        if let Some(slot_id) = request.slot_id {
            appointment.slot_id = slot_id;
        }
        if let Some(patient_id) = request.patient_id {
            appointment.patient_id = patient_id;
        }

        let slot = fetch_slot(&mut tx, appointment.slot_id).await?;
        fetch_patient_phone(&mut tx, appointment.patient_id).await?;

        let taken = sqlx::query("SELECT 1 FROM appointments WHERE slot_id = ? AND id != ?")
            .bind(appointment.slot_id.to_string())
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if taken {
            return Err(BookingError::SlotTaken);
        }

        check_patient_window(&mut tx, appointment.patient_id, &slot, Some(id)).await?;

        appointment.updated_at = Utc::now();

        sqlx::query(
            "UPDATE appointments SET slot_id = ?, patient_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(appointment.slot_id.to_string())
        .bind(appointment.patient_id.to_string())
        .bind(appointment.updated_at.to_rfc3339())
        .bind(id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_constraint(e, &appointment.reservation_code))?;
        tx.commit().await?;

        info!("Rescheduled appointment {} onto slot {}", id, appointment.slot_id);
        Ok(appointment)
    }

    /// Cancellation is always permitted and frees the slot.
    pub async fn cancel_appointment(&self, id: Uuid) -> Result<(), BookingError> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = ?")
            .bind(id.to_string())
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(BookingError::AppointmentNotFound);
        }

        info!("Cancelled appointment {}", id);
        Ok(())
    }

    pub async fn get_appointment(&self, id: Uuid) -> Result<AppointmentSummary, BookingError> {
        let row = sqlx::query(&format!("{} WHERE a.id = ?", SUMMARY_SELECT))
            .bind(id.to_string())
            .fetch_optional(self.db.pool())
            .await?;

        match row {
            Some(row) => row_to_summary(&row),
            None => Err(BookingError::AppointmentNotFound),
        }
    }

    pub async fn list_appointments(
        &self,
        query: AppointmentQuery,
    ) -> Result<Vec<AppointmentSummary>, BookingError> {
        let mut sql = format!("{} WHERE 1=1", SUMMARY_SELECT);

        let patient_id_str = query.patient_id.map(|id| id.to_string());
        let doctor_id_str = query.doctor_id.map(|id| id.to_string());
        let date_str = query.slot_date.map(|d| d.format(DATE_FORMAT).to_string());

        if patient_id_str.is_some() {
            sql.push_str(" AND a.patient_id = ?");
        }
        if doctor_id_str.is_some() {
            sql.push_str(" AND o.doctor_id = ?");
        }
        if date_str.is_some() {
            sql.push_str(" AND s.slot_date = ?");
        }
        sql.push_str(" ORDER BY s.slot_date, s.start_time");

        let mut sql_query = sqlx::query(&sql);
        if let Some(ref pid) = patient_id_str {
            sql_query = sql_query.bind(pid);
        }
        if let Some(ref did) = doctor_id_str {
            sql_query = sql_query.bind(did);
        }
        if let Some(ref date) = date_str {
            sql_query = sql_query.bind(date);
        }

        let rows = sql_query.fetch_all(self.db.pool()).await?;
        rows.iter().map(row_to_summary).collect()
    }

    /// Fire-and-forget: the booking has already committed, so a failed or
    /// slow gateway must never reach the caller.
    fn spawn_confirmation(&self, phone: Option<String>, code: String, slot: SlotContext) {
        let Some(notifier) = self.notifier.clone() else {
            return;
        };
        let Some(phone) = phone else {
            debug!("Patient has no phone number, skipping booking confirmation");
            return;
        };

        tokio::spawn(async move {
            if let Err(e) = notifier
                .send_confirmation(&phone, &code, slot.slot_date, slot.start_time, slot.end_time)
                .await
            {
                warn!("Booking confirmation failed (booking unaffected): {}", e);
            }
        });
    }
}

const SUMMARY_SELECT: &str =
    "SELECT a.id, a.reservation_code, a.slot_id, o.doctor_id, a.patient_id, \
     p.full_name AS patient_name, s.slot_date, s.start_time, s.end_time \
     FROM appointments a \
     JOIN slots s ON s.id = a.slot_id \
     JOIN offerings o ON o.id = s.offering_id \
     JOIN patients p ON p.id = a.patient_id";

async fn fetch_slot(
    tx: &mut Transaction<'static, Sqlite>,
    slot_id: Uuid,
) -> Result<SlotContext, BookingError> {
    let row = sqlx::query(
        "SELECT o.doctor_id, s.slot_date, s.start_time, s.end_time \
         FROM slots s JOIN offerings o ON o.id = s.offering_id WHERE s.id = ?",
    )
    .bind(slot_id.to_string())
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(BookingError::SlotNotFound)?;

    Ok(SlotContext {
        doctor_id: parse_uuid(row.get("doctor_id"))?,
        slot_date: parse_date(row.get("slot_date"))?,
        start_time: parse_time(row.get("start_time"))?,
        end_time: parse_time(row.get("end_time"))?,
    })
}

async fn fetch_patient_phone(
    tx: &mut Transaction<'static, Sqlite>,
    patient_id: Uuid,
) -> Result<Option<String>, BookingError> {
    let row = sqlx::query("SELECT phone FROM patients WHERE id = ?")
        .bind(patient_id.to_string())
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(BookingError::PatientNotFound)?;

    Ok(row.get("phone"))
}

/// Reject when the patient already holds an appointment whose slot overlaps
/// the requested window on the same date.
async fn check_patient_window(
    tx: &mut Transaction<'static, Sqlite>,
    patient_id: Uuid,
    slot: &SlotContext,
    exclude_appointment_id: Option<Uuid>,
) -> Result<(), BookingError> {
    let exclude = exclude_appointment_id
        .map(|id| id.to_string())
        .unwrap_or_default();

    let clash = sqlx::query(
        "SELECT s.slot_date, s.start_time, s.end_time FROM appointments a \
         JOIN slots s ON s.id = a.slot_id \
         WHERE a.patient_id = ? AND s.slot_date = ? \
         AND s.start_time < ? AND ? < s.end_time \
         AND a.id != ? \
         LIMIT 1",
    )
    .bind(patient_id.to_string())
    .bind(slot.slot_date.format(DATE_FORMAT).to_string())
    .bind(slot.end_time.format(TIME_FORMAT).to_string())
    .bind(slot.start_time.format(TIME_FORMAT).to_string())
    .bind(&exclude)
    .fetch_optional(&mut **tx)
    .await?;

    if let Some(row) = clash {
        return Err(BookingError::PatientDoubleBooked {
            date: parse_date(row.get("slot_date"))?,
            start: parse_time(row.get("start_time"))?,
            end: parse_time(row.get("end_time"))?,
        });
    }

    Ok(())
}

async fn code_in_use(
    tx: &mut Transaction<'static, Sqlite>,
    code: &str,
) -> Result<bool, BookingError> {
    let row = sqlx::query("SELECT 1 FROM appointments WHERE reservation_code = ?")
        .bind(code)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(row.is_some())
}

/// Draw codes until a free one turns up, bounded so an (astronomically
/// unlikely) exhausted code space degrades into a retryable error.
async fn allocate_code(tx: &mut Transaction<'static, Sqlite>) -> Result<String, BookingError> {
    for attempt in 1..=reservation::MAX_GENERATION_ATTEMPTS {
        let candidate = reservation::generate_code();
        if !code_in_use(tx, &candidate).await? {
            return Ok(candidate);
        }
        debug!(
            "Reservation code collision on attempt {}/{}",
            attempt,
            reservation::MAX_GENERATION_ATTEMPTS
        );
    }

    warn!("Reservation code space exhausted after {} attempts", reservation::MAX_GENERATION_ATTEMPTS);
    Err(BookingError::CodeSpaceExhausted)
}

/// A racer that validated against a stale snapshot lands here when the
/// UNIQUE constraints reject its insert.
fn map_constraint(err: sqlx::Error, code: &str) -> BookingError {
    if shared_database::is_unique_violation(&err) {
        let message = err
            .as_database_error()
            .map(|e| e.message().to_string())
            .unwrap_or_default();
        if message.contains("reservation_code") {
            return BookingError::DuplicateReservationCode(code.to_string());
        }
        return BookingError::SlotTaken;
    }
    err.into()
}

fn row_to_appointment(row: &SqliteRow) -> Result<Appointment, BookingError> {
    Ok(Appointment {
        id: parse_uuid(row.get("id"))?,
        slot_id: parse_uuid(row.get("slot_id"))?,
        patient_id: parse_uuid(row.get("patient_id"))?,
        reservation_code: row.get("reservation_code"),
        created_at: parse_timestamp(row.get("created_at"))?,
        updated_at: parse_timestamp(row.get("updated_at"))?,
    })
}

fn row_to_summary(row: &SqliteRow) -> Result<AppointmentSummary, BookingError> {
    Ok(AppointmentSummary {
        id: parse_uuid(row.get("id"))?,
        reservation_code: row.get("reservation_code"),
        slot_id: parse_uuid(row.get("slot_id"))?,
        doctor_id: parse_uuid(row.get("doctor_id"))?,
        patient_id: parse_uuid(row.get("patient_id"))?,
        patient_name: row.get("patient_name"),
        slot_date: parse_date(row.get("slot_date"))?,
        start_time: parse_time(row.get("start_time"))?,
        end_time: parse_time(row.get("end_time"))?,
    })
}

fn parse_uuid(value: String) -> Result<Uuid, BookingError> {
    Uuid::parse_str(&value).map_err(|e| BookingError::Database(format!("Invalid id: {}", e)))
}

fn parse_date(value: String) -> Result<NaiveDate, BookingError> {
    NaiveDate::parse_from_str(&value, DATE_FORMAT)
        .map_err(|e| BookingError::Database(format!("Invalid date: {}", e)))
}

fn parse_time(value: String) -> Result<NaiveTime, BookingError> {
    NaiveTime::parse_from_str(&value, TIME_FORMAT)
        .map_err(|e| BookingError::Database(format!("Invalid time: {}", e)))
}

fn parse_timestamp(value: String) -> Result<DateTime<Utc>, BookingError> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| BookingError::Database(format!("Invalid timestamp: {}", e)))
}
