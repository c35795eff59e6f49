use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, Transaction};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::Database;

use crate::models::{
    CreateSlotRequest, ScheduleError, SlotQuery, TimeSlot, TimeSlotSummary, UpdateSlotRequest,
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Scheduling ledger: publishes the time windows a doctor accepts bookings
/// in. Validation and the overlap check run inside the transaction that
/// writes the slot, so a concurrent writer cannot slip a colliding window in
/// between check and insert.
pub struct SlotService {
    db: Database,
}

impl SlotService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create_slot(&self, request: CreateSlotRequest) -> Result<TimeSlot, ScheduleError> {
        validate_time_range(request.start_time, request.end_time)?;

        let mut tx = self.db.begin().await?;

        let doctor_id = offering_doctor(&mut tx, request.offering_id).await?;
        self.check_overlap(
            &mut tx,
            doctor_id,
            request.slot_date,
            request.start_time,
            request.end_time,
            None,
        )
        .await?;

        let now = Utc::now();
        let slot = TimeSlot {
            id: Uuid::new_v4(),
            offering_id: request.offering_id,
            slot_date: request.slot_date,
            start_time: request.start_time,
            end_time: request.end_time,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO slots (id, offering_id, slot_date, start_time, end_time, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(slot.id.to_string())
        .bind(slot.offering_id.to_string())
        .bind(slot.slot_date.format(DATE_FORMAT).to_string())
        .bind(slot.start_time.format(TIME_FORMAT).to_string())
        .bind(slot.end_time.format(TIME_FORMAT).to_string())
        .bind(slot.created_at.to_rfc3339())
        .bind(slot.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        info!(
            "Created slot {} for doctor {} on {} {}-{}",
            slot.id, doctor_id, slot.slot_date, slot.start_time, slot.end_time
        );
        Ok(slot)
    }

    pub async fn update_slot(
        &self,
        id: Uuid,
        request: UpdateSlotRequest,
    ) -> Result<TimeSlot, ScheduleError> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query(
            "SELECT id, offering_id, slot_date, start_time, end_time, created_at, updated_at \
             FROM slots WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ScheduleError::SlotNotFound)?;

        let mut slot = row_to_slot(&row)?;

        if let Some(offering_id) = request.offering_id {
            slot.offering_id = offering_id;
        }
        if let Some(slot_date) = request.slot_date {
            slot.slot_date = slot_date;
        }
        if let Some(start_time) = request.start_time {
            slot.start_time = start_time;
        }
        if let Some(end_time) = request.end_time {
            slot.end_time = end_time;
        }

        validate_time_range(slot.start_time, slot.end_time)?;

        let doctor_id = offering_doctor(&mut tx, slot.offering_id).await?;
        self.check_overlap(
            &mut tx,
            doctor_id,
            slot.slot_date,
            slot.start_time,
            slot.end_time,
            Some(id),
        )
        .await?;

        slot.updated_at = Utc::now();

        sqlx::query(
            "UPDATE slots SET offering_id = ?, slot_date = ?, start_time = ?, end_time = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(slot.offering_id.to_string())
        .bind(slot.slot_date.format(DATE_FORMAT).to_string())
        .bind(slot.start_time.format(TIME_FORMAT).to_string())
        .bind(slot.end_time.format(TIME_FORMAT).to_string())
        .bind(slot.updated_at.to_rfc3339())
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        debug!("Updated slot {}", id);
        Ok(slot)
    }

    pub async fn get_slot(&self, id: Uuid) -> Result<TimeSlotSummary, ScheduleError> {
        let row = sqlx::query(
            "SELECT s.id, s.offering_id, o.doctor_id, s.slot_date, s.start_time, s.end_time, \
             a.id AS appointment_id \
             FROM slots s \
             JOIN offerings o ON o.id = s.offering_id \
             LEFT JOIN appointments a ON a.slot_id = s.id \
             WHERE s.id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(row) => row_to_summary(&row),
            None => Err(ScheduleError::SlotNotFound),
        }
    }

    pub async fn list_slots(&self, query: SlotQuery) -> Result<Vec<TimeSlotSummary>, ScheduleError> {
        let mut sql = String::from(
            "SELECT s.id, s.offering_id, o.doctor_id, s.slot_date, s.start_time, s.end_time, \
             a.id AS appointment_id \
             FROM slots s \
             JOIN offerings o ON o.id = s.offering_id \
             LEFT JOIN appointments a ON a.slot_id = s.id \
             WHERE 1=1",
        );

        let offering_id_str = query.offering_id.map(|id| id.to_string());
        let doctor_id_str = query.doctor_id.map(|id| id.to_string());
        let date_str = query.slot_date.map(|d| d.format(DATE_FORMAT).to_string());

        if offering_id_str.is_some() {
            sql.push_str(" AND s.offering_id = ?");
        }
        if doctor_id_str.is_some() {
            sql.push_str(" AND o.doctor_id = ?");
        }
        if date_str.is_some() {
            sql.push_str(" AND s.slot_date = ?");
        }
        sql.push_str(" ORDER BY s.slot_date, s.start_time");

        let mut sql_query = sqlx::query(&sql);
        if let Some(ref oid) = offering_id_str {
            sql_query = sql_query.bind(oid);
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

    /// Delete a slot. A bound appointment is cancelled by the cascade, so
    /// the caller must confirm once one exists.
    pub async fn delete_slot(&self, id: Uuid, confirm: bool) -> Result<(), ScheduleError> {
        let id_str = id.to_string();

        let mut tx = self.db.begin().await?;

        let exists = sqlx::query("SELECT 1 FROM slots WHERE id = ?")
            .bind(&id_str)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(ScheduleError::SlotNotFound);
        }

        let booked = sqlx::query("SELECT 1 FROM appointments WHERE slot_id = ?")
            .bind(&id_str)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();

        if booked && !confirm {
            return Err(ScheduleError::DeletionNeedsConfirmation);
        }

        sqlx::query("DELETE FROM slots WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        if booked {
            warn!("Deleted slot {} and cancelled its booked appointment", id_str);
        } else {
            info!("Deleted slot {}", id_str);
        }
        Ok(())
    }

    /// Reject the window when it overlaps any other slot of the same doctor
    /// on the same date. Two windows overlap iff start_a < end_b && start_b < end_a.
    async fn check_overlap(
        &self,
        tx: &mut Transaction<'static, Sqlite>,
        doctor_id: Uuid,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        exclude_slot_id: Option<Uuid>,
    ) -> Result<(), ScheduleError> {
        let exclude = exclude_slot_id
            .map(|id| id.to_string())
            .unwrap_or_default();

        let conflict = sqlx::query(
            "SELECT s.start_time, s.end_time FROM slots s \
             JOIN offerings o ON o.id = s.offering_id \
             WHERE o.doctor_id = ? AND s.slot_date = ? \
             AND s.start_time < ? AND ? < s.end_time \
             AND s.id != ? \
             LIMIT 1",
        )
        .bind(doctor_id.to_string())
        .bind(date.format(DATE_FORMAT).to_string())
        .bind(end.format(TIME_FORMAT).to_string())
        .bind(start.format(TIME_FORMAT).to_string())
        .bind(&exclude)
        .fetch_optional(&mut **tx)
        .await?;

        if let Some(row) = conflict {
            let existing_start = parse_time(row.get("start_time"))?;
            let existing_end = parse_time(row.get("end_time"))?;
            warn!(
                "Slot overlap for doctor {} on {}: requested {}-{} collides with {}-{}",
                doctor_id, date, start, end, existing_start, existing_end
            );
            return Err(ScheduleError::Overlap {
                date,
                start: existing_start,
                end: existing_end,
            });
        }

        Ok(())
    }
}

async fn offering_doctor(
    tx: &mut Transaction<'static, Sqlite>,
    offering_id: Uuid,
) -> Result<Uuid, ScheduleError> {
    let row = sqlx::query("SELECT doctor_id FROM offerings WHERE id = ?")
        .bind(offering_id.to_string())
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(ScheduleError::OfferingNotFound)?;

    parse_uuid(row.get("doctor_id"))
}

fn validate_time_range(start: NaiveTime, end: NaiveTime) -> Result<(), ScheduleError> {
    if start >= end {
        return Err(ScheduleError::InvalidTimeRange { start, end });
    }
    Ok(())
}

fn row_to_slot(row: &SqliteRow) -> Result<TimeSlot, ScheduleError> {
    Ok(TimeSlot {
        id: parse_uuid(row.get("id"))?,
        offering_id: parse_uuid(row.get("offering_id"))?,
        slot_date: parse_date(row.get("slot_date"))?,
        start_time: parse_time(row.get("start_time"))?,
        end_time: parse_time(row.get("end_time"))?,
        created_at: parse_timestamp(row.get("created_at"))?,
        updated_at: parse_timestamp(row.get("updated_at"))?,
    })
}

fn row_to_summary(row: &SqliteRow) -> Result<TimeSlotSummary, ScheduleError> {
    let appointment_id: Option<String> = row.get("appointment_id");
    Ok(TimeSlotSummary {
        id: parse_uuid(row.get("id"))?,
        offering_id: parse_uuid(row.get("offering_id"))?,
        doctor_id: parse_uuid(row.get("doctor_id"))?,
        slot_date: parse_date(row.get("slot_date"))?,
        start_time: parse_time(row.get("start_time"))?,
        end_time: parse_time(row.get("end_time"))?,
        booked: appointment_id.is_some(),
    })
}

fn parse_uuid(value: String) -> Result<Uuid, ScheduleError> {
    Uuid::parse_str(&value).map_err(|e| ScheduleError::Database(format!("Invalid id: {}", e)))
}

fn parse_date(value: String) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::parse_from_str(&value, DATE_FORMAT)
        .map_err(|e| ScheduleError::Database(format!("Invalid date: {}", e)))
}

fn parse_time(value: String) -> Result<NaiveTime, ScheduleError> {
    NaiveTime::parse_from_str(&value, TIME_FORMAT)
        .map_err(|e| ScheduleError::Database(format!("Invalid time: {}", e)))
}

fn parse_timestamp(value: String) -> Result<DateTime<Utc>, ScheduleError> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ScheduleError::Database(format!("Invalid timestamp: {}", e)))
}
