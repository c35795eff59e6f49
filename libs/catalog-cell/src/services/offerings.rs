use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{is_unique_violation, Database};

use crate::models::{CatalogError, CreateOfferingRequest, Offering, OfferingSummary, UpdateOfferingRequest};
use crate::services::catalog::{parse_timestamp, parse_uuid};

/// Doctor x service pairings. A pair is unique: a doctor declares an
/// offering once, and slots hang off that declaration.
pub struct OfferingService {
    db: Database,
}

impl OfferingService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create_offering(
        &self,
        request: CreateOfferingRequest,
    ) -> Result<Offering, CatalogError> {
        let mut tx = self.db.begin().await?;

        let service_exists = sqlx::query("SELECT 1 FROM services WHERE id = ?")
            .bind(request.service_id.to_string())
            .fetch_optional(&mut *tx)
            .await?;
        if service_exists.is_none() {
            return Err(CatalogError::ServiceNotFound);
        }

        let doctor_exists = sqlx::query("SELECT 1 FROM doctors WHERE id = ?")
            .bind(request.doctor_id.to_string())
            .fetch_optional(&mut *tx)
            .await?;
        if doctor_exists.is_none() {
            return Err(CatalogError::DoctorNotFound);
        }

        let offering = Offering {
            id: Uuid::new_v4(),
            service_id: request.service_id,
            doctor_id: request.doctor_id,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO offerings (id, service_id, doctor_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(offering.id.to_string())
        .bind(offering.service_id.to_string())
        .bind(offering.doctor_id.to_string())
        .bind(offering.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CatalogError::DuplicateOffering
            } else {
                e.into()
            }
        })?;
        tx.commit().await?;

        info!(
            "Created offering {} (doctor {}, service {})",
            offering.id, offering.doctor_id, offering.service_id
        );
        Ok(offering)
    }

    pub async fn get_offering(&self, id: Uuid) -> Result<OfferingSummary, CatalogError> {
        let row = sqlx::query(
            "SELECT o.id, o.service_id, s.name AS service_name, o.doctor_id, \
             d.full_name AS doctor_name, o.created_at \
             FROM offerings o \
             JOIN services s ON s.id = o.service_id \
             JOIN doctors d ON d.id = o.doctor_id \
             WHERE o.id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(row) => row_to_summary(&row),
            None => Err(CatalogError::OfferingNotFound),
        }
    }

    pub async fn list_offerings(
        &self,
        service_id: Option<Uuid>,
        doctor_id: Option<Uuid>,
    ) -> Result<Vec<OfferingSummary>, CatalogError> {
        let mut query = String::from(
            "SELECT o.id, o.service_id, s.name AS service_name, o.doctor_id, \
             d.full_name AS doctor_name, o.created_at \
             FROM offerings o \
             JOIN services s ON s.id = o.service_id \
             JOIN doctors d ON d.id = o.doctor_id \
             WHERE 1=1",
        );

        let service_id_str = service_id.map(|id| id.to_string());
        let doctor_id_str = doctor_id.map(|id| id.to_string());

        if service_id_str.is_some() {
            query.push_str(" AND o.service_id = ?");
        }
        if doctor_id_str.is_some() {
            query.push_str(" AND o.doctor_id = ?");
        }
        query.push_str(" ORDER BY s.name, d.full_name");

        let mut sql_query = sqlx::query(&query);
        if let Some(ref sid) = service_id_str {
            sql_query = sql_query.bind(sid);
        }
        if let Some(ref did) = doctor_id_str {
            sql_query = sql_query.bind(did);
        }

        let rows = sql_query.fetch_all(self.db.pool()).await?;
        rows.iter().map(row_to_summary).collect()
    }

    /// Rebind an offering to a different service and/or doctor. The same
    /// uniqueness rule applies to the new pair.
    pub async fn update_offering(
        &self,
        id: Uuid,
        request: UpdateOfferingRequest,
    ) -> Result<Offering, CatalogError> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query(
            "SELECT id, service_id, doctor_id, created_at FROM offerings WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CatalogError::OfferingNotFound)?;

        let mut offering = Offering {
            id,
            service_id: parse_uuid(row.get("service_id"))?,
            doctor_id: parse_uuid(row.get("doctor_id"))?,
            created_at: parse_timestamp(row.get("created_at"))?,
        };

        if let Some(service_id) = request.service_id {
            let exists = sqlx::query("SELECT 1 FROM services WHERE id = ?")
                .bind(service_id.to_string())
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                return Err(CatalogError::ServiceNotFound);
            }
            offering.service_id = service_id;
        }
        if let Some(doctor_id) = request.doctor_id {
            let exists = sqlx::query("SELECT 1 FROM doctors WHERE id = ?")
                .bind(doctor_id.to_string())
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                return Err(CatalogError::DoctorNotFound);
            }
            offering.doctor_id = doctor_id;
        }

        sqlx::query("UPDATE offerings SET service_id = ?, doctor_id = ? WHERE id = ?")
            .bind(offering.service_id.to_string())
            .bind(offering.doctor_id.to_string())
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    CatalogError::DuplicateOffering
                } else {
                    e.into()
                }
            })?;
        tx.commit().await?;

        Ok(offering)
    }

    pub async fn delete_offering(&self, id: Uuid, confirm: bool) -> Result<(), CatalogError> {
        let id_str = id.to_string();
        debug!("Deleting offering {} (confirm={})", id_str, confirm);

        let mut tx = self.db.begin().await?;

        let exists = sqlx::query("SELECT 1 FROM offerings WHERE id = ?")
            .bind(&id_str)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(CatalogError::OfferingNotFound);
        }

        let slots: i64 = sqlx::query("SELECT COUNT(*) AS n FROM slots WHERE offering_id = ?")
            .bind(&id_str)
            .fetch_one(&mut *tx)
            .await?
            .get("n");
        let appointments: i64 = sqlx::query(
            "SELECT COUNT(*) AS n FROM appointments a \
             JOIN slots s ON s.id = a.slot_id WHERE s.offering_id = ?",
        )
        .bind(&id_str)
        .fetch_one(&mut *tx)
        .await?
        .get("n");

        if (slots > 0 || appointments > 0) && !confirm {
            return Err(CatalogError::OfferingDeletionNeedsConfirmation {
                slots,
                appointments,
            });
        }

        sqlx::query("DELETE FROM offerings WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(
            "Deleted offering {} ({} slots, {} appointments cascaded)",
            id_str, slots, appointments
        );
        Ok(())
    }
}

fn row_to_summary(row: &SqliteRow) -> Result<OfferingSummary, CatalogError> {
    Ok(OfferingSummary {
        id: parse_uuid(row.get("id"))?,
        service_id: parse_uuid(row.get("service_id"))?,
        service_name: row.get("service_name"),
        doctor_id: parse_uuid(row.get("doctor_id"))?,
        doctor_name: row.get("doctor_name"),
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}
