use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::Database;

use crate::models::{CatalogError, CreateServiceRequest, Service, UpdateServiceRequest};

/// CRUD over the service catalog. Deleting a service takes its offerings,
/// their slots and any booked appointments with it, so deletion demands an
/// explicit confirmation once dependents exist.
pub struct CatalogService {
    db: Database,
}

impl CatalogService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create_service(
        &self,
        request: CreateServiceRequest,
    ) -> Result<Service, CatalogError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(CatalogError::Validation(
                "Service name must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let service = Service {
            id: Uuid::new_v4(),
            name,
            description: request.description,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO services (id, name, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(service.id.to_string())
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.created_at.to_rfc3339())
        .bind(service.updated_at.to_rfc3339())
        .execute(self.db.pool())
        .await?;

        info!("Created service {} ({})", service.name, service.id);
        Ok(service)
    }

    pub async fn get_service(&self, id: Uuid) -> Result<Service, CatalogError> {
        let row = sqlx::query(
            "SELECT id, name, description, created_at, updated_at FROM services WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(row) => row_to_service(&row),
            None => Err(CatalogError::ServiceNotFound),
        }
    }

    pub async fn list_services(&self) -> Result<Vec<Service>, CatalogError> {
        let rows = sqlx::query(
            "SELECT id, name, description, created_at, updated_at FROM services ORDER BY name",
        )
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(row_to_service).collect()
    }

    pub async fn update_service(
        &self,
        id: Uuid,
        request: UpdateServiceRequest,
    ) -> Result<Service, CatalogError> {
        let mut service = self.get_service(id).await?;

        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(CatalogError::Validation(
                    "Service name must not be empty".to_string(),
                ));
            }
            service.name = name;
        }
        if let Some(description) = request.description {
            service.description = description;
        }
        service.updated_at = Utc::now();

        sqlx::query("UPDATE services SET name = ?, description = ?, updated_at = ? WHERE id = ?")
            .bind(&service.name)
            .bind(&service.description)
            .bind(service.updated_at.to_rfc3339())
            .bind(id.to_string())
            .execute(self.db.pool())
            .await?;

        Ok(service)
    }

    pub async fn delete_service(&self, id: Uuid, confirm: bool) -> Result<(), CatalogError> {
        let id_str = id.to_string();
        debug!("Deleting service {} (confirm={})", id_str, confirm);

        let mut tx = self.db.begin().await?;

        let exists = sqlx::query("SELECT 1 FROM services WHERE id = ?")
            .bind(&id_str)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(CatalogError::ServiceNotFound);
        }

        let offerings: i64 =
            sqlx::query("SELECT COUNT(*) AS n FROM offerings WHERE service_id = ?")
                .bind(&id_str)
                .fetch_one(&mut *tx)
                .await?
                .get("n");
        let slots: i64 = sqlx::query(
            "SELECT COUNT(*) AS n FROM slots s \
             JOIN offerings o ON o.id = s.offering_id WHERE o.service_id = ?",
        )
        .bind(&id_str)
        .fetch_one(&mut *tx)
        .await?
        .get("n");
        let appointments: i64 = sqlx::query(
            "SELECT COUNT(*) AS n FROM appointments a \
             JOIN slots s ON s.id = a.slot_id \
             JOIN offerings o ON o.id = s.offering_id WHERE o.service_id = ?",
        )
        .bind(&id_str)
        .fetch_one(&mut *tx)
        .await?
        .get("n");

        if (offerings > 0 || slots > 0 || appointments > 0) && !confirm {
            return Err(CatalogError::ServiceDeletionNeedsConfirmation {
                offerings,
                slots,
                appointments,
            });
        }

        sqlx::query("DELETE FROM services WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(
            "Deleted service {} ({} offerings, {} slots, {} appointments cascaded)",
            id_str, offerings, slots, appointments
        );
        Ok(())
    }
}

pub(crate) fn row_to_service(row: &SqliteRow) -> Result<Service, CatalogError> {
    Ok(Service {
        id: parse_uuid(row.get("id"))?,
        name: row.get("name"),
        description: row.get("description"),
        created_at: parse_timestamp(row.get("created_at"))?,
        updated_at: parse_timestamp(row.get("updated_at"))?,
    })
}

pub(crate) fn parse_uuid(value: String) -> Result<Uuid, CatalogError> {
    Uuid::parse_str(&value).map_err(|e| CatalogError::Database(format!("Invalid id: {}", e)))
}

pub(crate) fn parse_timestamp(value: String) -> Result<DateTime<Utc>, CatalogError> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CatalogError::Database(format!("Invalid timestamp: {}", e)))
}
