use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{is_unique_violation, Database};

use crate::models::{
    DirectoryError, Doctor, Patient, RegisterDoctorRequest, RegisterPatientRequest,
};

pub struct DirectoryService {
    db: Database,
}

impl DirectoryService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn register_doctor(
        &self,
        request: RegisterDoctorRequest,
    ) -> Result<Doctor, DirectoryError> {
        validate_identity(&request.identity_id, &request.full_name)?;

        let doctor = Doctor {
            id: Uuid::new_v4(),
            identity_id: request.identity_id.trim().to_string(),
            full_name: request.full_name.trim().to_string(),
            phone: request.phone,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO doctors (id, identity_id, full_name, phone, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(doctor.id.to_string())
        .bind(&doctor.identity_id)
        .bind(&doctor.full_name)
        .bind(&doctor.phone)
        .bind(doctor.created_at.to_rfc3339())
        .execute(self.db.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DirectoryError::DuplicateIdentity
            } else {
                e.into()
            }
        })?;

        info!("Registered doctor {} ({})", doctor.full_name, doctor.id);
        Ok(doctor)
    }

    pub async fn register_patient(
        &self,
        request: RegisterPatientRequest,
    ) -> Result<Patient, DirectoryError> {
        validate_identity(&request.identity_id, &request.full_name)?;

        let patient = Patient {
            id: Uuid::new_v4(),
            identity_id: request.identity_id.trim().to_string(),
            full_name: request.full_name.trim().to_string(),
            phone: request.phone,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO patients (id, identity_id, full_name, phone, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(patient.id.to_string())
        .bind(&patient.identity_id)
        .bind(&patient.full_name)
        .bind(&patient.phone)
        .bind(patient.created_at.to_rfc3339())
        .execute(self.db.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DirectoryError::DuplicateIdentity
            } else {
                e.into()
            }
        })?;

        info!("Registered patient {} ({})", patient.full_name, patient.id);
        Ok(patient)
    }

    pub async fn get_doctor(&self, id: Uuid) -> Result<Doctor, DirectoryError> {
        let row = sqlx::query(
            "SELECT id, identity_id, full_name, phone, created_at FROM doctors WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(row) => row_to_doctor(&row),
            None => Err(DirectoryError::DoctorNotFound),
        }
    }

    pub async fn get_patient(&self, id: Uuid) -> Result<Patient, DirectoryError> {
        let row = sqlx::query(
            "SELECT id, identity_id, full_name, phone, created_at FROM patients WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(row) => row_to_patient(&row),
            None => Err(DirectoryError::PatientNotFound),
        }
    }

    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, DirectoryError> {
        let rows = sqlx::query(
            "SELECT id, identity_id, full_name, phone, created_at FROM doctors ORDER BY full_name",
        )
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(row_to_doctor).collect()
    }

    pub async fn list_patients(&self) -> Result<Vec<Patient>, DirectoryError> {
        let rows = sqlx::query(
            "SELECT id, identity_id, full_name, phone, created_at FROM patients ORDER BY full_name",
        )
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(row_to_patient).collect()
    }

    /// Delete a doctor record. The schema cascades through offerings, slots
    /// and appointments, so when dependents exist the caller must repeat the
    /// request with `confirm` set.
    pub async fn delete_doctor(&self, id: Uuid, confirm: bool) -> Result<(), DirectoryError> {
        let id_str = id.to_string();
        debug!("Deleting doctor {} (confirm={})", id_str, confirm);

        let mut tx = self.db.begin().await?;

        let exists = sqlx::query("SELECT 1 FROM doctors WHERE id = ?")
            .bind(&id_str)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(DirectoryError::DoctorNotFound);
        }

        let offerings: i64 = sqlx::query("SELECT COUNT(*) AS n FROM offerings WHERE doctor_id = ?")
            .bind(&id_str)
            .fetch_one(&mut *tx)
            .await?
            .get("n");
        let slots: i64 = sqlx::query(
            "SELECT COUNT(*) AS n FROM slots s \
             JOIN offerings o ON o.id = s.offering_id WHERE o.doctor_id = ?",
        )
        .bind(&id_str)
        .fetch_one(&mut *tx)
        .await?
        .get("n");
        let appointments: i64 = sqlx::query(
            "SELECT COUNT(*) AS n FROM appointments a \
             JOIN slots s ON s.id = a.slot_id \
             JOIN offerings o ON o.id = s.offering_id WHERE o.doctor_id = ?",
        )
        .bind(&id_str)
        .fetch_one(&mut *tx)
        .await?
        .get("n");

        if (offerings > 0 || slots > 0 || appointments > 0) && !confirm {
            return Err(DirectoryError::DeletionNeedsConfirmation {
                offerings,
                slots,
                appointments,
            });
        }

        sqlx::query("DELETE FROM doctors WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(
            "Deleted doctor {} ({} offerings, {} slots, {} appointments cascaded)",
            id_str, offerings, slots, appointments
        );
        Ok(())
    }

    /// Delete a patient record. Refused while any appointment still
    /// references the patient (protect, not cascade).
    pub async fn delete_patient(&self, id: Uuid) -> Result<(), DirectoryError> {
        let id_str = id.to_string();

        let held: i64 = sqlx::query("SELECT COUNT(*) AS n FROM appointments WHERE patient_id = ?")
            .bind(&id_str)
            .fetch_one(self.db.pool())
            .await?
            .get("n");
        if held > 0 {
            return Err(DirectoryError::PatientInUse(held));
        }

        let result = sqlx::query("DELETE FROM patients WHERE id = ?")
            .bind(&id_str)
            .execute(self.db.pool())
            .await
            .map_err(|e| {
                if shared_database::is_foreign_key_violation(&e) {
                    // Racer booked between the count and the delete.
                    DirectoryError::PatientInUse(1)
                } else {
                    DirectoryError::from(e)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(DirectoryError::PatientNotFound);
        }

        info!("Deleted patient {}", id_str);
        Ok(())
    }
}

fn validate_identity(identity_id: &str, full_name: &str) -> Result<(), DirectoryError> {
    if identity_id.trim().is_empty() {
        return Err(DirectoryError::Validation(
            "identity_id must not be empty".to_string(),
        ));
    }
    if full_name.trim().is_empty() {
        return Err(DirectoryError::Validation(
            "full_name must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn row_to_doctor(row: &SqliteRow) -> Result<Doctor, DirectoryError> {
    Ok(Doctor {
        id: parse_uuid(row.get("id"))?,
        identity_id: row.get("identity_id"),
        full_name: row.get("full_name"),
        phone: row.get("phone"),
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}

fn row_to_patient(row: &SqliteRow) -> Result<Patient, DirectoryError> {
    Ok(Patient {
        id: parse_uuid(row.get("id"))?,
        identity_id: row.get("identity_id"),
        full_name: row.get("full_name"),
        phone: row.get("phone"),
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}

fn parse_uuid(value: String) -> Result<Uuid, DirectoryError> {
    Uuid::parse_str(&value).map_err(|e| DirectoryError::Database(format!("Invalid id: {}", e)))
}

fn parse_timestamp(value: String) -> Result<DateTime<Utc>, DirectoryError> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DirectoryError::Database(format!("Invalid timestamp: {}", e)))
}
