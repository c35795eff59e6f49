use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::error::AppError;

use crate::models::{DirectoryError, RegisterDoctorRequest, RegisterPatientRequest};
use crate::services::directory::DirectoryService;

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub confirm: Option<bool>,
}

#[axum::debug_handler]
pub async fn register_doctor(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let service = DirectoryService::new(state.db.clone());
    let doctor = service.register_doctor(request).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor
    })))
}

#[axum::debug_handler]
pub async fn list_doctors(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let service = DirectoryService::new(state.db.clone());
    let doctors = service.list_doctors().await.map_err(map_error)?;
    Ok(Json(json!({ "doctors": doctors })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = DirectoryService::new(state.db.clone());
    let doctor = service.get_doctor(doctor_id).await.map_err(map_error)?;
    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<Uuid>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<Value>, AppError> {
    let service = DirectoryService::new(state.db.clone());
    service
        .delete_doctor(doctor_id, params.confirm.unwrap_or(false))
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor deleted"
    })))
}

#[axum::debug_handler]
pub async fn register_patient(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterPatientRequest>,
) -> Result<Json<Value>, AppError> {
    let service = DirectoryService::new(state.db.clone());
    let patient = service.register_patient(request).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "patient": patient
    })))
}

#[axum::debug_handler]
pub async fn list_patients(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let service = DirectoryService::new(state.db.clone());
    let patients = service.list_patients().await.map_err(map_error)?;
    Ok(Json(json!({ "patients": patients })))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = DirectoryService::new(state.db.clone());
    let patient = service.get_patient(patient_id).await.map_err(map_error)?;
    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = DirectoryService::new(state.db.clone());
    service.delete_patient(patient_id).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Patient deleted"
    })))
}

fn map_error(err: DirectoryError) -> AppError {
    match err {
        DirectoryError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        DirectoryError::PatientNotFound => AppError::NotFound("Patient not found".to_string()),
        DirectoryError::DuplicateIdentity => AppError::Conflict(err.to_string()),
        DirectoryError::Validation(msg) => AppError::ValidationError(msg),
        DirectoryError::PatientInUse(_) => AppError::ReferentialIntegrity(err.to_string()),
        DirectoryError::DeletionNeedsConfirmation { .. } => AppError::Conflict(err.to_string()),
        DirectoryError::Database(msg) => AppError::Database(msg),
    }
}
