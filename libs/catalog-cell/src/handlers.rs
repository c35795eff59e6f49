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

use crate::models::{
    CatalogError, CreateOfferingRequest, CreateServiceRequest, UpdateOfferingRequest,
    UpdateServiceRequest,
};
use crate::services::catalog::CatalogService;
use crate::services::offerings::OfferingService;

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub confirm: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct OfferingQueryParams {
    pub service_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
}

// ==============================================================================
// SERVICE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateServiceRequest>,
) -> Result<Json<Value>, AppError> {
    let catalog = CatalogService::new(state.db.clone());
    let service = catalog.create_service(request).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "service": service
    })))
}

#[axum::debug_handler]
pub async fn list_services(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let catalog = CatalogService::new(state.db.clone());
    let services = catalog.list_services().await.map_err(map_error)?;
    Ok(Json(json!({ "services": services })))
}

#[axum::debug_handler]
pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let catalog = CatalogService::new(state.db.clone());
    let service = catalog.get_service(service_id).await.map_err(map_error)?;
    Ok(Json(json!(service)))
}

#[axum::debug_handler]
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<Uuid>,
    Json(request): Json<UpdateServiceRequest>,
) -> Result<Json<Value>, AppError> {
    let catalog = CatalogService::new(state.db.clone());
    let service = catalog
        .update_service(service_id, request)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "service": service
    })))
}

#[axum::debug_handler]
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<Uuid>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<Value>, AppError> {
    let catalog = CatalogService::new(state.db.clone());
    catalog
        .delete_service(service_id, params.confirm.unwrap_or(false))
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Service deleted"
    })))
}

// ==============================================================================
// OFFERING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_offering(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateOfferingRequest>,
) -> Result<Json<Value>, AppError> {
    let offerings = OfferingService::new(state.db.clone());
    let offering = offerings.create_offering(request).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "offering": offering
    })))
}

#[axum::debug_handler]
pub async fn list_offerings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OfferingQueryParams>,
) -> Result<Json<Value>, AppError> {
    let offerings = OfferingService::new(state.db.clone());
    let result = offerings
        .list_offerings(params.service_id, params.doctor_id)
        .await
        .map_err(map_error)?;
    Ok(Json(json!({ "offerings": result })))
}

#[axum::debug_handler]
pub async fn get_offering(
    State(state): State<Arc<AppState>>,
    Path(offering_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let offerings = OfferingService::new(state.db.clone());
    let offering = offerings.get_offering(offering_id).await.map_err(map_error)?;
    Ok(Json(json!(offering)))
}

#[axum::debug_handler]
pub async fn update_offering(
    State(state): State<Arc<AppState>>,
    Path(offering_id): Path<Uuid>,
    Json(request): Json<UpdateOfferingRequest>,
) -> Result<Json<Value>, AppError> {
    let offerings = OfferingService::new(state.db.clone());
    let offering = offerings
        .update_offering(offering_id, request)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "offering": offering
    })))
}

#[axum::debug_handler]
pub async fn delete_offering(
    State(state): State<Arc<AppState>>,
    Path(offering_id): Path<Uuid>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<Value>, AppError> {
    let offerings = OfferingService::new(state.db.clone());
    offerings
        .delete_offering(offering_id, params.confirm.unwrap_or(false))
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Offering deleted"
    })))
}

fn map_error(err: CatalogError) -> AppError {
    match err {
        CatalogError::ServiceNotFound => AppError::NotFound("Service not found".to_string()),
        CatalogError::OfferingNotFound => AppError::NotFound("Offering not found".to_string()),
        CatalogError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        CatalogError::Validation(msg) => AppError::ValidationError(msg),
        CatalogError::DuplicateOffering => AppError::Conflict(err.to_string()),
        CatalogError::ServiceDeletionNeedsConfirmation { .. }
        | CatalogError::OfferingDeletionNeedsConfirmation { .. } => {
            AppError::Conflict(err.to_string())
        }
        CatalogError::Database(msg) => AppError::Database(msg),
    }
}
