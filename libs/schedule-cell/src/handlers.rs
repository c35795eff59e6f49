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

use crate::models::{CreateSlotRequest, ScheduleError, SlotQuery, UpdateSlotRequest};
use crate::services::slots::SlotService;

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub confirm: Option<bool>,
}

#[axum::debug_handler]
pub async fn create_slot(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSlotRequest>,
) -> Result<Json<Value>, AppError> {
    let slots = SlotService::new(state.db.clone());
    let slot = slots.create_slot(request).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "slot": slot
    })))
}

#[axum::debug_handler]
pub async fn list_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = SlotService::new(state.db.clone());
    let result = slots.list_slots(query).await.map_err(map_error)?;
    Ok(Json(json!({ "slots": result })))
}

#[axum::debug_handler]
pub async fn get_slot(
    State(state): State<Arc<AppState>>,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let slots = SlotService::new(state.db.clone());
    let slot = slots.get_slot(slot_id).await.map_err(map_error)?;
    Ok(Json(json!(slot)))
}

#[axum::debug_handler]
pub async fn update_slot(
    State(state): State<Arc<AppState>>,
    Path(slot_id): Path<Uuid>,
    Json(request): Json<UpdateSlotRequest>,
) -> Result<Json<Value>, AppError> {
    let slots = SlotService::new(state.db.clone());
    let slot = slots.update_slot(slot_id, request).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "slot": slot
    })))
}

#[axum::debug_handler]
pub async fn delete_slot(
    State(state): State<Arc<AppState>>,
    Path(slot_id): Path<Uuid>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<Value>, AppError> {
    let slots = SlotService::new(state.db.clone());
    slots
        .delete_slot(slot_id, params.confirm.unwrap_or(false))
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Slot deleted"
    })))
}

fn map_error(err: ScheduleError) -> AppError {
    match err {
        ScheduleError::SlotNotFound => AppError::NotFound("Slot not found".to_string()),
        ScheduleError::OfferingNotFound => AppError::NotFound("Offering not found".to_string()),
        ScheduleError::InvalidTimeRange { .. } => AppError::ValidationError(err.to_string()),
        ScheduleError::Overlap { .. } => AppError::Conflict(err.to_string()),
        ScheduleError::DeletionNeedsConfirmation => AppError::Conflict(err.to_string()),
        ScheduleError::Database(msg) => AppError::Database(msg),
    }
}
