use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::error::AppError;

use crate::models::{
    AppointmentQuery, BookAppointmentRequest, BookingError, UpdateAppointmentRequest,
};
use crate::services::booking::BookingService;
use crate::services::notify::ConfirmationNotifier;

fn booking_service(state: &AppState) -> BookingService {
    let notifier = ConfirmationNotifier::from_config(&state.config).map(Arc::new);
    BookingService::new(state.db.clone()).with_notifier(notifier)
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = booking_service(&state);
    let appointment = service.book_appointment(request).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<Value>, AppError> {
    let service = booking_service(&state);
    let appointments = service.list_appointments(query).await.map_err(map_error)?;
    Ok(Json(json!({ "appointments": appointments })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = booking_service(&state);
    let appointment = service.get_appointment(appointment_id).await.map_err(map_error)?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = booking_service(&state);
    let appointment = service
        .update_appointment(appointment_id, request)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = booking_service(&state);
    service.cancel_appointment(appointment_id).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment cancelled"
    })))
}

fn map_error(err: BookingError) -> AppError {
    match err {
        BookingError::AppointmentNotFound => {
            AppError::NotFound("Appointment not found".to_string())
        }
        BookingError::SlotNotFound => AppError::NotFound("Slot not found".to_string()),
        BookingError::PatientNotFound => AppError::NotFound("Patient not found".to_string()),
        BookingError::SlotTaken
        | BookingError::PatientDoubleBooked { .. }
        | BookingError::DuplicateReservationCode(_) => AppError::Conflict(err.to_string()),
        BookingError::InvalidReservationCode(_) => AppError::ValidationError(err.to_string()),
        BookingError::CodeSpaceExhausted => AppError::ServiceUnavailable(err.to_string()),
        BookingError::Database(msg) => AppError::Database(msg),
    }
}
