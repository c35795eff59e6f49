use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use shared_database::AppState;

use crate::handlers;

pub fn directory_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/doctors", post(handlers::register_doctor))
        .route("/doctors", get(handlers::list_doctors))
        .route("/doctors/{doctor_id}", get(handlers::get_doctor))
        .route("/doctors/{doctor_id}", delete(handlers::delete_doctor))
        .route("/patients", post(handlers::register_patient))
        .route("/patients", get(handlers::list_patients))
        .route("/patients/{patient_id}", get(handlers::get_patient))
        .route("/patients/{patient_id}", delete(handlers::delete_patient))
        .with_state(state)
}
