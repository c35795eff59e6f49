use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use shared_database::AppState;

use crate::handlers;

pub fn booking_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/appointments", post(handlers::book_appointment))
        .route("/appointments", get(handlers::list_appointments))
        .route("/appointments/{appointment_id}", get(handlers::get_appointment))
        .route("/appointments/{appointment_id}", put(handlers::update_appointment))
        .route("/appointments/{appointment_id}", delete(handlers::cancel_appointment))
        .with_state(state)
}
