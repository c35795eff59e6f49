use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use shared_database::AppState;

use crate::handlers;

pub fn schedule_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/slots", post(handlers::create_slot))
        .route("/slots", get(handlers::list_slots))
        .route("/slots/{slot_id}", get(handlers::get_slot))
        .route("/slots/{slot_id}", put(handlers::update_slot))
        .route("/slots/{slot_id}", delete(handlers::delete_slot))
        .with_state(state)
}
