use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use shared_database::AppState;

use crate::handlers;

pub fn catalog_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/services", post(handlers::create_service))
        .route("/services", get(handlers::list_services))
        .route("/services/{service_id}", get(handlers::get_service))
        .route("/services/{service_id}", put(handlers::update_service))
        .route("/services/{service_id}", delete(handlers::delete_service))
        .route("/offerings", post(handlers::create_offering))
        .route("/offerings", get(handlers::list_offerings))
        .route("/offerings/{offering_id}", get(handlers::get_offering))
        .route("/offerings/{offering_id}", put(handlers::update_offering))
        .route("/offerings/{offering_id}", delete(handlers::delete_offering))
        .with_state(state)
}
