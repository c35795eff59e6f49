use std::sync::Arc;

use axum::{routing::get, Router};

use booking_cell::router::booking_routes;
use catalog_cell::router::catalog_routes;
use directory_cell::router::directory_routes;
use schedule_cell::router::schedule_routes;
use shared_database::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic booking API is running!" }))
        .merge(directory_routes(state.clone()))
        .merge(catalog_routes(state.clone()))
        .merge(schedule_routes(state.clone()))
        .merge(booking_routes(state))
}
