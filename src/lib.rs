pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
pub mod store;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/callback", post(handlers::webhook::line_webhook))
        .route("/admin", get(handlers::admin::admin_page))
        .route("/admin/delete", get(handlers::admin::delete_reservation))
        .route("/admin/edit_name", post(handlers::admin::edit_name))
        .route("/admin/update_phone", post(handlers::admin::update_phone))
        .route("/admin/mark", get(handlers::admin::mark_status))
        .route(
            "/api/admin/reservations",
            get(handlers::admin::list_reservations),
        )
        .with_state(state)
}
