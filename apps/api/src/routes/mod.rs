pub mod health;

use axum::{routing::get, routing::post, Router};

use crate::state::AppState;
use crate::tailoring::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/tailor", post(handlers::handle_tailor))
        .route(
            "/api/v1/suggestions/parse",
            post(handlers::handle_parse_suggestions),
        )
        .with_state(state)
}
