use axum::{routing::get, Router};

use super::handlers::*;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Dashboard snapshot
        .route("/stats", get(get_stats))
        .route("/api/stats", get(get_stats))

        // Trade history
        .route("/trades", get(get_trades))

        .with_state(state)
}
