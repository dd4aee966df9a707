//! API route definitions.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, SharedState};

/// Creates the API router with all routes configured
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .with_state(state)
}

fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/analyze", post(handlers::analyze))
}

/// Prints all available routes for logging
pub fn print_routes() {
    tracing::info!("Available API routes:");
    tracing::info!("  GET  /api/health  - Health check");
    tracing::info!("  POST /api/analyze - Full graph analysis");
}
