//! Axum router construction.

use axum::routing::get;
use axum::Router;

use crate::web::handlers;
use crate::web::state::SharedState;

/// Build the complete Axum router with the pixel endpoint and read APIs.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        // Tracking pixel
        .route("/track/:pixel", get(handlers::pixel::pixel_handler))
        // Read APIs
        .route(
            "/api/recent-opens",
            get(handlers::tracking::recent_opens_handler),
        )
        .route(
            "/api/tracking/:tracking_id",
            get(handlers::tracking::get_tracking_handler),
        )
        .route(
            "/api/all-tracking",
            get(handlers::tracking::all_tracking_handler),
        )
        // Health / status page
        .route("/health", get(handlers::health::health_handler))
        .route("/", get(handlers::index::index_handler))
        .with_state(state)
}
