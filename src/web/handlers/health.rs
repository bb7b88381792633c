//! Health check endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::web::state::SharedState;
use crate::web::utils::now_millis;

pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.lock().await;
    let uptime_ms = now_millis().saturating_sub(state.started_at);

    let body = serde_json::json!({
        "status": "ok",
        "message": format!("mailpix tracking service (up {}s)", uptime_ms / 1000),
        "timestamp": now_millis(),
    });
    (StatusCode::OK, axum::Json(body))
}
