//! Read APIs over the tracking table.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::tracker::GRACE_WINDOW_MS;
use crate::web::config::ALL_TRACKING_LIMIT;
use crate::web::state::SharedState;
use crate::web::utils::{api_error, now_millis, open_to_json, parse_since};

#[derive(Deserialize)]
pub struct RecentOpensQuery {
    since: Option<String>,
}

/// Genuine opens since the cutoff (default: the last hour), newest first.
pub async fn recent_opens_handler(
    State(state): State<SharedState>,
    Query(params): Query<RecentOpensQuery>,
) -> Response {
    let now = now_millis();
    let since = parse_since(params.since.as_deref(), now);

    let st = state.lock().await;
    match st.storage.list_recent_opens(since, now, GRACE_WINDOW_MS) {
        Ok(rows) => {
            let json: Vec<serde_json::Value> = rows.iter().map(open_to_json).collect();
            (StatusCode::OK, axum::Json(serde_json::json!(json))).into_response()
        }
        Err(e) => api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

pub async fn get_tracking_handler(
    State(state): State<SharedState>,
    Path(tracking_id): Path<String>,
) -> Response {
    let st = state.lock().await;
    match st.storage.get_tracking(&tracking_id) {
        Ok(Some(row)) => (StatusCode::OK, axum::Json(row)).into_response(),
        Ok(None) => api_error(StatusCode::NOT_FOUND, "Tracking ID not found"),
        Err(e) => api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Raw opened rows, most recent first, capped at 100.
pub async fn all_tracking_handler(State(state): State<SharedState>) -> Response {
    let st = state.lock().await;
    match st.storage.list_all(ALL_TRACKING_LIMIT) {
        Ok(rows) => (StatusCode::OK, axum::Json(rows)).into_response(),
        Err(e) => api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
