//! Shared utility functions for the web layer.

use std::net::SocketAddr;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::DateTime;

use crate::storage::TrackingRow;
use crate::tracker::DEFAULT_SINCE_WINDOW_MS;

/// Build a standard JSON error response.
pub fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (status, axum::Json(body)).into_response()
}

/// Current time as milliseconds since UNIX epoch.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Requester IP: first `X-Forwarded-For` entry when present (the server is
/// expected to sit behind a proxy), otherwise the socket peer address.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Parse an ISO 8601 `since` parameter into epoch milliseconds.
///
/// Missing or malformed values fall back to one hour before `now` rather
/// than erroring.
pub fn parse_since(since: Option<&str>, now: u64) -> u64 {
    since
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .and_then(|dt| u64::try_from(dt.timestamp_millis()).ok())
        .unwrap_or_else(|| now.saturating_sub(DEFAULT_SINCE_WINDOW_MS))
}

/// Build the camelCase JSON shape of a recent-open entry.
pub fn open_to_json(row: &TrackingRow) -> serde_json::Value {
    serde_json::json!({
        "trackingId": row.tracking_id,
        "ipAddress": row.last_ip,
        "timestamp": row.first_opened_at,
        "lastOpened": row.last_opened_at,
        "openCount": row.open_count,
    })
}
