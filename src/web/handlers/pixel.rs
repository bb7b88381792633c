//! The tracking-pixel endpoint.
//!
//! Always answers with the same 1x1 PNG and cache-disabling headers; the
//! recording work is spawned onto the runtime so storage latency or failure
//! never delays or alters the client-visible response.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::logging;
use crate::pixel::{CACHE_CONTROL_VALUE, PIXEL_PNG};
use crate::tracker::{self, RecordOutcome};
use crate::web::state::SharedState;
use crate::web::utils::{client_ip, now_millis};

pub async fn pixel_handler(
    State(state): State<SharedState>,
    Path(pixel): Path<String>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Response {
    let tracking_id = pixel
        .strip_suffix(".png")
        .unwrap_or(pixel.as_str())
        .to_string();
    let ip = client_ip(&headers, connect_info.map(|ci| ci.0));
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let now = now_millis();

    // Record in the background; errors are logged and swallowed.
    let task_state = Arc::clone(&state);
    tokio::spawn(async move {
        let st = task_state.lock().await;

        if tracker::is_image_proxy(&user_agent) {
            crate::plog!(
                "track: image-proxy fetch for {} ({})",
                logging::track_id(&tracking_id),
                user_agent
            );
        }

        match tracker::record_observation(&st.storage, &tracking_id, &ip, &user_agent, now) {
            Ok(RecordOutcome::SenderBaseline) => crate::plog!(
                "track: sender baseline for {} from {}",
                logging::track_id(&tracking_id),
                ip
            ),
            Ok(RecordOutcome::CountedOpen) => crate::plog!(
                "track: counted open for {} from {}",
                logging::track_id(&tracking_id),
                ip
            ),
            Ok(RecordOutcome::SuppressedSelfView) => crate::plog!(
                "track: suppressed self-view for {} from {}",
                logging::track_id(&tracking_id),
                ip
            ),
            Err(e) => crate::plog!(
                "track: storage error for {}: {}",
                logging::track_id(&tracking_id),
                e
            ),
        }
    });

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, CACHE_CONTROL_VALUE),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
        ],
        PIXEL_PNG.clone(),
    )
        .into_response()
}
