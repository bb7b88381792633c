//! Open-classification heuristics and the event recorder.
//!
//! The first observation for a tracking id is treated as the sender's own
//! action of sending the tracked mail (the "sender baseline") and is never
//! counted. After that, an observation is counted as a genuine open unless
//! it comes from the sender's IP within a short grace window of creation,
//! which is read as the sender re-opening their own message.

use crate::storage::{Storage, StorageError, TrackingRow};

/// Same-IP observations within this window of creation are suppressed as
/// likely sender self-views.
pub const GRACE_WINDOW_MS: u64 = 2 * 60 * 1000;

/// Default look-back window for the recent-opens query (1 hour).
pub const DEFAULT_SINCE_WINDOW_MS: u64 = 60 * 60 * 1000;

/// User-agent substrings identifying mail-provider image proxies.
///
/// Informational only: proxy fetches are logged but still classified by the
/// IP/time heuristic like any other observation.
const PROXY_MARKERS: &[&str] = &["GoogleImageProxy", "ggpht.com", "YahooMailProxy", "ImageProxy"];

/// Whether a user-agent string looks like a mail-provider image proxy.
pub fn is_image_proxy(user_agent: &str) -> bool {
    PROXY_MARKERS.iter().any(|m| user_agent.contains(m))
}

/// How an observation was classified by the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// First observation for the id; record created, not counted.
    SenderBaseline,
    /// Counted as a genuine open.
    CountedOpen,
    /// Same IP as the sender within the grace window; not counted.
    SuppressedSelfView,
}

/// Decide whether an observation of an existing record counts as an open.
///
/// Counted unless BOTH hold: the requester IP equals the stored sender IP
/// and less than [`GRACE_WINDOW_MS`] has elapsed since creation. An
/// observation at exactly the window boundary counts.
pub fn classify(record: &TrackingRow, ip: &str, now: u64) -> RecordOutcome {
    let same_ip_as_sender = ip == record.sender_ip;
    let too_soon = now.saturating_sub(record.created_at) < GRACE_WINDOW_MS;
    if same_ip_as_sender && too_soon {
        RecordOutcome::SuppressedSelfView
    } else {
        RecordOutcome::CountedOpen
    }
}

/// Record one pixel fetch: create the sender baseline on first sight,
/// otherwise classify and conditionally count the open.
///
/// Suppressed observations leave the row completely untouched.
pub fn record_observation(
    storage: &Storage,
    tracking_id: &str,
    ip: &str,
    user_agent: &str,
    now: u64,
) -> Result<RecordOutcome, StorageError> {
    match storage.get_tracking(tracking_id)? {
        None => {
            storage.insert_tracking(&TrackingRow {
                tracking_id: tracking_id.to_string(),
                sender_ip: ip.to_string(),
                last_ip: ip.to_string(),
                last_user_agent: user_agent.to_string(),
                created_at: now,
                // Placeholders until the first counted open
                first_opened_at: now,
                last_opened_at: now,
                open_count: 0,
            })?;
            Ok(RecordOutcome::SenderBaseline)
        }
        Some(mut record) => match classify(&record, ip, now) {
            RecordOutcome::SuppressedSelfView => Ok(RecordOutcome::SuppressedSelfView),
            _ => {
                if record.open_count == 0 {
                    record.first_opened_at = now;
                }
                record.open_count += 1;
                record.last_opened_at = now;
                record.last_ip = ip.to_string();
                record.last_user_agent = user_agent.to_string();
                storage.update_open(&record)?;
                Ok(RecordOutcome::CountedOpen)
            }
        },
    }
}
