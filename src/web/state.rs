//! Shared application state.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::storage::Storage;

pub struct AppState {
    pub storage: Storage,
    /// Server start time, epoch milliseconds.
    pub started_at: u64,
}

pub type SharedState = Arc<Mutex<AppState>>;
