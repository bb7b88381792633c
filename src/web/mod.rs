//! mailpix web server: pixel endpoint, read APIs, and a status page,
//! backed by a single SQLite table.

pub mod config;
pub mod handlers;
pub mod router;
pub mod state;
pub mod utils;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;

use crate::storage::Storage;

use config::{Cli, Config};
use state::{AppState, SharedState};
use utils::now_millis;

/// Entry point: parse CLI, open storage, start server.
pub async fn run() {
    let cli = Cli::parse();
    let config = Config::from_cli_and_env(cli);

    crate::logging::init();

    crate::plog!("mailpix starting");
    crate::plog!("  data directory: {}", config.data_dir.display());

    std::fs::create_dir_all(&config.data_dir).expect("failed to create data directory");
    let db_path = config.data_dir.join("tracking.db");
    let storage = Storage::open(&db_path).expect("failed to open database");
    crate::plog!("  database: {}", db_path.display());

    let state: SharedState = Arc::new(tokio::sync::Mutex::new(AppState {
        storage,
        started_at: now_millis(),
    }));

    let app = router::build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");
    crate::plog!("mailpix listening on http://{addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("server error");

    // State (and the SQLite handle) drops on return.
    crate::plog!("mailpix shut down");
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
