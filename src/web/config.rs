//! Configuration for the mailpix server.

use std::path::PathBuf;

use clap::Parser;

pub(crate) const DEFAULT_PORT: u16 = 3000;

/// Maximum rows returned by the all-tracking listing.
pub(crate) const ALL_TRACKING_LIMIT: u32 = 100;

/// Tracking-pixel server.
///
/// Serves a 1x1 transparent PNG per tracking id, records opens in SQLite,
/// and exposes read APIs for polling recent opens.
///
/// Configuration can be set via CLI arguments or environment variables.
/// CLI arguments take precedence over environment variables.
#[derive(Parser, Debug)]
#[command(name = "mailpix", version, about)]
pub struct Cli {
    /// HTTP listen port [env: MAILPIX_PORT, PORT] [default: 3000]
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Data directory for the tracking database [env: MAILPIX_HOME] [default: ~/.mailpix]
    #[arg(long, short = 'd')]
    pub data_dir: Option<PathBuf>,
}

pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_cli_and_env(cli: Cli) -> Self {
        let data_dir = cli
            .data_dir
            .or_else(|| std::env::var("MAILPIX_HOME").ok().map(PathBuf::from))
            .unwrap_or_else(|| {
                std::env::var("HOME")
                    .map(|h| PathBuf::from(h).join(".mailpix"))
                    .unwrap_or_else(|_| PathBuf::from(".mailpix"))
            });

        let port = cli
            .port
            .or_else(|| env_port("MAILPIX_PORT"))
            .or_else(|| env_port("PORT"))
            .unwrap_or(DEFAULT_PORT);

        Self { port, data_dir }
    }
}

fn env_port(var: &str) -> Option<u16> {
    std::env::var(var).ok().and_then(|v| v.parse().ok())
}
