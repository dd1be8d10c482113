//! hearthd daemon entry point.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                   HEARTHD                    │
//!                    │                                              │
//!   config file ─────┼─▶ config ──▶ validation ──▶ bind specs      │
//!   SIGHUP / watcher │                                  │           │
//!                    │                                  ▼           │
//!                    │   listener registry ◀── reconciler           │
//!                    │         │            (bind / keep / close)   │
//!                    │         ▼                                    │
//!   client ──────────┼─▶ accept engine ──▶ sessions                 │
//!   connections      │   (per-listener     (tracked, drained        │
//!                    │    tasks, limits)    on shutdown)            │
//!                    │                                              │
//!                    │   cross-cutting: observability, lifecycle,   │
//!                    │   extensions                                 │
//!                    └──────────────────────────────────────────────┘
//! ```
//!
//! Startup binds every configured listener and refuses to run without
//! at least one. After that, SIGHUP and config file changes drive
//! rehashes; SIGTERM/SIGINT drive graceful shutdown.

use std::path::PathBuf;

use clap::Parser;

use hearthd::config::loader::load_config;
use hearthd::lifecycle::Daemon;
use hearthd::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "hearthd")]
#[command(about = "Multi-listener network daemon with hot rehash", long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "hearthd.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Config loads before logging exists; failures go straight to stderr.
    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("hearthd: {}: {}", cli.config.display(), e);
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        server = %config.server.name,
        "hearthd starting"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let mut daemon = Daemon::new(config);
    let report = daemon.start()?;

    for key in daemon.listeners() {
        tracing::info!(listener = %key, "Listening");
    }
    if !report.failures.is_empty() {
        tracing::warn!(
            failed = report.failures.len(),
            "Some listeners failed to bind at startup"
        );
    }

    daemon.run(&cli.config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
