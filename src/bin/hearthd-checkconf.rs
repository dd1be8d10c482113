//! Configuration checker: validate a config file and show the listener
//! plan it would produce, without touching any sockets.
//!
//! Exit code 0 means the daemon would accept this file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use hearthd::config::{load_config, ConfigError};
use hearthd::net::address::WILDCARD_MARKER;

#[derive(Parser)]
#[command(name = "hearthd-checkconf")]
#[command(about = "Validate a hearthd configuration and show the listener plan", long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "hearthd.toml")]
    config: PathBuf,

    /// Print the expanded listener plan as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(ConfigError::Validation(errors)) => {
            eprintln!("{}: configuration invalid", cli.config.display());
            for err in errors {
                eprintln!("  - {err}");
            }
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("{}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let specs = match config.bind_specs() {
        Ok(specs) => specs,
        Err(e) => {
            eprintln!("{}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&specs) {
            Ok(plan) => println!("{plan}"),
            Err(e) => {
                eprintln!("failed to encode listener plan: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!(
            "configuration OK: {} ({} bind entries, {} listeners)",
            cli.config.display(),
            config.bind.len(),
            specs.len()
        );
        for spec in &specs {
            let address = if spec.address.is_empty() {
                WILDCARD_MARKER
            } else {
                spec.address.as_str()
            };
            println!(
                "  {}:{} {} type={} backlog={}",
                address, spec.port, spec.transport, spec.kind, spec.backlog
            );
        }
    }

    ExitCode::SUCCESS
}
