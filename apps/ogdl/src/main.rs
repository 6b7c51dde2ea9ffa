//! # ogdl
//!
//! Command-line tools for OGDL documents.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                apps/ogdl                     │
//! │                                              │
//! │   CLI (clap) ──► commands ──► TracingSink    │
//! │                     │                        │
//! │                     ▼                        │
//! │               ┌───────────┐                  │
//! │               │ ogdl-core │                  │
//! │               └───────────┘                  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Query a value
//! ogdl path server.host config.ogdl
//!
//! # Canonical formatting from stdin
//! cat config.ogdl | ogdl fmt
//!
//! # Binary round trip
//! ogdl encode config.ogdl -o config.bin
//! ogdl decode config.bin
//! ```
//!
//! `RUST_LOG` controls the log filter and `OGDL_LOG_FORMAT=json` switches
//! log lines to JSON.

use clap::Parser;
use ogdl::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // Logs go to stderr so command output on stdout stays clean.
    let log_format = std::env::var("OGDL_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "ogdl=trace"
    } else {
        "ogdl=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
