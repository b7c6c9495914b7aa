//! # Dyad - Synthesis Store Server
//!
//! The main binary for the Dyad content-addressed synthesis store.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for store operations
//! - Recipe runner for labelled combination scripts
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      apps/dyad (THE BINARY)                     │
//! │                                                                 │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐    │
//! │  │   CLI       │    │   HTTP API  │    │  Recipe Runner   │    │
//! │  │  (clap)     │    │   (axum)    │    │  (toml)          │    │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘    │
//! │         │                  │                    │               │
//! │         └──────────────────┼────────────────────┘               │
//! │                            ▼                                    │
//! │                    ┌───────────────┐                            │
//! │                    │   dyad-core   │                            │
//! │                    │ (THE LOGIC)   │                            │
//! │                    └───────────────┘                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! dyad server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! dyad status
//! dyad combine 0 1
//! dyad run -f english.toml
//! dyad align --left english.toml --right japanese.toml
//! ```

use clap::Parser;
use dyad::cli;
use dyad::config::{LogFormat, Settings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // The config file may choose the log format, so read it before tracing starts.
    let file_config = cli.file_config();
    let log_format = file_config
        .as_ref()
        .map(|file| Settings::log_format(file, |key| std::env::var(key).ok()))
        .unwrap_or_default();
    init_tracing(log_format);

    let settings = match file_config.and_then(|file| Settings::from_env(&cli.overrides(), &file))
    {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Display startup banner
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli, settings).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing. `DYAD_LOG_FORMAT=json` enables machine-parseable output.
fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dyad=info,tower_http=debug".into());

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

/// Print the Dyad startup banner.
fn print_banner() {
    println!(
        r#"
  ██████╗ ██╗   ██╗ █████╗ ██████╗
  ██╔══██╗╚██╗ ██╔╝██╔══██╗██╔══██╗
  ██║  ██║ ╚████╔╝ ███████║██║  ██║
  ██║  ██║  ╚██╔╝  ██╔══██║██║  ██║
  ██████╔╝   ██║   ██║  ██║██████╔╝
  ╚═════╝    ╚═╝   ╚═╝  ╚═╝╚═════╝

  Synthesis Store v{}

  Deterministic • Content-addressed • Verifiable
"#,
        env!("CARGO_PKG_VERSION")
    );
}
