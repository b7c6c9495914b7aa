//! # Dyad CLI Module
//!
//! This module implements the CLI interface for Dyad.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show store status
//! - `combine` - Combine two entities by id
//! - `snapshot` - Print every entity and relationship
//! - `run` - Apply a recipe file to the store
//! - `align` - Pair the labels of two recipes that reach the same ids
//! - `export` - Export store to file
//! - `import` - Import store from file
//! - `init` - Initialize a new store file
//! - `hash` - Compute BLAKE3 cryptographic hash of the store

mod commands;

use crate::config::{FileConfig, Overrides, Settings};
use clap::{Parser, Subcommand};
use dyad_core::DyadError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Dyad - content-addressed synthesis store
///
/// Every entity is born by combining two others. Ids are SHA-256 of the
/// ordered operand pair, so the same structure always has the same id.
#[derive(Parser, Debug)]
#[command(name = "dyad")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the store file [default: dyad.store]
    #[arg(short = 'S', long, global = true)]
    pub store: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to [default: 127.0.0.1]
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to [default: 8080]
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show store status
    Status,

    /// Combine two entities by id ("0", "1" or a 64-char hex id)
    Combine {
        /// First operand
        a: String,

        /// Second operand
        b: String,
    },

    /// Print every entity and relationship
    Snapshot,

    /// Apply a recipe file to the store
    Run {
        /// Path to the recipe (TOML)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Pair labels of two recipes that reach the same ids
    Align {
        /// Left recipe
        #[arg(short, long)]
        left: PathBuf,

        /// Right recipe
        #[arg(short, long)]
        right: PathBuf,
    },

    /// Export store in canonical format
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (canonical, json)
        #[arg(short = 't', long, default_value = "canonical")]
        format: String,
    },

    /// Import store from canonical format
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Initialize a new store file holding only the origins
    Init {
        /// Force initialization even if the store exists
        #[arg(short, long)]
        force: bool,
    },

    /// Compute BLAKE3 cryptographic hash of the store
    Hash,
}

impl Cli {
    /// Values given explicitly on the command line.
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        let (host, port) = match &self.command {
            Some(Commands::Server { host, port }) => (host.clone(), *port),
            _ => (None, None),
        };
        Overrides {
            host,
            port,
            store: self.store.clone(),
        }
    }

    /// Load the config file named by `--config`, if any.
    pub fn file_config(&self) -> Result<FileConfig, DyadError> {
        self.config
            .as_deref()
            .map(FileConfig::load)
            .transpose()
            .map(Option::unwrap_or_default)
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments and resolved settings.
pub async fn execute(cli: Cli, settings: Settings) -> Result<(), DyadError> {
    let store = settings.store.as_path();
    let json_mode = cli.json_mode;

    if cli.verbose {
        tracing::info!(store = %store.display(), "Using store file");
    }

    match cli.command {
        Some(Commands::Server { .. }) => cmd_server(store, &settings.bind_addr()).await,
        Some(Commands::Status) => cmd_status(store, json_mode),
        Some(Commands::Combine { a, b }) => cmd_combine(store, json_mode, &a, &b),
        Some(Commands::Snapshot) => cmd_snapshot(store, json_mode),
        Some(Commands::Run { file }) => cmd_run(store, json_mode, &file),
        Some(Commands::Align { left, right }) => cmd_align(json_mode, &left, &right),
        Some(Commands::Export { output, format }) => cmd_export(store, &output, &format),
        Some(Commands::Import { input }) => cmd_import(store, &input),
        Some(Commands::Init { force }) => cmd_init(store, force),
        Some(Commands::Hash) => cmd_hash(store, json_mode),
        None => {
            // No subcommand - show status by default
            cmd_status(store, json_mode)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
