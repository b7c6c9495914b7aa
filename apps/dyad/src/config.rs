//! # Configuration
//!
//! Resolves runtime settings from four layers, highest first:
//!
//! 1. Explicit CLI flags
//! 2. Environment (`DYAD_HOST`, `DYAD_PORT`, `DYAD_STORE`, `DYAD_LOG_FORMAT`)
//! 3. TOML config file (`--config`)
//! 4. Built-in defaults
//!
//! ## File Format
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [store]
//! path = "dyad.store"
//!
//! [log]
//! format = "json"
//! ```

use dyad_core::DyadError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// =============================================================================
// DEFAULTS
// =============================================================================

/// Default bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default store file.
pub const DEFAULT_STORE_PATH: &str = "dyad.store";

/// Maximum config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// LOG FORMAT
// =============================================================================

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// `"json"` selects JSON; anything else is text.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

// =============================================================================
// FILE CONFIG
// =============================================================================

/// Contents of a TOML config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server: ServerSection,
    pub store: StoreSection,
    pub log: LogSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSection {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSection {
    pub format: Option<String>,
}

impl FileConfig {
    /// Parse TOML text.
    pub fn parse(text: &str) -> Result<Self, DyadError> {
        toml::from_str(text)
            .map_err(|e| DyadError::SerializationError(format!("Invalid config: {}", e)))
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, DyadError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            DyadError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(DyadError::SerializationError(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            DyadError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::parse(&text)
    }
}

// =============================================================================
// SETTINGS
// =============================================================================

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub store: Option<PathBuf>,
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub store: PathBuf,
    pub log_format: LogFormat,
}

impl Settings {
    /// Resolve settings, reading environment variables through `env`.
    pub fn resolve<F>(overrides: &Overrides, file: &FileConfig, env: F) -> Result<Self, DyadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = overrides
            .host
            .clone()
            .or_else(|| env("DYAD_HOST"))
            .or_else(|| file.server.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let env_port = env("DYAD_PORT")
            .map(|raw| {
                raw.trim().parse::<u16>().map_err(|e| {
                    DyadError::SerializationError(format!("Invalid DYAD_PORT '{}': {}", raw, e))
                })
            })
            .transpose()?;
        let port = overrides
            .port
            .or(env_port)
            .or(file.server.port)
            .unwrap_or(DEFAULT_PORT);

        let store = overrides
            .store
            .clone()
            .or_else(|| env("DYAD_STORE").map(PathBuf::from))
            .or_else(|| file.store.path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));

        let log_format = Self::log_format(file, &env);

        Ok(Self {
            host,
            port,
            store,
            log_format,
        })
    }

    /// Resolve against the process environment.
    pub fn from_env(overrides: &Overrides, file: &FileConfig) -> Result<Self, DyadError> {
        Self::resolve(overrides, file, |key| std::env::var(key).ok())
    }

    /// Log format alone, needed before the rest of the settings are checked.
    pub fn log_format<F>(file: &FileConfig, env: F) -> LogFormat
    where
        F: Fn(&str) -> Option<String>,
    {
        env("DYAD_LOG_FORMAT")
            .or_else(|| file.log.format.clone())
            .map(|f| LogFormat::parse(&f))
            .unwrap_or_default()
    }

    /// `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// TESTS
// =============================================================================
