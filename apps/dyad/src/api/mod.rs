//! # Dyad HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Entity and relationship counts
//! - `POST /combine` - Combine two entities by id
//! - `GET /snapshot` - All entities and relationships, sorted
//! - `POST /export` - Export store in canonical format
//! - `GET /hash` - BLAKE3 cryptographic hash of the export
//!
//! ## Configuration (Environment Variables)
//!
//! - `DYAD_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)

mod handlers;
mod types;

// Re-export handlers and types for integration tests (via `dyad::api::*`)
pub use handlers::{
    combine_handler, export_handler, hash_handler, health_handler, snapshot_handler,
    status_handler,
};
pub use types::{
    CombineRequest, CombineResponse, ExportResponse, HashResponse, HealthResponse,
    RelationshipJson, SnapshotResponse, StatusResponse,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use dyad_core::{DyadError, SharedStore, Store, export_canonical};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body size (64 KB). Requests carry two ids at most.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the store.
#[derive(Clone)]
pub struct AppState {
    /// The store, shared across request handlers.
    pub store: SharedStore,

    /// Store file rewritten after every new entity, if any.
    store_file: Option<Arc<StoreFile>>,
}

/// Store file plus a lock that orders writers, so a later write never
/// carries an older snapshot.
struct StoreFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl AppState {
    /// Create new app state owning a store, held in memory only.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self::with_shared(SharedStore::from(store))
    }

    /// Create app state over an existing shared handle, held in memory only.
    #[must_use]
    pub fn with_shared(store: SharedStore) -> Self {
        Self {
            store,
            store_file: None,
        }
    }

    /// Create app state that writes the store to `path` whenever a combine
    /// registers a new entity.
    #[must_use]
    pub fn persistent(store: SharedStore, path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            store_file: Some(Arc::new(StoreFile {
                path: path.into(),
                write_lock: Mutex::new(()),
            })),
        }
    }

    /// Write the current store to the store file, if one is configured.
    ///
    /// The export goes to a sibling temporary file first and is renamed over
    /// the store file, so a crash mid-write leaves the previous file intact.
    pub fn persist(&self) -> Result<(), DyadError> {
        let Some(file) = &self.store_file else {
            return Ok(());
        };
        let _guard = file
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let snapshot = self.store.snapshot();
        let data = export_canonical(&snapshot)?;
        write_replacing(&file.path, &data)?;

        tracing::debug!(
            store = %file.path.display(),
            entities = snapshot.entity_count(),
            "Store persisted"
        );
        Ok(())
    }
}

fn write_replacing(path: &Path, data: &[u8]) -> Result<(), DyadError> {
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);

    std::fs::write(&staging, data)
        .map_err(|e| DyadError::IoError(format!("Write store: {}", e)))?;
    std::fs::rename(&staging, path)
        .map_err(|e| DyadError::IoError(format!("Replace store: {}", e)))
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `DYAD_CORS_ORIGINS` environment variable:
/// - If "*": allows all origins
/// - If not set: defaults to localhost only
/// - Otherwise: parses comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("DYAD_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (DYAD_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in DYAD_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE])
            }
        }
        None => {
            tracing::info!("CORS: No DYAD_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let localhost_origins = [
        "http://localhost:3000".parse::<HeaderValue>().ok(),
        "http://localhost:8080".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:3000".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:8080".parse::<HeaderValue>().ok(),
    ];
    let origins: Vec<HeaderValue> = localhost_origins.into_iter().flatten().collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
pub fn create_router(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
        .layer(axum::extract::DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES));

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/combine", post(handlers::combine_handler))
        .route("/snapshot", get(handlers::snapshot_handler))
        .route("/export", post(handlers::export_handler))
        .route("/hash", get(handlers::hash_handler))
        .layer(middleware)
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and run until Ctrl+C.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), DyadError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| DyadError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Dyad HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| DyadError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
