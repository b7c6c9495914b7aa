//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    types::{
        CombineRequest, CombineResponse, ExportResponse, HashResponse, HealthResponse,
        SnapshotResponse, StatusResponse,
    },
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use dyad_core::{
    DyadError, Synthesis, SynthesisOutcome,
    export::{canonical_checksum, canonical_crypto_hash, export_canonical},
};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Get store status.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let response = {
        let store = state.store.read();
        StatusResponse {
            entity_count: store.entity_count(),
            relationship_count: store.relationship_count(),
            origins: vec![store.origin0().id().to_string(), store.origin1().id().to_string()],
        }
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// COMBINE HANDLER
// =============================================================================

/// Combine two registered entities.
///
/// Malformed ids and ids this store does not hold are client errors. A new
/// entity is written to the store file before the response is sent.
pub async fn combine_handler(
    State(state): State<AppState>,
    Json(request): Json<CombineRequest>,
) -> impl IntoResponse {
    let synthesis = match combine(&state, &request) {
        Ok(synthesis) => synthesis,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(CombineResponse::error(format!("Combine failed: {}", e))),
            );
        }
    };

    if synthesis.outcome == SynthesisOutcome::Created {
        if let Err(e) = state.persist() {
            tracing::error!("Persist failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CombineResponse::error(format!("Persist failed: {}", e))),
            );
        }
    }

    (StatusCode::OK, Json(CombineResponse::success(&synthesis)))
}

fn combine(state: &AppState, request: &CombineRequest) -> Result<Synthesis, DyadError> {
    let (a, b) = request.parse_ids()?;
    let a = state.store.require(a)?;
    let b = state.store.require(b)?;

    let synthesis = state.store.synthesize(a, b);
    tracing::debug!(
        a = %a.id(),
        b = %b.id(),
        entity = %synthesis.entity.id(),
        outcome = %synthesis.outcome,
        "combine"
    );
    Ok(synthesis)
}

// =============================================================================
// SNAPSHOT HANDLER
// =============================================================================

/// Return every entity and relationship, sorted.
pub async fn snapshot_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.store.snapshot();
    (StatusCode::OK, Json(SnapshotResponse::from(&snapshot)))
}

// =============================================================================
// EXPORT HANDLER
// =============================================================================

/// Export the store in canonical format.
pub async fn export_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.store.snapshot();

    match export_canonical(&snapshot) {
        Ok(data) => {
            let checksum = canonical_checksum(&snapshot);
            (
                StatusCode::OK,
                Json(ExportResponse::success(data, checksum)),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ExportResponse::error(format!("Export failed: {}", e))),
        ),
    }
}

// =============================================================================
// HASH HANDLER
// =============================================================================

/// BLAKE3 fingerprint of the canonical export.
pub async fn hash_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.store.snapshot();

    match canonical_crypto_hash(&snapshot) {
        Ok(hash) => (StatusCode::OK, Json(HashResponse::success(hash))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HashResponse::error(format!("Hash failed: {}", e))),
        ),
    }
}
