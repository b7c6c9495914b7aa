//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use dyad_core::{DyadError, EntityId, Snapshot, Synthesis};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Store status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub entity_count: usize,
    pub relationship_count: usize,
    /// Ids of the primordial entities.
    pub origins: Vec<String>,
}

// =============================================================================
// COMBINE REQUEST/RESPONSE
// =============================================================================

/// Combine request: two entity ids in either order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombineRequest {
    pub a: String,
    pub b: String,
}

impl CombineRequest {
    /// Parse both ids, rejecting malformed tokens.
    pub fn parse_ids(&self) -> Result<(EntityId, EntityId), DyadError> {
        Ok((EntityId::parse(&self.a)?, EntityId::parse(&self.b)?))
    }
}

/// Combine response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombineResponse {
    pub success: bool,
    pub entity: Option<String>,
    /// `created`, `existing` or `reflexive`.
    pub outcome: Option<String>,
    pub error: Option<String>,
}

impl CombineResponse {
    pub fn success(synthesis: &Synthesis) -> Self {
        Self {
            success: true,
            entity: Some(synthesis.entity.id().to_string()),
            outcome: Some(synthesis.outcome.as_str().to_string()),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            entity: None,
            outcome: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// SNAPSHOT RESPONSE
// =============================================================================

/// A relationship in JSON form, smaller id first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipJson {
    pub low: String,
    pub high: String,
}

/// Full snapshot: sorted entity ids and relationship pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub entity_count: usize,
    pub relationship_count: usize,
    pub entities: Vec<String>,
    pub relationships: Vec<RelationshipJson>,
}

impl From<&Snapshot> for SnapshotResponse {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            entity_count: snapshot.entity_count(),
            relationship_count: snapshot.relationship_count(),
            entities: snapshot
                .entities()
                .iter()
                .map(|e| e.id().to_string())
                .collect(),
            relationships: snapshot
                .relationships()
                .iter()
                .map(|r| RelationshipJson {
                    low: r.low().to_string(),
                    high: r.high().to_string(),
                })
                .collect(),
        }
    }
}

// =============================================================================
// EXPORT RESPONSE
// =============================================================================

/// Export response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub success: bool,
    pub data: Option<String>, // Base64 encoded
    pub checksum: Option<u64>,
    pub error: Option<String>,
}

impl ExportResponse {
    pub fn success(data: Vec<u8>, checksum: u64) -> Self {
        Self {
            success: true,
            data: Some(base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                &data,
            )),
            checksum: Some(checksum),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            checksum: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// HASH RESPONSE
// =============================================================================

/// BLAKE3 fingerprint of the canonical export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashResponse {
    pub success: bool,
    pub hash: Option<String>,
    pub algorithm: String,
    pub error: Option<String>,
}

impl HashResponse {
    pub fn success(hash: String) -> Self {
        Self {
            success: true,
            hash: Some(hash),
            algorithm: "blake3".to_string(),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            hash: None,
            algorithm: "blake3".to_string(),
            error: Some(msg.into()),
        }
    }
}
