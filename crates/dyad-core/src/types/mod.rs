//! # Core Type Definitions
//!
//! This module contains the value types of the Dyad store:
//! - Identity token (`EntityId`)
//! - The entity itself (`Entity`)
//! - Error types (`DyadError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Are fixed-size and `Copy` where they carry identity
//! - Implement `Ord` as byte-lexicographic order of the id text, so `BTreeMap`
//!   and `BTreeSet` iteration matches the canonical orientation rule

use crate::primitives::{DERIVED_ID_LEN, ORIGIN0_ID, ORIGIN1_ID, SHORT_ID_LEN};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// ENTITY ID
// =============================================================================

/// Opaque identity token of an entity.
///
/// Either a primordial label (`"0"` or `"1"`) or the 64-character lowercase
/// hex rendering of a SHA-256 digest. Stored inline as ASCII, so the type is
/// `Copy` and never allocates.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId {
    text: [u8; DERIVED_ID_LEN],
    len: u8,
}

impl EntityId {
    /// Id of the first primordial entity.
    pub const ORIGIN0: Self = Self::primordial(b'0');

    /// Id of the second primordial entity.
    pub const ORIGIN1: Self = Self::primordial(b'1');

    const fn primordial(label: u8) -> Self {
        let mut text = [0u8; DERIVED_ID_LEN];
        text[0] = label;
        Self { text, len: 1 }
    }

    /// Build a derived id from a raw 256-bit digest.
    pub(crate) fn from_digest(digest: &[u8; 32]) -> Self {
        let mut text = [0u8; DERIVED_ID_LEN];
        // 32 bytes always encode to exactly 64 hex digits.
        let _ = hex::encode_to_slice(digest, &mut text);
        Self {
            text,
            len: DERIVED_ID_LEN as u8,
        }
    }

    /// Parse an id from its textual token.
    ///
    /// Accepts the two primordial labels and 64-character lowercase hex.
    pub fn parse(token: &str) -> Result<Self, DyadError> {
        match token {
            ORIGIN0_ID => return Ok(Self::ORIGIN0),
            ORIGIN1_ID => return Ok(Self::ORIGIN1),
            _ => {}
        }

        let bytes = token.as_bytes();
        let is_lower_hex = |b: &u8| b.is_ascii_digit() || (b'a'..=b'f').contains(b);
        if bytes.len() != DERIVED_ID_LEN || !bytes.iter().all(is_lower_hex) {
            return Err(DyadError::InvalidId(token.chars().take(80).collect()));
        }

        let mut text = [0u8; DERIVED_ID_LEN];
        text.copy_from_slice(bytes);
        Ok(Self {
            text,
            len: DERIVED_ID_LEN as u8,
        })
    }

    /// The id text as bytes (ASCII).
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.text[..usize::from(self.len)]
    }

    /// The id text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Only ASCII is ever written into `text`.
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }

    /// Leading characters of the id, for diagnostics.
    #[must_use]
    pub fn short(&self) -> &str {
        let end = usize::from(self.len).min(SHORT_ID_LEN);
        std::str::from_utf8(&self.text[..end]).unwrap_or_default()
    }

    /// True for the two reserved ids created at store construction.
    #[must_use]
    pub fn is_primordial(&self) -> bool {
        *self == Self::ORIGIN0 || *self == Self::ORIGIN1
    }
}

impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityId").field(&self.as_str()).finish()
    }
}

impl FromStr for EntityId {
    type Err = DyadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Self::parse(&token).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// ENTITY
// =============================================================================

/// An immutable point of identity.
///
/// Equality, ordering and hashing are defined by the id alone. Entities are
/// only handed out by the store: the two primordials at construction, every
/// other one by a combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Entity {
    id: EntityId,
}

impl Entity {
    pub(crate) const fn new(id: EntityId) -> Self {
        Self { id }
    }

    /// The identity token.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Δ({})", self.id.short())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur around the Dyad store.
///
/// `combine` and `snapshot` never produce one. These cover the fallible
/// edges: parsing ids, importing exports, resolving labels, file I/O.
#[derive(Debug, Error)]
pub enum DyadError {
    /// The token is not a primordial label or 64-character lowercase hex.
    #[error("Invalid entity id: {0:?}")]
    InvalidId(String),

    /// The id is well formed but the store does not hold it.
    #[error("Entity not found: {0}")]
    UnknownEntity(EntityId),

    /// A lexicon was asked for a label it never assigned.
    #[error("Unknown label: {0:?}")]
    UnknownLabel(String),

    /// A label is empty or too long.
    #[error("Invalid label: {0:?}")]
    InvalidLabel(String),

    /// Imported data breaks one of the store invariants.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
