//! # dyad-core
//!
//! The deterministic synthesis store for Dyad - THE LOGIC.
//!
//! A content-addressed graph builder. New entities are created only by
//! combining two existing ones; the new id is SHA-256 over the canonical
//! operand pair, so structurally identical combinations always collapse to
//! the same entity (hash-consing).
//!
//! ## Operations
//!
//! - [`Store::combine`]: the sole generative operation. Total; never fails.
//! - [`Store::snapshot`]: an owned, consistent copy of everything created.
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Performs no analysis, no randomness and no I/O
//! - Holds no global state; every store is an explicit value
//! - Uses ordered collections only, so every iteration is deterministic
//! - Leaves metrics, rendering and demos to consumers of [`Snapshot`]

// =============================================================================
// MODULES
// =============================================================================

pub mod canonical;
pub mod export;
pub mod lexicon;
pub mod primitives;
pub mod relations;
pub mod shared;
pub mod snapshot;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{DyadError, Entity, EntityId};

// =============================================================================
// RE-EXPORTS: Store
// =============================================================================

pub use canonical::{canonical_form, derive_id};
pub use lexicon::{Alignment, Lexicon, align};
pub use relations::{Relationship, RelationshipSet};
pub use shared::SharedStore;
pub use snapshot::Snapshot;
pub use store::{Store, Synthesis, SynthesisOutcome};

// =============================================================================
// RE-EXPORTS: Export
// =============================================================================

pub use export::{
    CanonicalHeader, CanonicalStore, canonical_checksum, export_canonical, import_canonical,
    verify_canonical,
};
