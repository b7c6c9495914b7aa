//! # Store
//!
//! The synthesis engine: owns every entity and relationship created so far.
//!
//! `combine` is the only operation that grows the store and `snapshot` is
//! the only way to observe all of it. Both are total.
//!
//! ## Transition
//!
//! Each unordered operand pair moves at most once from "absent" to "present":
//! the derived entity and its two relationships are registered together.
//! Every later request for the same pair returns the registered entity and
//! changes nothing. Self-pairs never transition.

use crate::canonical::derive_id;
use crate::relations::RelationshipSet;
use crate::snapshot::Snapshot;
use crate::{DyadError, Entity, EntityId};
use serde::Serialize;
use std::collections::BTreeMap;

// =============================================================================
// SYNTHESIS RESULT
// =============================================================================

/// How a combine request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisOutcome {
    /// Both operands were the same entity; it was returned unchanged.
    Reflexive,
    /// The pair had been synthesized before; the existing entity was returned.
    Existing,
    /// A new entity and its two relationships were registered.
    Created,
}

impl SynthesisOutcome {
    /// Lowercase name, as used in logs and API responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reflexive => "reflexive",
            Self::Existing => "existing",
            Self::Created => "created",
        }
    }
}

impl std::fmt::Display for SynthesisOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The entity returned by a combine, with how it was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Synthesis {
    /// The resulting entity.
    pub entity: Entity,
    /// Whether it was new, already present, or an operand.
    pub outcome: SynthesisOutcome,
}

impl Synthesis {
    const fn new(entity: Entity, outcome: SynthesisOutcome) -> Self {
        Self { entity, outcome }
    }

    pub(crate) const fn reflexive(entity: Entity) -> Self {
        Self::new(entity, SynthesisOutcome::Reflexive)
    }

    pub(crate) const fn existing(entity: Entity) -> Self {
        Self::new(entity, SynthesisOutcome::Existing)
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Single-owner synthesis store.
///
/// Uses `BTreeMap` for deterministic iteration. Share across threads with
/// [`SharedStore`](crate::SharedStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    /// All known entities: id -> entity.
    entities: BTreeMap<EntityId, Entity>,

    /// Canonical relationships.
    relationships: RelationshipSet,
}

impl Store {
    /// Create a store holding the two primordial entities and their relationship.
    #[must_use]
    pub fn new() -> Self {
        let origin0 = Entity::new(EntityId::ORIGIN0);
        let origin1 = Entity::new(EntityId::ORIGIN1);

        let mut entities = BTreeMap::new();
        entities.insert(origin0.id(), origin0);
        entities.insert(origin1.id(), origin1);

        let mut relationships = RelationshipSet::new();
        relationships.insert(origin0.id(), origin1.id());

        Self {
            entities,
            relationships,
        }
    }

    /// Rebuild a store from a snapshot, after checking the invariants.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, DyadError> {
        snapshot.verify()?;
        let (entities, relationships) = snapshot.into_parts();
        Ok(Self {
            entities: entities.into_iter().map(|e| (e.id(), e)).collect(),
            relationships,
        })
    }

    /// The primordial entity `"0"`.
    #[must_use]
    pub const fn origin0(&self) -> Entity {
        Entity::new(EntityId::ORIGIN0)
    }

    /// The primordial entity `"1"`.
    #[must_use]
    pub const fn origin1(&self) -> Entity {
        Entity::new(EntityId::ORIGIN1)
    }

    /// Look up a registered entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<Entity> {
        self.entities.get(&id).copied()
    }

    /// Look up a registered entity, failing with `UnknownEntity`.
    pub fn require(&self, id: EntityId) -> Result<Entity, DyadError> {
        self.get(id).ok_or(DyadError::UnknownEntity(id))
    }

    /// Check whether an entity is registered.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Check whether `a` and `b` are related.
    #[must_use]
    pub fn is_related(&self, a: EntityId, b: EntityId) -> bool {
        self.relationships.contains(a, b)
    }

    /// Number of registered entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of registered relationships.
    #[must_use]
    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Combine two entities. See [`Store::synthesize`].
    pub fn combine(&mut self, a: Entity, b: Entity) -> Entity {
        self.synthesize(a, b).entity
    }

    /// Combine two entities and report how the result was obtained.
    ///
    /// - `a == b`: returns `a`, nothing changes.
    /// - derived id already registered: returns it, nothing changes.
    /// - otherwise: registers the derived entity with relationships to both
    ///   operands. Operands this store has never seen are registered first so
    ///   no relationship points outside the entity map.
    pub fn synthesize(&mut self, a: Entity, b: Entity) -> Synthesis {
        if a.id() == b.id() {
            return Synthesis::reflexive(a);
        }
        self.synthesize_derived(a, b, derive_id(a.id(), b.id()))
    }

    /// Second half of `synthesize`, once the derived id is known.
    pub(crate) fn synthesize_derived(&mut self, a: Entity, b: Entity, id: EntityId) -> Synthesis {
        if let Some(existing) = self.get(id) {
            return Synthesis::existing(existing);
        }

        self.entities.entry(a.id()).or_insert(a);
        self.entities.entry(b.id()).or_insert(b);

        let entity = Entity::new(id);
        self.entities.insert(id, entity);
        self.relationships.insert(id, a.id());
        self.relationships.insert(id, b.id());

        debug_assert!(
            self.relationships
                .neighbors(id)
                .iter()
                .all(|n| self.entities.contains_key(n)),
            "relationship endpoint missing from entity map"
        );

        Synthesis::new(entity, SynthesisOutcome::Created)
    }

    /// Take an owned copy of all entities and relationships.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(
            self.entities.values().copied().collect(),
            self.relationships.clone(),
        )
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================
