//! # Snapshot
//!
//! An owned, immutable copy of the store at one instant.
//!
//! A snapshot shares nothing with the store it was taken from, so consumers
//! (graph analysis, rendering, demos) can hold it while the store keeps
//! growing. It also carries the invariant checker used when rebuilding a
//! store from imported data.

use crate::canonical::derive_id;
use crate::relations::RelationshipSet;
use crate::{DyadError, Entity, EntityId};
use std::collections::{BTreeMap, BTreeSet};

/// Consistent view of all entities and relationships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    entities: BTreeSet<Entity>,
    relationships: RelationshipSet,
}

impl Snapshot {
    pub(crate) fn new(entities: BTreeSet<Entity>, relationships: RelationshipSet) -> Self {
        Self {
            entities,
            relationships,
        }
    }

    /// All entities in id order.
    #[must_use]
    pub fn entities(&self) -> &BTreeSet<Entity> {
        &self.entities
    }

    /// All relationships in canonical order.
    #[must_use]
    pub fn relationships(&self) -> &RelationshipSet {
        &self.relationships
    }

    /// Number of entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of relationships.
    #[must_use]
    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Check whether an entity with this id was present.
    #[must_use]
    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.entities.contains(&Entity::new(id))
    }

    /// Check whether `a` and `b` were related, in either orientation.
    #[must_use]
    pub fn contains_relationship(&self, a: EntityId, b: EntityId) -> bool {
        self.relationships.contains(a, b)
    }

    /// Split into the entity set and the relationship set.
    #[must_use]
    pub fn into_parts(self) -> (BTreeSet<Entity>, RelationshipSet) {
        (self.entities, self.relationships)
    }

    /// Check the store invariants.
    ///
    /// - Primordial floor: both origins and their relationship are present.
    /// - Closure: every relationship endpoint is a known entity.
    /// - Irreflexivity: no entity is related to itself.
    /// - Provenance: every non-primordial entity takes part in at least one
    ///   relationship, and apart from the primordial pair every relationship
    ///   links a derived entity to one of the two operands it hashes from.
    ///
    /// Provenance is checked by peeling: an entity whose only remaining
    /// neighbors are two ids hashing to it is the newest synthesis on its
    /// branch, so its two relationships are removed and its operands become
    /// candidates in turn. A store built by `combine` peels down to the
    /// primordial pair. Entities left with no neighbors were adopted from
    /// another store as combine operands. Each entity is hashed at most
    /// once, so the check stays linear in the size of the store.
    pub fn verify(&self) -> Result<(), DyadError> {
        for origin in [EntityId::ORIGIN0, EntityId::ORIGIN1] {
            if !self.contains_entity(origin) {
                return Err(DyadError::InvariantViolation(format!(
                    "primordial entity {origin} missing"
                )));
            }
        }
        if !self.contains_relationship(EntityId::ORIGIN0, EntityId::ORIGIN1) {
            return Err(DyadError::InvariantViolation(
                "primordial relationship missing".to_string(),
            ));
        }

        let mut adjacency: BTreeMap<EntityId, BTreeSet<EntityId>> = BTreeMap::new();
        for rel in &self.relationships {
            let (low, high) = rel.endpoints();
            if low == high {
                return Err(DyadError::InvariantViolation(format!(
                    "entity {low} related to itself"
                )));
            }
            for endpoint in [low, high] {
                if !self.contains_entity(endpoint) {
                    return Err(DyadError::InvariantViolation(format!(
                        "relationship ({low}, {high}) references unknown entity {endpoint}"
                    )));
                }
            }
            adjacency.entry(low).or_default().insert(high);
            adjacency.entry(high).or_default().insert(low);
        }

        if let Some(isolated) = self
            .entities
            .iter()
            .map(Entity::id)
            .find(|id| !id.is_primordial() && !adjacency.contains_key(id))
        {
            return Err(DyadError::InvariantViolation(format!(
                "entity {isolated} has no relationships and was never synthesized"
            )));
        }

        let mut ready: Vec<EntityId> = adjacency
            .iter()
            .filter(|(id, neighbors)| !id.is_primordial() && neighbors.len() == 2)
            .map(|(id, _)| *id)
            .collect();

        while let Some(id) = ready.pop() {
            let Some((a, b)) = adjacency.get(&id).and_then(|n| operand_pair(id, n)) else {
                continue;
            };
            adjacency.remove(&id);
            for operand in [a, b] {
                if let Some(neighbors) = adjacency.get_mut(&operand) {
                    neighbors.remove(&id);
                    if !operand.is_primordial() && neighbors.len() == 2 {
                        ready.push(operand);
                    }
                }
            }
        }

        for (id, neighbors) in &adjacency {
            if id.is_primordial() && neighbors.iter().all(EntityId::is_primordial) {
                continue;
            }
            if let Some(other) = neighbors.first() {
                return Err(DyadError::InvariantViolation(format!(
                    "relationship ({id}, {other}) is not explained by any synthesis"
                )));
            }
        }

        Ok(())
    }
}

/// The two neighbors of `id` whose synthesis yields `id`, if it has exactly two.
fn operand_pair(id: EntityId, neighbors: &BTreeSet<EntityId>) -> Option<(EntityId, EntityId)> {
    let mut iter = neighbors.iter().copied();
    match (iter.next(), iter.next(), iter.next()) {
        (Some(a), Some(b), None) if derive_id(a, b) == id => Some((a, b)),
        _ => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================
