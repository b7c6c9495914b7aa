//! # Relationship Set
//!
//! Undirected entity pairs stored in canonical orientation.
//!
//! A `Relationship` can only be built through [`Relationship::new`], which
//! puts the smaller id first. Symmetry is therefore a property of the type:
//! `(x, y)` and `(y, x)` are the same value and the set can never hold both.

use crate::EntityId;
use crate::canonical::ordered;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// RELATIONSHIP
// =============================================================================

/// An unordered pair of entity ids, smaller id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Relationship {
    low: EntityId,
    high: EntityId,
}

impl Relationship {
    /// Build the canonical relationship between `a` and `b`.
    #[must_use]
    pub fn new(a: EntityId, b: EntityId) -> Self {
        let (low, high) = ordered(a, b);
        Self { low, high }
    }

    /// The smaller endpoint.
    #[must_use]
    pub const fn low(&self) -> EntityId {
        self.low
    }

    /// The larger endpoint.
    #[must_use]
    pub const fn high(&self) -> EntityId {
        self.high
    }

    /// Both endpoints, smaller first.
    #[must_use]
    pub const fn endpoints(&self) -> (EntityId, EntityId) {
        (self.low, self.high)
    }

    /// True if `id` is one of the endpoints.
    #[must_use]
    pub fn touches(&self, id: EntityId) -> bool {
        self.low == id || self.high == id
    }

    /// The endpoint opposite `id`, if `id` is an endpoint.
    #[must_use]
    pub fn other(&self, id: EntityId) -> Option<EntityId> {
        if self.low == id {
            Some(self.high)
        } else if self.high == id {
            Some(self.low)
        } else {
            None
        }
    }
}

// Decoding goes through `new` so a stored pair is re-canonicalized.
impl<'de> Deserialize<'de> for Relationship {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            low: EntityId,
            high: EntityId,
        }
        let raw = Raw::deserialize(deserializer)?;
        Ok(Self::new(raw.low, raw.high))
    }
}

// =============================================================================
// RELATIONSHIP SET
// =============================================================================

/// Set of canonical relationships with deterministic iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipSet {
    pairs: BTreeSet<Relationship>,
}

impl RelationshipSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the relationship between `a` and `b`.
    ///
    /// Returns `true` if the pair was not present in either orientation.
    pub fn insert(&mut self, a: EntityId, b: EntityId) -> bool {
        self.pairs.insert(Relationship::new(a, b))
    }

    /// Check for the relationship between `a` and `b`, in either orientation.
    #[must_use]
    pub fn contains(&self, a: EntityId, b: EntityId) -> bool {
        self.pairs.contains(&Relationship::new(a, b))
    }

    /// All ids related to `id`, in ascending order.
    #[must_use]
    pub fn neighbors(&self, id: EntityId) -> BTreeSet<EntityId> {
        self.pairs.iter().filter_map(|rel| rel.other(id)).collect()
    }

    /// Number of relationships.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True if there are no relationships.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Relationships in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.pairs.iter()
    }
}

impl FromIterator<Relationship> for RelationshipSet {
    fn from_iter<I: IntoIterator<Item = Relationship>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RelationshipSet {
    type Item = &'a Relationship;
    type IntoIter = std::collections::btree_set::Iter<'a, Relationship>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::derive_id;

    #[test]
    fn relationship_is_canonical_in_both_orders() {
        let a = Relationship::new(EntityId::ORIGIN1, EntityId::ORIGIN0);
        let b = Relationship::new(EntityId::ORIGIN0, EntityId::ORIGIN1);
        assert_eq!(a, b);
        assert_eq!(a.low(), EntityId::ORIGIN0);
        assert_eq!(a.high(), EntityId::ORIGIN1);
    }

    #[test]
    fn set_deduplicates_reversed_pairs() {
        let mut set = RelationshipSet::new();
        assert!(set.insert(EntityId::ORIGIN0, EntityId::ORIGIN1));
        assert!(!set.insert(EntityId::ORIGIN1, EntityId::ORIGIN0));
        assert_eq!(set.len(), 1);
        assert!(set.contains(EntityId::ORIGIN1, EntityId::ORIGIN0));
    }

    #[test]
    fn neighbors_are_collected_from_both_sides() {
        let c = derive_id(EntityId::ORIGIN0, EntityId::ORIGIN1);
        let mut set = RelationshipSet::new();
        set.insert(EntityId::ORIGIN0, EntityId::ORIGIN1);
        set.insert(c, EntityId::ORIGIN0);
        set.insert(c, EntityId::ORIGIN1);

        let around_zero: Vec<_> = set.neighbors(EntityId::ORIGIN0).into_iter().collect();
        assert_eq!(around_zero, vec![EntityId::ORIGIN1, c]);
        assert_eq!(set.neighbors(c).len(), 2);
    }

    #[test]
    fn other_endpoint() {
        let rel = Relationship::new(EntityId::ORIGIN0, EntityId::ORIGIN1);
        assert_eq!(rel.other(EntityId::ORIGIN0), Some(EntityId::ORIGIN1));
        assert!(rel.touches(EntityId::ORIGIN1));
        let c = derive_id(EntityId::ORIGIN0, EntityId::ORIGIN1);
        assert_eq!(rel.other(c), None);
    }

    #[test]
    fn decoding_recanonicalizes_orientation() {
        #[derive(Serialize)]
        struct Raw {
            low: EntityId,
            high: EntityId,
        }
        let bytes = postcard::to_allocvec(&Raw {
            low: EntityId::ORIGIN1,
            high: EntityId::ORIGIN0,
        })
        .expect("serialize");
        let rel: Relationship = postcard::from_bytes(&bytes).expect("deserialize");
        assert_eq!(rel.endpoints(), (EntityId::ORIGIN0, EntityId::ORIGIN1));
    }
}
