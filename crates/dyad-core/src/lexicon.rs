//! # Lexicon
//!
//! Labels one vocabulary onto the entities of a store.
//!
//! A lexicon is a consumer of the store: it only calls `combine` and keeps
//! its own label maps. Because ids depend on structure alone, two lexicons
//! that build the same structure under different labels end up holding the
//! same ids, and [`align`] can pair their labels without walking any graph.

use crate::primitives::MAX_LABEL_LENGTH;
use crate::store::{Store, Synthesis};
use crate::{DyadError, Entity, EntityId};
use serde::Serialize;
use std::collections::BTreeMap;

/// Bidirectional label map over one store's entities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexicon {
    /// label -> id
    ids: BTreeMap<String, EntityId>,
    /// id -> most recent label
    labels: BTreeMap<EntityId, String>,
}

/// Two labels, from two lexicons, naming the same entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alignment {
    pub id: EntityId,
    pub left: String,
    pub right: String,
}

impl Lexicon {
    /// Label the two primordial entities of `store`.
    pub fn new(store: &Store, zero: &str, one: &str) -> Result<Self, DyadError> {
        let mut lexicon = Self::default();
        lexicon.assign(store.origin0().id(), zero)?;
        lexicon.assign(store.origin1().id(), one)?;
        Ok(lexicon)
    }

    fn assign(&mut self, id: EntityId, label: &str) -> Result<(), DyadError> {
        validate_label(label)?;
        if let Some(previous) = self.ids.insert(label.to_string(), id)
            && previous != id
            && self.labels.get(&previous).is_some_and(|l| l == label)
        {
            self.labels.remove(&previous);
        }
        self.labels.insert(id, label.to_string());
        Ok(())
    }

    /// Combine the entities named `left` and `right` and name the result.
    ///
    /// A label can be reassigned; the newest assignment wins in both
    /// directions.
    pub fn ponder(
        &mut self,
        store: &mut Store,
        left: &str,
        right: &str,
        label: &str,
    ) -> Result<Entity, DyadError> {
        self.synthesize(store, left, right, label)
            .map(|synthesis| synthesis.entity)
    }

    /// Like [`Lexicon::ponder`], also reporting how the entity was obtained.
    pub fn synthesize(
        &mut self,
        store: &mut Store,
        left: &str,
        right: &str,
        label: &str,
    ) -> Result<Synthesis, DyadError> {
        validate_label(label)?;
        let a = self.resolve(store, left)?;
        let b = self.resolve(store, right)?;
        let synthesis = store.synthesize(a, b);
        self.assign(synthesis.entity.id(), label)?;
        Ok(synthesis)
    }

    fn resolve(&self, store: &Store, label: &str) -> Result<Entity, DyadError> {
        let id = self
            .id_of(label)
            .ok_or_else(|| DyadError::UnknownLabel(label.to_string()))?;
        store.require(id)
    }

    /// The id currently named `label`.
    #[must_use]
    pub fn id_of(&self, label: &str) -> Option<EntityId> {
        self.ids.get(label).copied()
    }

    /// The latest label given to `id`.
    #[must_use]
    pub fn label_of(&self, id: EntityId) -> Option<&str> {
        self.labels.get(&id).map(String::as_str)
    }

    /// Labelled ids in id order.
    pub fn entries(&self) -> impl Iterator<Item = (EntityId, &str)> {
        self.labels.iter().map(|(id, label)| (*id, label.as_str()))
    }

    /// Number of labelled entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True if nothing is labelled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

fn validate_label(label: &str) -> Result<(), DyadError> {
    if label.is_empty() || label.len() > MAX_LABEL_LENGTH {
        return Err(DyadError::InvalidLabel(label.chars().take(32).collect()));
    }
    Ok(())
}

/// Pair the labels of two lexicons that name the same id, in id order.
#[must_use]
pub fn align(left: &Lexicon, right: &Lexicon) -> Vec<Alignment> {
    left.entries()
        .filter_map(|(id, l)| {
            right.label_of(id).map(|r| Alignment {
                id,
                left: l.to_string(),
                right: r.to_string(),
            })
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
