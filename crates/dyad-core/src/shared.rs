//! # Shared Store
//!
//! Thread-safe handle over a [`Store`].
//!
//! The check-then-insert inside a combine is a critical section: two callers
//! that both see a pair as absent must not both register it. `SharedStore`
//! resolves repeats under the read lock and performs the registration under
//! the write lock, where the lookup is repeated. A snapshot is copied under
//! the read lock, so it can never observe a derived entity without both of
//! its relationships.
//!
//! No code path panics while holding the lock, so a poisoned lock still
//! guards a consistent store and is recovered rather than propagated.

use crate::canonical::derive_id;
use crate::snapshot::Snapshot;
use crate::store::{Store, Synthesis};
use crate::{DyadError, Entity, EntityId};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable, `Send + Sync` handle to one store.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<RwLock<Store>>,
}

impl SharedStore {
    /// Wrap a fresh store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire a read guard for several consistent reads in a row.
    pub fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Combine two entities. See [`Store::synthesize`].
    pub fn combine(&self, a: Entity, b: Entity) -> Entity {
        self.synthesize(a, b).entity
    }

    /// Combine two entities and report how the result was obtained.
    pub fn synthesize(&self, a: Entity, b: Entity) -> Synthesis {
        if a.id() == b.id() {
            return Synthesis::reflexive(a);
        }
        let id = derive_id(a.id(), b.id());

        if let Some(existing) = self.read().get(id) {
            return Synthesis::existing(existing);
        }

        self.write().synthesize_derived(a, b, id)
    }

    /// Take an owned copy of all entities and relationships.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.read().snapshot()
    }

    /// Look up a registered entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<Entity> {
        self.read().get(id)
    }

    /// Look up a registered entity, failing with `UnknownEntity`.
    pub fn require(&self, id: EntityId) -> Result<Entity, DyadError> {
        self.read().require(id)
    }

    /// Replace the whole store, e.g. after an import.
    pub fn replace(&self, store: Store) {
        *self.write() = store;
    }
}

impl From<Store> for SharedStore {
    fn from(store: Store) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SynthesisOutcome;
    use std::thread;

    #[test]
    fn shared_combine_matches_store_combine() {
        let shared = SharedStore::new();
        let mut plain = Store::new();

        let (a, b) = (plain.origin0(), plain.origin1());
        let expected = plain.combine(a, b);
        let got = shared.synthesize(b, a);

        assert_eq!(got.entity, expected);
        assert_eq!(got.outcome, SynthesisOutcome::Created);
        assert_eq!(shared.synthesize(a, b).outcome, SynthesisOutcome::Existing);
        assert_eq!(shared.snapshot(), plain.snapshot());
    }

    #[test]
    fn concurrent_combines_register_once() {
        let shared = SharedStore::new();
        let (a, b) = {
            let store = shared.read();
            (store.origin0(), store.origin1())
        };

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    if i % 2 == 0 {
                        shared.synthesize(a, b)
                    } else {
                        shared.synthesize(b, a)
                    }
                })
            })
            .collect();

        let results: Vec<Synthesis> = handles
            .into_iter()
            .map(|h| h.join().expect("thread"))
            .collect();

        let created = results
            .iter()
            .filter(|s| s.outcome == SynthesisOutcome::Created)
            .count();
        assert_eq!(created, 1);
        assert!(results.windows(2).all(|w| w[0].entity == w[1].entity));

        let store = shared.read();
        assert_eq!(store.entity_count(), 3);
        assert_eq!(store.relationship_count(), 3);
    }

    #[test]
    fn replace_swaps_contents() {
        let shared = SharedStore::new();
        let mut grown = Store::new();
        let e = grown.combine(grown.origin0(), grown.origin1());

        shared.replace(grown);
        assert_eq!(shared.get(e.id()), Some(e));
        assert!(shared.require(EntityId::ORIGIN1).is_ok());
    }
}
