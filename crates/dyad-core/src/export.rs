//! # Canonical Export Module
//!
//! Deterministic, bit-exact serialization of a store.
//!
//! Entities and relationships are written sorted, so two stores holding the
//! same content export identical bytes regardless of the order their
//! combines ran in. The export is also the on-disk format used by the CLI.
//!
//! Format:
//! ```text
//! [header_len: u32 LE] [CanonicalHeader (postcard)] [CanonicalStore (postcard)]
//! ```

use crate::primitives::{MAX_IMPORT_ENTITY_COUNT, MAX_IMPORT_RELATIONSHIP_COUNT};
use crate::relations::Relationship;
use crate::snapshot::Snapshot;
use crate::store::Store;
use crate::{DyadError, Entity, EntityId};
use serde::{Deserialize, Serialize};

// =============================================================================
// CANONICAL FORMAT
// =============================================================================

/// Magic bytes for canonical export format.
pub const CANONICAL_MAGIC: [u8; 4] = *b"DYEX"; // Dyad Export

/// Current canonical format version.
pub const CANONICAL_VERSION: u8 = 1;

/// Header for canonical export files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalHeader {
    /// Magic bytes to identify the format.
    pub magic: [u8; 4],

    /// Format version for compatibility.
    pub version: u8,

    /// Number of entities in the export.
    pub entity_count: u64,

    /// Number of relationships in the export.
    pub relationship_count: u64,

    /// Checksum of the data section.
    pub checksum: u64,
}

impl CanonicalHeader {
    /// Create a new header with the given counts.
    #[must_use]
    pub fn new(entity_count: u64, relationship_count: u64, checksum: u64) -> Self {
        Self {
            magic: CANONICAL_MAGIC,
            version: CANONICAL_VERSION,
            entity_count,
            relationship_count,
            checksum,
        }
    }

    /// Validate the header.
    ///
    /// Error messages stay generic so they do not describe the format.
    pub fn validate(&self) -> Result<(), DyadError> {
        if self.magic != CANONICAL_MAGIC {
            return Err(DyadError::SerializationError(
                "Invalid file format".to_string(),
            ));
        }
        if self.version != CANONICAL_VERSION {
            return Err(DyadError::SerializationError(
                "Unsupported file version".to_string(),
            ));
        }
        if self.entity_count > MAX_IMPORT_ENTITY_COUNT {
            return Err(DyadError::SerializationError(format!(
                "Entity count {} exceeds maximum allowed {}",
                self.entity_count, MAX_IMPORT_ENTITY_COUNT
            )));
        }
        if self.relationship_count > MAX_IMPORT_RELATIONSHIP_COUNT {
            return Err(DyadError::SerializationError(format!(
                "Relationship count {} exceeds maximum allowed {}",
                self.relationship_count, MAX_IMPORT_RELATIONSHIP_COUNT
            )));
        }
        Ok(())
    }
}

/// A relationship in canonical format, smaller id first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct CanonicalRelationship {
    pub low: EntityId,
    pub high: EntityId,
}

impl From<&Relationship> for CanonicalRelationship {
    fn from(rel: &Relationship) -> Self {
        Self {
            low: rel.low(),
            high: rel.high(),
        }
    }
}

/// A store in canonical format for bit-exact serialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalStore {
    /// Entity ids, ascending.
    pub entities: Vec<EntityId>,

    /// Relationships, ascending by (low, high).
    pub relationships: Vec<CanonicalRelationship>,
}

impl CanonicalStore {
    /// Lay out a snapshot in canonical order.
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        // Both collections are BTree-backed, so iteration is already sorted.
        Self {
            entities: snapshot.entities().iter().map(Entity::id).collect(),
            relationships: snapshot
                .relationships()
                .iter()
                .map(CanonicalRelationship::from)
                .collect(),
        }
    }

    /// Rebuild the snapshot, rejecting non-canonical layouts.
    pub fn to_snapshot(&self) -> Result<Snapshot, DyadError> {
        if !self.entities.windows(2).all(|w| w[0] < w[1]) {
            return Err(DyadError::SerializationError(
                "Entities not in canonical order".to_string(),
            ));
        }
        if !self.relationships.windows(2).all(|w| w[0] < w[1]) {
            return Err(DyadError::SerializationError(
                "Relationships not in canonical order".to_string(),
            ));
        }
        if let Some(bad) = self.relationships.iter().find(|r| r.low >= r.high) {
            return Err(DyadError::InvariantViolation(format!(
                "relationship ({}, {}) not in canonical orientation",
                bad.low, bad.high
            )));
        }

        Ok(Snapshot::new(
            self.entities.iter().copied().map(Entity::new).collect(),
            self.relationships
                .iter()
                .map(|r| Relationship::new(r.low, r.high))
                .collect(),
        ))
    }

    /// Compute a deterministic checksum of the data.
    ///
    /// Order-sensitive 64-bit mix over every id byte. Integer only, no
    /// randomness.
    ///
    /// # Security Note
    ///
    /// This is **NOT** a cryptographic hash. It detects accidental
    /// corruption only. Use the `crypto-hash` feature for a BLAKE3
    /// fingerprint.
    #[must_use]
    pub fn checksum(&self) -> u64 {
        const PRIME: u64 = 0x0000_0100_0000_01b3;

        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        let mut mix = |bytes: &[u8], tag: u8| {
            hash = (hash ^ u64::from(tag)).wrapping_mul(PRIME);
            for byte in bytes {
                hash = (hash.rotate_left(5) ^ u64::from(*byte)).wrapping_mul(PRIME);
            }
        };

        for id in &self.entities {
            mix(id.as_bytes(), b'E');
        }
        for rel in &self.relationships {
            mix(rel.low.as_bytes(), b'L');
            mix(rel.high.as_bytes(), b'H');
        }

        hash
    }
}

// =============================================================================
// EXPORT FUNCTIONS
// =============================================================================

/// Export a snapshot to canonical postcard format.
///
/// # Errors
///
/// Returns `DyadError::SerializationError` if serialization fails.
pub fn export_canonical(snapshot: &Snapshot) -> Result<Vec<u8>, DyadError> {
    let canonical = CanonicalStore::from_snapshot(snapshot);
    let header = CanonicalHeader::new(
        canonical.entities.len() as u64,
        canonical.relationships.len() as u64,
        canonical.checksum(),
    );

    let header_bytes = postcard::to_allocvec(&header)
        .map_err(|e| DyadError::SerializationError(format!("Header: {}", e)))?;
    let data_bytes = postcard::to_allocvec(&canonical)
        .map_err(|e| DyadError::SerializationError(format!("Data: {}", e)))?;

    let header_len = u32::try_from(header_bytes.len())
        .map_err(|_| DyadError::SerializationError("Header too large".to_string()))?;

    let mut result = Vec::with_capacity(4 + header_bytes.len() + data_bytes.len());
    result.extend_from_slice(&header_len.to_le_bytes());
    result.extend_from_slice(&header_bytes);
    result.extend_from_slice(&data_bytes);

    Ok(result)
}

/// Import a store from canonical postcard format.
///
/// The header, including size limits, is validated before the data section
/// is decoded. The decoded content must pass [`Snapshot::verify`].
///
/// # Errors
///
/// Returns `DyadError::SerializationError` on malformed or corrupted data
/// and `DyadError::InvariantViolation` if the content is not a valid store.
pub fn import_canonical(data: &[u8]) -> Result<Store, DyadError> {
    let Some((len_bytes, rest)) = data.split_first_chunk::<4>() else {
        return Err(DyadError::SerializationError(
            "Data too short".to_string(),
        ));
    };
    let header_len = u32::from_le_bytes(*len_bytes) as usize;

    if rest.len() < header_len {
        return Err(DyadError::SerializationError(
            "Data too short for header".to_string(),
        ));
    }
    let (header_bytes, data_bytes) = rest.split_at(header_len);

    let header: CanonicalHeader = postcard::from_bytes(header_bytes)
        .map_err(|e| DyadError::SerializationError(format!("Header: {}", e)))?;
    header.validate()?;

    let canonical: CanonicalStore = postcard::from_bytes(data_bytes)
        .map_err(|e| DyadError::SerializationError(format!("Data: {}", e)))?;

    let computed = canonical.checksum();
    if computed != header.checksum {
        return Err(DyadError::SerializationError(format!(
            "Checksum mismatch: expected {}, got {}",
            header.checksum, computed
        )));
    }
    if canonical.entities.len() as u64 != header.entity_count {
        return Err(DyadError::SerializationError(
            "Entity count mismatch".to_string(),
        ));
    }
    if canonical.relationships.len() as u64 != header.relationship_count {
        return Err(DyadError::SerializationError(
            "Relationship count mismatch".to_string(),
        ));
    }

    Store::from_snapshot(canonical.to_snapshot()?)
}

/// Verify that a snapshot matches a canonical export.
pub fn verify_canonical(snapshot: &Snapshot, canonical_data: &[u8]) -> Result<bool, DyadError> {
    let imported = import_canonical(canonical_data)?;
    Ok(imported.snapshot() == *snapshot)
}

/// Compute the canonical checksum of a snapshot.
///
/// This can be used to quickly compare two stores for equality.
#[must_use]
pub fn canonical_checksum(snapshot: &Snapshot) -> u64 {
    CanonicalStore::from_snapshot(snapshot).checksum()
}

/// BLAKE3 fingerprint of the canonical export, as 64 hex characters.
///
/// # Requires
///
/// This function is only available with the `crypto-hash` feature enabled.
#[cfg(feature = "crypto-hash")]
pub fn canonical_crypto_hash(snapshot: &Snapshot) -> Result<String, DyadError> {
    let data = export_canonical(snapshot)?;
    Ok(blake3::hash(&data).to_hex().to_string())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn create_test_store() -> Store {
        let mut store = Store::new();
        let e = store.combine(store.origin0(), store.origin1());
        let f = store.combine(e, store.origin0());
        let g = store.combine(e, store.origin1());
        store.combine(f, g);
        store
    }

    fn split(data: &[u8]) -> (CanonicalHeader, CanonicalStore, usize) {
        let header_len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
        let header = postcard::from_bytes(&data[4..4 + header_len]).unwrap();
        let canonical = postcard::from_bytes(&data[4 + header_len..]).unwrap();
        (header, canonical, header_len)
    }

    fn assemble(header: &CanonicalHeader, canonical: &CanonicalStore) -> Vec<u8> {
        let header_bytes = postcard::to_allocvec(header).unwrap();
        let data_bytes = postcard::to_allocvec(canonical).unwrap();
        let mut data = (header_bytes.len() as u32).to_le_bytes().to_vec();
        data.extend_from_slice(&header_bytes);
        data.extend_from_slice(&data_bytes);
        data
    }

    #[test]
    fn canonical_roundtrip() {
        let store = create_test_store();
        let exported = export_canonical(&store.snapshot()).expect("export");
        let imported = import_canonical(&exported).expect("import");

        assert_eq!(imported, store);
        assert_eq!(imported.entity_count(), 6);
        assert_eq!(imported.relationship_count(), 9);
    }

    #[test]
    fn fresh_store_roundtrip() {
        let store = Store::new();
        let exported = export_canonical(&store.snapshot()).expect("export");
        let imported = import_canonical(&exported).expect("import");
        assert_eq!(imported.entity_count(), 2);
        assert_eq!(imported.relationship_count(), 1);
    }

    #[test]
    fn export_is_independent_of_combine_order() {
        let left = create_test_store();

        let mut right = Store::new();
        let e = right.combine(right.origin1(), right.origin0());
        let g = right.combine(right.origin1(), e);
        let f = right.combine(right.origin0(), e);
        right.combine(g, f);

        assert_eq!(
            export_canonical(&left.snapshot()).unwrap(),
            export_canonical(&right.snapshot()).unwrap(),
            "Exports must be bit-identical"
        );
        assert_eq!(
            canonical_checksum(&left.snapshot()),
            canonical_checksum(&right.snapshot())
        );
    }

    #[test]
    fn verify_canonical_success_and_mismatch() {
        let store = create_test_store();
        let exported = export_canonical(&store.snapshot()).expect("export");
        assert!(verify_canonical(&store.snapshot(), &exported).expect("verify"));
        assert!(!verify_canonical(&Store::new().snapshot(), &exported).expect("verify"));
    }

    #[test]
    fn header_validation() {
        assert!(CanonicalHeader::new(10, 5, 12345).validate().is_ok());

        let mut bad_magic = CanonicalHeader::new(0, 0, 0);
        bad_magic.magic = *b"XXXX";
        assert!(bad_magic.validate().is_err());

        let mut bad_version = CanonicalHeader::new(0, 0, 0);
        bad_version.version = 99;
        assert!(bad_version.validate().is_err());

        let too_many = CanonicalHeader::new(MAX_IMPORT_ENTITY_COUNT + 1, 0, 0);
        assert!(too_many.validate().is_err());
    }

    // =========================================================================
    // Corrupted imports
    // =========================================================================

    #[test]
    fn corrupted_import_empty_data() {
        let err = import_canonical(&[]).unwrap_err();
        assert!(matches!(err, DyadError::SerializationError(_)));
    }

    #[test]
    fn corrupted_import_header_length_exceeds_data() {
        let result = import_canonical(&[0xFF, 0x00, 0x00, 0x00, 0x01]);
        assert!(result.is_err());
    }

    #[test]
    fn corrupted_import_flipped_byte() {
        let store = create_test_store();
        let mut exported = export_canonical(&store.snapshot()).expect("export");
        if let Some(last) = exported.last_mut() {
            *last ^= 0xFF;
        }
        assert!(import_canonical(&exported).is_err());
    }

    #[test]
    fn corrupted_import_checksum_mismatch() {
        let store = create_test_store();
        let exported = export_canonical(&store.snapshot()).expect("export");
        let (mut header, canonical, _) = split(&exported);
        header.checksum ^= 1;

        let err = import_canonical(&assemble(&header, &canonical)).unwrap_err();
        match err {
            DyadError::SerializationError(msg) => assert!(msg.contains("Checksum")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn corrupted_import_entity_count_mismatch() {
        let store = create_test_store();
        let exported = export_canonical(&store.snapshot()).expect("export");
        let (mut header, canonical, _) = split(&exported);
        header.entity_count += 1;
        assert!(import_canonical(&assemble(&header, &canonical)).is_err());
    }

    #[test]
    fn import_rejects_missing_relationship() {
        let store = create_test_store();
        let mut canonical = CanonicalStore::from_snapshot(&store.snapshot());
        canonical.relationships.pop();
        let header = CanonicalHeader::new(
            canonical.entities.len() as u64,
            canonical.relationships.len() as u64,
            canonical.checksum(),
        );

        let err = import_canonical(&assemble(&header, &canonical)).unwrap_err();
        assert!(matches!(err, DyadError::InvariantViolation(_)));
    }

    #[test]
    fn import_rejects_isolated_entity() {
        let mut canonical = CanonicalStore::from_snapshot(&Store::new().snapshot());
        canonical.entities.push(EntityId::parse(&"a".repeat(64)).unwrap());
        let header = CanonicalHeader::new(3, 1, canonical.checksum());

        let err = import_canonical(&assemble(&header, &canonical)).unwrap_err();
        assert!(matches!(err, DyadError::InvariantViolation(_)));
    }

    #[test]
    fn import_accepts_adopted_hub() {
        let mut donor = Store::new();
        let hub = donor.combine(donor.origin0(), donor.origin1());

        let mut store = Store::new();
        let mut last = store.origin1();
        for _ in 0..500 {
            last = store.combine(hub, last);
        }
        // The hub was never synthesized here, so none of its neighbors hash to it.
        let exported = export_canonical(&store.snapshot()).unwrap();
        let imported = import_canonical(&exported).unwrap();
        assert_eq!(imported, store);
        assert_eq!(imported.entity_count(), 503);
    }

    #[test]
    fn import_rejects_reversed_orientation() {
        let mut canonical = CanonicalStore::from_snapshot(&Store::new().snapshot());
        canonical.relationships[0] = CanonicalRelationship {
            low: EntityId::ORIGIN1,
            high: EntityId::ORIGIN0,
        };
        let header = CanonicalHeader::new(2, 1, canonical.checksum());

        let err = import_canonical(&assemble(&header, &canonical)).unwrap_err();
        assert!(matches!(err, DyadError::InvariantViolation(_)));
    }

    #[test]
    fn import_rejects_unsorted_entities() {
        let mut canonical = CanonicalStore::from_snapshot(&Store::new().snapshot());
        canonical.entities.reverse();
        let header = CanonicalHeader::new(2, 1, canonical.checksum());
        assert!(import_canonical(&assemble(&header, &canonical)).is_err());
    }

    #[test]
    fn corrupted_import_random_bytes() {
        let garbage: Vec<u8> = (0u8..64).map(|i| i.wrapping_mul(37)).collect();
        assert!(import_canonical(&garbage).is_err());
    }

    #[test]
    fn checksum_is_order_sensitive() {
        let store = create_test_store();
        let canonical = CanonicalStore::from_snapshot(&store.snapshot());
        let mut swapped = canonical.clone();
        swapped.entities.swap(0, 1);
        assert_ne!(canonical.checksum(), swapped.checksum());
    }

    #[cfg(feature = "crypto-hash")]
    #[test]
    fn crypto_hash_is_stable() {
        let store = create_test_store();
        let h1 = canonical_crypto_hash(&store.snapshot()).expect("hash");
        let h2 = canonical_crypto_hash(&store.snapshot()).expect("hash");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }
}
