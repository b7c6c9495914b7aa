//! # Innate Primitives
//!
//! Hardcoded constants for the Dyad CORE.
//!
//! The store starts with two entities and fixed logic.
//! These primitives are compiled into the binary and are immutable at runtime.
//! Changing any of the identity constants changes every derived id, so they
//! are part of the format contract.

/// Reserved id of the first primordial entity.
pub const ORIGIN0_ID: &str = "0";

/// Reserved id of the second primordial entity.
pub const ORIGIN1_ID: &str = "1";

/// Separator between the two operand ids in the canonical form.
///
/// Never appears inside an id: ids are either a single digit or lowercase hex.
pub const CANONICAL_SEPARATOR: char = ':';

/// Length in characters of a derived id (lowercase hex SHA-256).
pub const DERIVED_ID_LEN: usize = 64;

/// Number of characters shown by diagnostic renderings of an id.
pub const SHORT_ID_LEN: usize = 4;

/// Maximum number of entities accepted by a canonical import.
///
/// Prevents memory exhaustion from malicious or corrupted data.
pub const MAX_IMPORT_ENTITY_COUNT: u64 = 1_000_000;

/// Maximum number of relationships accepted by a canonical import.
///
/// Every derived entity carries exactly two relationships, plus the primordial one.
pub const MAX_IMPORT_RELATIONSHIP_COUNT: u64 = 2 * MAX_IMPORT_ENTITY_COUNT;

/// Maximum number of steps in a single recipe.
pub const MAX_RECIPE_STEPS: usize = 10_000;

/// Maximum length of a lexicon label in bytes.
pub const MAX_LABEL_LENGTH: usize = 256;
