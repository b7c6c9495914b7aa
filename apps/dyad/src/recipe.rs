//! # Recipes
//!
//! A recipe is a labelled combination script in TOML:
//!
//! ```toml
//! name = "english"
//!
//! [origins]
//! zero = "Void"
//! one = "Energy"
//!
//! [[step]]
//! left = "Void"
//! right = "Energy"
//! label = "Existence"
//! ```
//!
//! Applying a recipe names the two origins, then runs each step through a
//! [`Lexicon`]. Two recipes with the same structure and different labels
//! reach the same ids, which is what `align` reports.

use dyad_core::primitives::MAX_RECIPE_STEPS;
use dyad_core::{DyadError, Lexicon, Store};
use serde::Deserialize;
use std::path::Path;

/// Maximum recipe file size (4 MB).
const MAX_RECIPE_FILE_SIZE: u64 = 4 * 1024 * 1024;

/// A parsed recipe file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Recipe {
    /// Vocabulary name, used in output only.
    pub name: String,
    /// Labels for the two primordial entities.
    pub origins: Origins,
    /// Combination steps, applied in order.
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

/// Labels for `"0"` and `"1"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Origins {
    pub zero: String,
    pub one: String,
}

/// One `combine(left, right)` named `label`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    pub left: String,
    pub right: String,
    pub label: String,
}

impl Recipe {
    /// Parse recipe TOML.
    pub fn parse(text: &str) -> Result<Self, DyadError> {
        let recipe: Self = toml::from_str(text)
            .map_err(|e| DyadError::SerializationError(format!("Invalid recipe: {}", e)))?;

        if recipe.steps.len() > MAX_RECIPE_STEPS {
            return Err(DyadError::SerializationError(format!(
                "Recipe has {} steps, maximum is {}",
                recipe.steps.len(),
                MAX_RECIPE_STEPS
            )));
        }
        Ok(recipe)
    }

    /// Read and parse a recipe file.
    pub fn load(path: &Path) -> Result<Self, DyadError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            DyadError::IoError(format!("Cannot read recipe '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_RECIPE_FILE_SIZE {
            return Err(DyadError::SerializationError(format!(
                "Recipe file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_RECIPE_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            DyadError::IoError(format!("Cannot read recipe '{}': {}", path.display(), e))
        })?;
        Self::parse(&text)
    }

    /// Run every step against `store`, returning the resulting labels.
    ///
    /// Steps before a failing one stay applied: the store only grows.
    pub fn apply(&self, store: &mut Store) -> Result<Lexicon, DyadError> {
        let mut lexicon = Lexicon::new(store, &self.origins.zero, &self.origins.one)?;

        for (index, step) in self.steps.iter().enumerate() {
            let synthesis = lexicon.synthesize(store, &step.left, &step.right, &step.label)?;
            tracing::debug!(
                recipe = %self.name,
                step = index,
                label = %step.label,
                entity = %synthesis.entity.id(),
                outcome = %synthesis.outcome,
                "recipe step"
            );
        }

        Ok(lexicon)
    }
}

// =============================================================================
// TESTS
// =============================================================================
