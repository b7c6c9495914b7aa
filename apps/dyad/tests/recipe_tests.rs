//! Integration tests for recipe files and config files on disk.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use dyad::config::{FileConfig, LogFormat, Overrides, Settings};
use dyad::recipe::Recipe;
use dyad_core::{Store, align, export_canonical};
use std::io::Write;
use std::path::PathBuf;

/// Recipes shipped at the workspace root.
fn shipped_recipe(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../recipes")
        .join(name)
}

// =============================================================================
// RECIPE TESTS
// =============================================================================

#[test]
fn test_shipped_recipes_align_completely() {
    let english = Recipe::load(&shipped_recipe("english.toml")).unwrap();
    let japanese = Recipe::load(&shipped_recipe("japanese.toml")).unwrap();

    let mut left_store = Store::new();
    let mut right_store = Store::new();
    let left = english.apply(&mut left_store).unwrap();
    let right = japanese.apply(&mut right_store).unwrap();

    let pairs = align(&left, &right);
    assert_eq!(pairs.len(), 6);
    let nature = pairs.iter().find(|p| p.left == "Nature").unwrap();
    assert_eq!(nature.right, "自然");
    assert_eq!(
        nature.id.as_str(),
        "1dfb234fdd019492fbd21bdbf98c5f2c52dca9c95ff4bcdac310f07bbae10eb7"
    );

    // Same structure, same bytes on disk.
    assert_eq!(
        export_canonical(&left_store.snapshot()).unwrap(),
        export_canonical(&right_store.snapshot()).unwrap()
    );
}

#[test]
fn test_recipe_applied_twice_adds_nothing() {
    let recipe = Recipe::load(&shipped_recipe("english.toml")).unwrap();
    let mut store = Store::new();

    recipe.apply(&mut store).unwrap();
    let after_first = store.clone();
    recipe.apply(&mut store).unwrap();

    assert_eq!(store, after_first);
}

#[test]
fn test_partial_structure_aligns_partially() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
name = "partial"

[origins]
zero = "nothing"
one = "something"

[[step]]
left = "something"
right = "nothing"
label = "being"

[[step]]
left = "being"
right = "being"
label = "still being"
"#
    )
    .unwrap();

    let partial = Recipe::load(file.path()).unwrap();
    let english = Recipe::load(&shipped_recipe("english.toml")).unwrap();

    let left = english.apply(&mut Store::new()).unwrap();
    let right = partial.apply(&mut Store::new()).unwrap();

    // Self-combination relabels "being"; only the origins and Existence line up.
    let pairs = align(&left, &right);
    let labels: Vec<(&str, &str)> = pairs
        .iter()
        .map(|p| (p.left.as_str(), p.right.as_str()))
        .collect();
    assert_eq!(labels.len(), 3);
    assert!(labels.contains(&("Existence", "still being")));
    assert!(labels.contains(&("Void", "nothing")));
}

// =============================================================================
// CONFIG FILE TESTS
// =============================================================================

#[test]
fn test_config_file_feeds_settings() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[server]
port = 9443

[store]
path = "/var/lib/dyad/main.store"

[log]
format = "json"
"#
    )
    .unwrap();

    let config = FileConfig::load(file.path()).unwrap();
    let settings = Settings::resolve(&Overrides::default(), &config, |_| None).unwrap();

    assert_eq!(settings.port, 9443);
    assert_eq!(settings.host, "127.0.0.1");
    assert_eq!(settings.store, PathBuf::from("/var/lib/dyad/main.store"));
    assert_eq!(settings.log_format, LogFormat::Json);
}

#[test]
fn test_malformed_config_file_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[server]\nport = \"not a number\"\n").unwrap();

    assert!(FileConfig::load(file.path()).is_err());
}
