//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! The store file is always the canonical export. Mutating commands load it
//! (or start from the origins when it does not exist yet), apply their
//! change, and write it back.

use crate::api::{self, AppState, SnapshotResponse};
use crate::recipe::Recipe;
use dyad_core::{
    DyadError, EntityId, SharedStore, Snapshot, Store, align,
    export::{canonical_checksum, canonical_crypto_hash, export_canonical, import_canonical},
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for the store and for import (500 MB).
const MAX_STORE_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), DyadError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| DyadError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(DyadError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate an input path: resolves "..", symlinks, and requires a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, DyadError> {
    let canonical = path.canonicalize().map_err(|e| {
        DyadError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(DyadError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate an output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, DyadError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        DyadError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(DyadError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| DyadError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

/// Print a JSON value the way every `--json-mode` command does.
fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
///
/// Every combine that registers a new entity rewrites the store file before
/// it responds; the store is saved once more on shutdown.
pub async fn cmd_server(store_path: &Path, addr: &str) -> Result<(), DyadError> {
    let shared = SharedStore::from(load_or_create_store(store_path)?);

    println!("Dyad Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Address: {}", addr);
    println!("  Store:   {:?}", store_path);
    println!();
    println!("Endpoints:");
    println!("  GET  /health   - Health check");
    println!("  GET  /status   - Store status");
    println!("  POST /combine  - Combine two entities");
    println!("  GET  /snapshot - All entities and relationships");
    println!("  POST /export   - Export store");
    println!("  GET  /hash     - BLAKE3 hash of the store");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(addr, AppState::persistent(shared.clone(), store_path)).await?;

    save_snapshot(&shared.snapshot(), store_path)
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show store status.
pub fn cmd_status(store_path: &Path, json_mode: bool) -> Result<(), DyadError> {
    let store = load_or_create_store(store_path)?;
    let snapshot = store.snapshot();
    let checksum = canonical_checksum(&snapshot);

    if json_mode {
        print_json(&serde_json::json!({
            "store": store_path.to_string_lossy(),
            "entity_count": store.entity_count(),
            "relationship_count": store.relationship_count(),
            "origins": [store.origin0().id(), store.origin1().id()],
            "checksum": checksum
        }));
        return Ok(());
    }

    println!("Dyad Store Status");
    println!("=================");
    println!("Store: {:?}", store_path);
    println!();
    println!("Entities:      {}", store.entity_count());
    println!("Relationships: {}", store.relationship_count());
    println!("Checksum:      {}", checksum);

    Ok(())
}

// =============================================================================
// COMBINE COMMAND
// =============================================================================

/// Combine two entities held by the store.
pub fn cmd_combine(store_path: &Path, json_mode: bool, a: &str, b: &str) -> Result<(), DyadError> {
    let mut store = load_or_create_store(store_path)?;
    let a = store.require(EntityId::parse(a)?)?;
    let b = store.require(EntityId::parse(b)?)?;

    let synthesis = store.synthesize(a, b);
    tracing::debug!(
        a = %a.id(),
        b = %b.id(),
        entity = %synthesis.entity.id(),
        outcome = %synthesis.outcome,
        "combine"
    );

    save_store(&store, store_path)?;

    if json_mode {
        print_json(&serde_json::json!({
            "entity": synthesis.entity.id(),
            "outcome": synthesis.outcome,
            "entity_count": store.entity_count(),
            "relationship_count": store.relationship_count()
        }));
        return Ok(());
    }

    println!("{} ({})", synthesis.entity.id(), synthesis.outcome);
    Ok(())
}

// =============================================================================
// SNAPSHOT COMMAND
// =============================================================================

/// Print every entity and relationship.
pub fn cmd_snapshot(store_path: &Path, json_mode: bool) -> Result<(), DyadError> {
    let snapshot = load_or_create_store(store_path)?.snapshot();

    if json_mode {
        let response = SnapshotResponse::from(&snapshot);
        println!(
            "{}",
            serde_json::to_string_pretty(&response).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Entities ({}):", snapshot.entity_count());
    for entity in snapshot.entities() {
        println!("  {}", entity.id());
    }
    println!();
    println!("Relationships ({}):", snapshot.relationship_count());
    for rel in snapshot.relationships() {
        println!("  {} -- {}", rel.low().short(), rel.high().short());
    }

    Ok(())
}

// =============================================================================
// RUN COMMAND
// =============================================================================

/// Apply a recipe to the store and print the resulting labels.
pub fn cmd_run(store_path: &Path, json_mode: bool, file: &Path) -> Result<(), DyadError> {
    let recipe = Recipe::load(&validate_file_path(file)?)?;
    let mut store = load_or_create_store(store_path)?;
    let before = store.entity_count();

    let lexicon = recipe.apply(&mut store)?;
    save_store(&store, store_path)?;

    let created = store.entity_count() - before;
    tracing::info!(recipe = %recipe.name, steps = recipe.steps.len(), created, "Recipe applied");

    if json_mode {
        let labels: serde_json::Map<String, serde_json::Value> = lexicon
            .entries()
            .map(|(id, label)| (label.to_string(), serde_json::json!(id)))
            .collect();
        print_json(&serde_json::json!({
            "recipe": recipe.name,
            "steps": recipe.steps.len(),
            "created": created,
            "labels": labels
        }));
        return Ok(());
    }

    println!("Recipe '{}': {} steps, {} new entities", recipe.name, recipe.steps.len(), created);
    for (id, label) in lexicon.entries() {
        println!("  {:>6}  {}", id.short(), label);
    }

    Ok(())
}

// =============================================================================
// ALIGN COMMAND
// =============================================================================

/// Apply two recipes to fresh stores and pair labels that share an id.
pub fn cmd_align(json_mode: bool, left: &Path, right: &Path) -> Result<(), DyadError> {
    let left_recipe = Recipe::load(&validate_file_path(left)?)?;
    let right_recipe = Recipe::load(&validate_file_path(right)?)?;

    let left_lexicon = left_recipe.apply(&mut Store::new())?;
    let right_lexicon = right_recipe.apply(&mut Store::new())?;
    let pairs = align(&left_lexicon, &right_lexicon);

    if json_mode {
        print_json(&serde_json::json!({
            "left": left_recipe.name,
            "right": right_recipe.name,
            "alignments": pairs
        }));
        return Ok(());
    }

    println!("{} <-> {}", left_recipe.name, right_recipe.name);
    for pair in &pairs {
        println!("  {:>6}  {} = {}", pair.id.short(), pair.left, pair.right);
    }
    println!();
    println!(
        "{} aligned of {} / {} labelled",
        pairs.len(),
        left_lexicon.len(),
        right_lexicon.len()
    );

    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Export the store.
pub fn cmd_export(store_path: &Path, output: &Path, format: &str) -> Result<(), DyadError> {
    let validated_output = validate_output_path(output)?;
    let snapshot = load_or_create_store(store_path)?.snapshot();

    let data = match format {
        "canonical" => {
            let data = export_canonical(&snapshot)?;
            println!("Checksum: {}", canonical_checksum(&snapshot));
            data
        }
        "json" => serde_json::to_vec_pretty(&SnapshotResponse::from(&snapshot))
            .map_err(|e| DyadError::SerializationError(e.to_string()))?,
        _ => {
            return Err(DyadError::SerializationError(format!(
                "Unknown format: {}. Use: canonical, json",
                format
            )));
        }
    };

    std::fs::write(&validated_output, &data)
        .map_err(|e| DyadError::IoError(format!("Write file: {}", e)))?;

    println!("Exported {} bytes to {:?}", data.len(), validated_output);

    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Import a canonical export, replacing the store file.
pub fn cmd_import(store_path: &Path, input: &Path) -> Result<(), DyadError> {
    let validated_path = validate_file_path(input)?;
    validate_file_size(&validated_path, MAX_STORE_FILE_SIZE)?;

    let data = std::fs::read(&validated_path)
        .map_err(|e| DyadError::IoError(format!("Read file: {}", e)))?;

    let store = import_canonical(&data)?;
    save_store(&store, store_path)?;

    println!(
        "Imported store: {} entities, {} relationships",
        store.entity_count(),
        store.relationship_count()
    );

    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new store file.
pub fn cmd_init(store_path: &Path, force: bool) -> Result<(), DyadError> {
    if store_path.exists() && !force {
        return Err(DyadError::IoError(
            "Store already exists. Use --force to overwrite.".to_string(),
        ));
    }

    save_store(&Store::new(), store_path)?;
    println!("Initialized new store at {:?}", store_path);

    Ok(())
}

// =============================================================================
// HASH COMMAND
// =============================================================================

/// Compute the BLAKE3 hash of the canonical export.
pub fn cmd_hash(store_path: &Path, json_mode: bool) -> Result<(), DyadError> {
    let snapshot = load_or_create_store(store_path)?.snapshot();
    let hash = canonical_crypto_hash(&snapshot)?;

    if json_mode {
        print_json(&serde_json::json!({
            "algorithm": "blake3",
            "hash": hash,
            "entity_count": snapshot.entity_count(),
            "relationship_count": snapshot.relationship_count()
        }));
        return Ok(());
    }

    println!("BLAKE3: {}", hash);
    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Load the store file, or start from the origins if it does not exist.
pub fn load_or_create_store(store_path: &Path) -> Result<Store, DyadError> {
    if !store_path.exists() {
        tracing::info!(store = %store_path.display(), "No store file, starting fresh");
        return Ok(Store::new());
    }

    validate_file_size(store_path, MAX_STORE_FILE_SIZE)?;
    let data = std::fs::read(store_path)
        .map_err(|e| DyadError::IoError(format!("Read store: {}", e)))?;
    let store = import_canonical(&data)?;

    tracing::info!(
        store = %store_path.display(),
        entities = store.entity_count(),
        relationships = store.relationship_count(),
        "Store loaded"
    );
    Ok(store)
}

/// Save a store in canonical format.
pub fn save_store(store: &Store, store_path: &Path) -> Result<(), DyadError> {
    save_snapshot(&store.snapshot(), store_path)
}

fn save_snapshot(snapshot: &Snapshot, store_path: &Path) -> Result<(), DyadError> {
    let data = export_canonical(snapshot)?;
    std::fs::write(store_path, &data)
        .map_err(|e| DyadError::IoError(format!("Write store: {}", e)))?;

    tracing::info!(
        store = %store_path.display(),
        entities = snapshot.entity_count(),
        relationships = snapshot.relationship_count(),
        "Store saved"
    );
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN_PAIR: &str = "ef134f2a180ba05de91ab32d2976f51de13b68d823ea784171b1b0dafee67be4";

    #[test]
    fn missing_store_starts_fresh() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = load_or_create_store(&dir.path().join("absent.store")).expect("load");
        assert_eq!(store, Store::new());
    }

    #[test]
    fn combine_persists_between_commands() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("dyad.store");

        cmd_init(&path, false).expect("init");
        cmd_combine(&path, true, "1", "0").expect("combine");
        cmd_combine(&path, true, ORIGIN_PAIR, "0").expect("combine derived");

        let store = load_or_create_store(&path).expect("reload");
        assert_eq!(store.entity_count(), 4);
        assert_eq!(store.relationship_count(), 5);
    }

    #[test]
    fn combine_rejects_unknown_and_malformed_ids() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("dyad.store");

        assert!(matches!(
            cmd_combine(&path, true, ORIGIN_PAIR, "0"),
            Err(DyadError::UnknownEntity(_))
        ));
        assert!(matches!(
            cmd_combine(&path, true, "2", "0"),
            Err(DyadError::InvalidId(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("dyad.store");

        cmd_init(&path, false).expect("init");
        assert!(cmd_init(&path, false).is_err());
        assert!(cmd_init(&path, true).is_ok());
    }

    #[test]
    fn export_then_import_restores_store() {
        let dir = tempfile::tempdir().expect("temp dir");
        let source = dir.path().join("source.store");
        let target = dir.path().join("target.store");
        let exported = dir.path().join("export.dyex");

        cmd_combine(&source, true, "0", "1").expect("combine");
        cmd_export(&source, &exported, "canonical").expect("export");
        cmd_import(&target, &exported).expect("import");

        assert_eq!(
            load_or_create_store(&source).expect("source"),
            load_or_create_store(&target).expect("target")
        );
    }

    #[test]
    fn export_rejects_unknown_format() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = cmd_export(
            &dir.path().join("dyad.store"),
            &dir.path().join("out"),
            "yaml",
        );
        assert!(matches!(result, Err(DyadError::SerializationError(_))));
    }

    #[test]
    fn corrupt_store_file_is_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("dyad.store");
        std::fs::write(&path, b"not a store").expect("write");

        assert!(load_or_create_store(&path).is_err());
    }
}
