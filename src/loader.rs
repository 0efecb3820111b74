//! Forest Loading
//!
//! Reads a schema forest dumped as JSON by the parser stage. The input is
//! either a single `.json` file (one schema object or an array of them) or a
//! directory walked in sorted path order, one document per `.json` file.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::LoaderSettings;
use crate::error::{ResolveError, Result};
use crate::schema::{Forest, Schema};

/// A forest plus the hash of the content it was read from
#[derive(Debug, Clone)]
pub struct LoadedForest {
    pub forest: Forest,
    /// SHA-256 over every file read, in load order
    pub bundle_hash: String,
}

/// Load a forest from a file or directory
pub fn load_from_path(path: &Path, settings: &LoaderSettings) -> Result<LoadedForest> {
    if path.is_dir() {
        load_from_directory(path, settings)
    } else {
        load_from_file(path)
    }
}

/// Load a single JSON file
pub fn load_from_file(path: &Path) -> Result<LoadedForest> {
    let content = fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());

    let schemas = parse_document(&content)
        .map_err(|e| ResolveError::InvalidFormat(format!("{}: {}", path.display(), e)))?;

    Ok(LoadedForest {
        forest: Forest::new(schemas),
        bundle_hash: format!("{:x}", hasher.finalize()),
    })
}

/// Load every `.json` file under a directory
pub fn load_from_directory(schema_dir: &Path, settings: &LoaderSettings) -> Result<LoadedForest> {
    let mut hasher = Sha256::new();
    let mut schemas = Vec::new();

    for entry in WalkDir::new(schema_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().map(|e| e != "json").unwrap_or(true) {
            continue;
        }

        let relative_path = path.strip_prefix(schema_dir).unwrap_or(path);
        let relative_str = relative_path.to_string_lossy();

        if !settings.include_prefixes.is_empty()
            && !settings.include_prefixes.iter().any(|p| relative_str.starts_with(p))
        {
            continue;
        }
        if settings.skip_prefixes.iter().any(|p| relative_str.starts_with(p)) {
            continue;
        }

        let content = fs::read_to_string(path)?;
        hasher.update(content.as_bytes());

        let parsed = parse_document(&content)
            .map_err(|e| ResolveError::InvalidFormat(format!("{}: {}", path.display(), e)))?;
        debug!(path = %relative_str, schemas = parsed.len(), "loaded schema document");
        schemas.extend(parsed);
    }

    Ok(LoadedForest {
        forest: Forest::new(schemas),
        bundle_hash: format!("{:x}", hasher.finalize()),
    })
}

fn parse_document(content: &str) -> serde_json::Result<Vec<Schema>> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    if value.is_array() {
        serde_json::from_value(value)
    } else {
        serde_json::from_value(value).map(|schema: Schema| vec![schema])
    }
}
