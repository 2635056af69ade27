//! Directory scanner for discovering store files

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A discovered store file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File name only, used for provenance and ordering
    pub name: String,
}

/// Result of scanning a directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Root directory that was scanned
    pub root: PathBuf,
    /// Discovered stores, sorted by file name
    pub stores: Vec<StoreFile>,
}

impl ScanResult {
    /// Number of stores found
    pub fn store_count(&self) -> usize {
        self.stores.len()
    }

    /// Find a store by file name
    pub fn find_store(&self, name: &str) -> Option<&StoreFile> {
        self.stores.iter().find(|s| s.name == name)
    }
}

/// Scan a directory for store files (`.db`), non-recursively.
///
/// Directory listing order is not guaranteed by the OS, so stores are sorted
/// by file name to make scan order (and therefore tie-breaking) deterministic.
/// Names listed in `exclude` are skipped so a run never consumes its own
/// output database.
pub fn scan_directory<P: AsRef<Path>>(root: P, exclude: &[&str]) -> Result<ScanResult> {
    let root = root.as_ref();
    let mut stores: Vec<StoreFile> = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry?;
        let path = entry.path();

        if !entry.file_type().is_file() {
            continue;
        }
        if !path.extension().is_some_and(|ext| ext == "db") {
            continue;
        }

        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if exclude.contains(&name) {
                continue;
            }
            stores.push(StoreFile {
                path: path.to_path_buf(),
                name: name.to_string(),
            });
        }
    }

    stores.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(ScanResult {
        root: root.to_path_buf(),
        stores,
    })
}
