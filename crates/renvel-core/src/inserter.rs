//! Insert a text block into every file of a directory after the last
//! occurrence of a marker line
//!
//! Files are decoded as UTF-8 with a Windows-1251 fallback and written back
//! in whichever encoding they were read with.

use crate::error::{Error, Result};
use encoding_rs::WINDOWS_1251;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Encoding a file was decoded with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEncoding {
    Utf8,
    Windows1251,
}

/// Result of processing one directory
#[derive(Debug, Clone, Default)]
pub struct InsertResult {
    /// Files that received the block
    pub modified: Vec<PathBuf>,
    /// Files without the marker, left untouched
    pub skipped: Vec<PathBuf>,
    /// Files that failed (path, error message)
    pub errors: Vec<(PathBuf, String)>,
}

/// Insert `block` after the last line containing `marker` in every regular
/// file directly under `dir`.
///
/// A failing file is recorded and the rest are still processed.
pub fn insert_after_marker<P: AsRef<Path>>(
    dir: P,
    marker: &str,
    block: &str,
) -> Result<InsertResult> {
    let mut result = InsertResult::default();

    for entry in WalkDir::new(dir.as_ref()).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path().to_path_buf();

        match insert_into_file(&path, marker, block) {
            Ok(true) => result.modified.push(path),
            Ok(false) => result.skipped.push(path),
            Err(e) => result.errors.push((path, e.to_string())),
        }
    }

    Ok(result)
}

/// Insert the block into one file; `Ok(false)` means the marker was absent
pub fn insert_into_file(path: &Path, marker: &str, block: &str) -> Result<bool> {
    let bytes = fs::read(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let (text, encoding) = decode(&bytes);

    let Some(updated) = insert_after_last_marker(&text, marker, block) else {
        return Ok(false);
    };

    fs::write(path, encode(&updated, encoding))?;
    Ok(true)
}

/// Pure insertion over text; `None` when the marker does not occur
fn insert_after_last_marker(text: &str, marker: &str, block: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    // Containment, not equality: a marker embedded mid-line still counts
    let last = lines.iter().rposition(|line| line.contains(marker))?;

    let mut out: Vec<&str> = Vec::with_capacity(lines.len() + 1);
    out.extend(&lines[..=last]);
    out.push(block.trim_end_matches('\n'));
    out.extend(&lines[last + 1..]);

    let mut joined = out.join("\n");
    if text.ends_with('\n') {
        joined.push('\n');
    }
    Some(joined)
}

fn decode(bytes: &[u8]) -> (String, FileEncoding) {
    match std::str::from_utf8(bytes) {
        Ok(s) => (s.to_string(), FileEncoding::Utf8),
        Err(_) => {
            let (decoded, _, _) = WINDOWS_1251.decode(bytes);
            (decoded.into_owned(), FileEncoding::Windows1251)
        }
    }
}

fn encode(text: &str, encoding: FileEncoding) -> Vec<u8> {
    match encoding {
        FileEncoding::Utf8 => text.as_bytes().to_vec(),
        FileEncoding::Windows1251 => WINDOWS_1251.encode(text).0.into_owned(),
    }
}
