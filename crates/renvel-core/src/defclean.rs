//! Clean `dumpbin /exports` listings into linker-ready DEF files
//!
//! A raw listing wraps the export names in a table between an
//! `ordinal hint RVA` header and a `Summary` footer; the export name is the
//! last token of each data line.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Marker line that opens the export table in a dumpbin listing
const TABLE_HEADER: &str = "ordinal hint RVA";
/// Marker line that closes the export table
const TABLE_FOOTER: &str = "Summary";

/// Extract export names from dumpbin listing text
pub fn extract_export_names(listing: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut in_table = false;

    for line in listing.lines() {
        if line.contains(TABLE_HEADER) {
            in_table = true;
            continue;
        }
        if line.contains(TABLE_FOOTER) {
            break;
        }
        if !in_table || line.trim().is_empty() {
            continue;
        }

        if let Some(token) = line.split_whitespace().last() {
            if is_identifier(token) {
                names.push(token.to_string());
            }
        }
    }

    names
}

/// Read a raw DEF listing and write a clean `EXPORTS` file.
///
/// Returns the number of export names written; zero names is an error.
pub fn clean_def<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<usize> {
    let input = input.as_ref();
    let listing = fs::read_to_string(input).map_err(|e| Error::FileRead {
        path: input.to_path_buf(),
        source: e,
    })?;

    let names = extract_export_names(&listing);
    if names.is_empty() {
        return Err(Error::NoExportsFound(input.to_path_buf()));
    }

    let mut content = String::from("EXPORTS\n");
    for name in &names {
        content.push_str(name);
        content.push('\n');
    }
    fs::write(output, content)?;

    Ok(names.len())
}

/// C-identifier check, the same filter the original cleaner applied
fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
