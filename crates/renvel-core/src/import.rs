//! Build SQLite stores from directories of CSV files
//!
//! The reverse of `dump`: CSV files named `<prefix>_<table>.csv` are grouped
//! by prefix, and each group becomes one `<prefix>.db` with one table per
//! file. Files without an underscore in the stem carry no table name and are
//! ignored. All columns are created as TEXT; typing is the reader's problem.

use crate::error::{Error, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Options for CSV imports
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Field delimiter of the input files
    pub delimiter: u8,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self { delimiter: b';' }
    }
}

/// One CSV file destined for one table
#[derive(Debug, Clone)]
pub struct CsvMember {
    /// Full path to the file
    pub path: PathBuf,
    /// Table the file becomes (stem after the last underscore)
    pub table: String,
}

/// CSV files sharing a prefix, destined for one database
#[derive(Debug, Clone)]
pub struct CsvGroup {
    /// Group prefix, which names the output database
    pub name: String,
    /// Member files, sorted by path
    pub members: Vec<CsvMember>,
}

/// Result of importing a directory
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    /// Databases that were created
    pub databases_created: Vec<PathBuf>,
    /// Tables created across all databases
    pub tables_created: usize,
    /// Data rows skipped for a field-count mismatch
    pub skipped_rows: usize,
    /// Files that failed (path, error message)
    pub errors: Vec<(PathBuf, String)>,
}

/// Group the `.csv` files directly under `dir` by stem prefix.
///
/// `model_Slabs.csv` and `model_Beams.csv` form group `model`; a stem
/// without an underscore is ignored. Groups and members are sorted so import
/// order is deterministic.
pub fn group_csv_files<P: AsRef<Path>>(dir: P) -> Result<Vec<CsvGroup>> {
    let mut groups: std::collections::BTreeMap<String, Vec<CsvMember>> =
        std::collections::BTreeMap::new();

    for entry in WalkDir::new(dir.as_ref()).min_depth(1).max_depth(1) {
        let entry = entry?;
        let path = entry.path();

        if !entry.file_type().is_file() {
            continue;
        }
        if !path.extension().is_some_and(|ext| ext == "csv") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let Some((prefix, table)) = stem.rsplit_once('_') else {
            continue;
        };

        groups.entry(prefix.to_string()).or_default().push(CsvMember {
            path: path.to_path_buf(),
            table: table.to_string(),
        });
    }

    Ok(groups
        .into_iter()
        .map(|(name, mut members)| {
            members.sort_by(|a, b| a.path.cmp(&b.path));
            CsvGroup { name, members }
        })
        .collect())
}

/// Import every CSV group under `dir` into `<dir>/<prefix>.db` databases.
///
/// A failing member file is recorded and the rest of its group still loads.
pub fn import_directory<P: AsRef<Path>>(dir: P, options: &ImportOptions) -> Result<ImportResult> {
    let dir = dir.as_ref();
    let groups = group_csv_files(dir)?;

    let mut result = ImportResult::default();
    for group in &groups {
        let db_path = dir.join(format!("{}.db", group.name));
        println!("Creating database: {}", db_path.display());
        import_group(group, &db_path, options, &mut result)?;
        result.databases_created.push(db_path);
    }

    Ok(result)
}

fn import_group(
    group: &CsvGroup,
    db_path: &Path,
    options: &ImportOptions,
    result: &mut ImportResult,
) -> Result<()> {
    let out_err = |message: String| Error::OutputWrite {
        path: db_path.to_path_buf(),
        message,
    };

    // Recreate so a re-run replaces the database instead of appending to it
    if db_path.exists() {
        std::fs::remove_file(db_path)
            .map_err(|e| out_err(format!("cannot delete old database: {}", e)))?;
    }

    let mut conn = Connection::open(db_path).map_err(|e| out_err(e.to_string()))?;
    let tx = conn.transaction().map_err(|e| out_err(e.to_string()))?;

    for member in &group.members {
        println!(
            "  - Loading file: {} -> table '{}'",
            member.path.display(),
            member.table
        );
        match load_member(&tx, member, options) {
            Ok(skipped) => {
                result.tables_created += 1;
                result.skipped_rows += skipped;
            }
            Err(e) => result.errors.push((member.path.clone(), e.to_string())),
        }
    }

    tx.commit().map_err(|e| out_err(e.to_string()))?;
    Ok(())
}

/// Load one CSV file into one table, returning the number of skipped rows
fn load_member(
    conn: &Connection,
    member: &CsvMember,
    options: &ImportOptions,
) -> Result<usize> {
    let csv_err = |e: csv::Error| Error::Csv {
        path: member.path.clone(),
        source: e,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .flexible(true)
        .from_path(&member.path)
        .map_err(csv_err)?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.is_empty() {
        return Err(Error::CsvParse {
            path: member.path.clone(),
            message: "file is empty or has no header".to_string(),
        });
    }

    let quoted: Vec<String> = headers
        .iter()
        .map(|h| format!("\"{}\" TEXT", h.replace('"', "\"\"")))
        .collect();
    conn.execute(
        &format!(
            "CREATE TABLE \"{}\" ({})",
            member.table.replace('"', "\"\""),
            quoted.join(", ")
        ),
        [],
    )?;

    let placeholders: Vec<String> = (1..=headers.len()).map(|i| format!("?{}", i)).collect();
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO \"{}\" VALUES ({})",
        member.table.replace('"', "\"\""),
        placeholders.join(", ")
    ))?;

    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        if record.len() != headers.len() {
            eprintln!(
                "    WARNING: row with {} field(s), expected {}; skipped",
                record.len(),
                headers.len()
            );
            skipped += 1;
            continue;
        }
        stmt.execute(rusqlite::params_from_iter(record.iter()))?;
    }

    Ok(skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_grouping_by_prefix() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("model_Slabs.csv"), "a;b\n1;2\n").unwrap();
        fs::write(dir.path().join("model_Beams.csv"), "a;b\n3;4\n").unwrap();
        fs::write(dir.path().join("other_Columns.csv"), "a\n5\n").unwrap();
        // no underscore in the stem, so no table name to derive
        fs::write(dir.path().join("loose.csv"), "a\n6\n").unwrap();
        fs::write(dir.path().join("readme.txt"), "not csv").unwrap();

        let groups = group_csv_files(dir.path()).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "model");
        assert_eq!(groups[0].members.len(), 2);
        assert_eq!(groups[0].members[0].table, "Beams");
        assert_eq!(groups[0].members[1].table, "Slabs");
        assert_eq!(groups[1].name, "other");
    }

    #[test]
    fn test_prefix_splits_at_last_underscore() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ai_abilities_cond.csv"), "a\n1\n").unwrap();

        let groups = group_csv_files(dir.path()).unwrap();
        assert_eq!(groups[0].name, "ai_abilities");
        assert_eq!(groups[0].members[0].table, "cond");
    }

    #[test]
    fn test_import_creates_one_db_per_group() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("model_Slabs.csv"),
            "elemId;Asx\n101;150.5\n102;100\n",
        )
        .unwrap();
        fs::write(dir.path().join("model_Beams.csv"), "elemId;Asx\n101;180\n").unwrap();

        let result = import_directory(dir.path(), &ImportOptions::default()).unwrap();
        assert_eq!(result.databases_created.len(), 1);
        assert_eq!(result.tables_created, 2);
        assert_eq!(result.skipped_rows, 0);
        assert!(result.errors.is_empty());

        let conn = Connection::open(dir.path().join("model.db")).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM Slabs", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 2);

        // everything is loaded as TEXT
        let asx: String = conn
            .query_row("SELECT Asx FROM Beams WHERE elemId = '101'", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(asx, "180");
    }

    #[test]
    fn test_short_rows_are_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("model_Slabs.csv"),
            "elemId;Asx\n101;150.5\n102\n103;90\n",
        )
        .unwrap();

        let result = import_directory(dir.path(), &ImportOptions::default()).unwrap();
        assert_eq!(result.skipped_rows, 1);

        let conn = Connection::open(dir.path().join("model.db")).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM Slabs", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_rerun_replaces_database() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("model_Slabs.csv"), "elemId;Asx\n101;150.5\n").unwrap();

        import_directory(dir.path(), &ImportOptions::default()).unwrap();
        import_directory(dir.path(), &ImportOptions::default()).unwrap();

        let conn = Connection::open(dir.path().join("model.db")).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM Slabs", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_empty_directory_yields_no_groups() {
        let dir = tempdir().unwrap();
        let result = import_directory(dir.path(), &ImportOptions::default()).unwrap();
        assert!(result.databases_created.is_empty());
        assert_eq!(result.tables_created, 0);
    }
}
