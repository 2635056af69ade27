//! Envelope aggregation: per-element maxima over reinforcement columns
//!
//! Folds every row of every valid table into a running maximum keyed by
//! `(element id, column name)`, keeping provenance for the winning row.
//! Memory stays bounded by the key-space cardinality, not by row count.

use crate::config::AnalyzerConfig;
use crate::error::Result;
use crate::scanner::StoreFile;
use crate::store::Store;
use crate::table::TableData;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The maximum observed for one (element id, reinforcement column) pair,
/// plus where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestValue {
    /// The maximum value seen so far
    pub value: f64,
    /// File name of the store the winning row came from
    pub source_store: String,
    /// Table the winning row came from
    pub source_table: String,
    /// Set number of the winning row
    pub set_index: i64,
}

/// Why a table contributed nothing to the envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkipReason {
    /// A required column is absent
    MissingColumn(String),
    /// No column carries the reinforcement prefix
    NoReinforcementColumns,
    /// The table could not be read
    ReadFailed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingColumn(name) => write!(f, "missing column '{}'", name),
            SkipReason::NoReinforcementColumns => write!(f, "no reinforcement columns"),
            SkipReason::ReadFailed(msg) => write!(f, "read failed: {}", msg),
        }
    }
}

/// Outcome of visiting one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableOutcome {
    /// Rows were folded into the envelope
    Aggregated {
        /// Rows visited
        rows: usize,
        /// Cells that could not be coerced to a number and were skipped
        skipped_values: usize,
    },
    /// The table contributed nothing
    Skipped(SkipReason),
}

/// Per-table report for one store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    /// Table name
    pub name: String,
    /// What happened
    pub outcome: TableOutcome,
}

/// Outcome of visiting one store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StoreOutcome {
    /// The store was opened and its tables visited
    Scanned(Vec<TableReport>),
    /// The store could not be opened and was skipped whole
    OpenFailed(String),
}

/// Per-store report for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreReport {
    /// Store file name
    pub name: String,
    /// What happened
    pub outcome: StoreOutcome,
}

/// One flattened output record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeRecord {
    pub element_id: i64,
    pub column: String,
    pub value: f64,
    pub source_store: String,
    pub source_table: String,
    pub set_index: i64,
}

/// The accumulated envelope plus per-store reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// element id -> column name -> best value. BTreeMaps so flattening
    /// iterates in the contractual (id, column) order with no extra sort.
    best: BTreeMap<i64, BTreeMap<String, BestValue>>,
    /// What happened per store, in scan order
    pub stores: Vec<StoreReport>,
}

impl Envelope {
    /// Number of distinct element ids accumulated
    pub fn element_count(&self) -> usize {
        self.best.len()
    }

    /// True when nothing was accumulated
    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    /// Look up the best value for one (element, column) pair
    pub fn get(&self, element_id: i64, column: &str) -> Option<&BestValue> {
        self.best.get(&element_id).and_then(|cols| cols.get(column))
    }

    /// Report for a store by file name
    pub fn store_report(&self, name: &str) -> Option<&StoreReport> {
        self.stores.iter().find(|s| s.name == name)
    }

    /// Flatten into output records, ordered by element id then column name
    pub fn flatten(&self) -> Vec<EnvelopeRecord> {
        let mut records = Vec::new();
        for (element_id, columns) in &self.best {
            for (column, best) in columns {
                records.push(EnvelopeRecord {
                    element_id: *element_id,
                    column: column.clone(),
                    value: best.value,
                    source_store: best.source_store.clone(),
                    source_table: best.source_table.clone(),
                    set_index: best.set_index,
                });
            }
        }
        records
    }
}

/// Build the envelope over a list of scanned stores.
///
/// Per-store and per-table failures are isolated: an unopenable store skips
/// only that store, a bad table skips only that table. Nothing here is fatal;
/// "no stores" and "no records" are for the caller to judge.
pub fn build_envelope(stores: &[StoreFile], config: &AnalyzerConfig) -> Result<Envelope> {
    let mut best: BTreeMap<i64, BTreeMap<String, BestValue>> = BTreeMap::new();
    let mut reports = Vec::new();

    for store_file in stores {
        println!("Processing store: {}", store_file.name);

        let store = match Store::open(&store_file.path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("  WARNING: skipping store: {}", e);
                reports.push(StoreReport {
                    name: store_file.name.clone(),
                    outcome: StoreOutcome::OpenFailed(e.to_string()),
                });
                continue;
            }
        };

        let table_names = match store.table_names() {
            Ok(names) => names,
            Err(e) => {
                eprintln!("  WARNING: cannot list tables: {}", e);
                reports.push(StoreReport {
                    name: store_file.name.clone(),
                    outcome: StoreOutcome::OpenFailed(e.to_string()),
                });
                continue;
            }
        };

        let mut table_reports = Vec::new();
        for table_name in table_names {
            println!("  - Reading table: '{}'", table_name);

            let outcome = match store.read_table(&table_name) {
                Ok(table) => fold_table(&table, &store_file.name, config, &mut best),
                Err(e) => {
                    eprintln!("    WARNING: skipping table: {}", e);
                    TableOutcome::Skipped(SkipReason::ReadFailed(e.to_string()))
                }
            };

            if let TableOutcome::Skipped(reason) = &outcome {
                eprintln!("    WARNING: table '{}' skipped: {}", table_name, reason);
            }

            table_reports.push(TableReport {
                name: table_name,
                outcome,
            });
        }

        reports.push(StoreReport {
            name: store_file.name.clone(),
            outcome: StoreOutcome::Scanned(table_reports),
        });
        // store connection drops here, before the next one opens
    }

    Ok(Envelope {
        best,
        stores: reports,
    })
}

/// Fold one table into the accumulator
fn fold_table(
    table: &TableData,
    store_name: &str,
    config: &AnalyzerConfig,
    best: &mut BTreeMap<i64, BTreeMap<String, BestValue>>,
) -> TableOutcome {
    let elem_col = match table.find_column(&config.element_id_column) {
        Some(c) => c.index,
        None => {
            return TableOutcome::Skipped(SkipReason::MissingColumn(
                config.element_id_column.clone(),
            ))
        }
    };
    let set_col = match table.find_column(&config.set_index_column) {
        Some(c) => c.index,
        None => {
            return TableOutcome::Skipped(SkipReason::MissingColumn(
                config.set_index_column.clone(),
            ))
        }
    };

    let reinf_cols: Vec<(String, usize)> = table
        .columns_with_prefix(&config.reinforcement_prefix)
        .into_iter()
        .map(|c| (c.name.clone(), c.index))
        .collect();
    if reinf_cols.is_empty() {
        return TableOutcome::Skipped(SkipReason::NoReinforcementColumns);
    }

    let mut skipped_values = 0usize;

    for row in &table.rows {
        let Some(element_id) = row.get(elem_col).and_then(|v| v.as_i64()) else {
            eprintln!(
                "    WARNING: non-numeric element id in '{}', row skipped",
                table.name
            );
            skipped_values += 1;
            continue;
        };
        let Some(set_index) = row.get(set_col).and_then(|v| v.as_i64()) else {
            eprintln!(
                "    WARNING: non-numeric set index in '{}', row skipped",
                table.name
            );
            skipped_values += 1;
            continue;
        };

        let entry = best.entry(element_id).or_default();

        for (col_name, col_idx) in &reinf_cols {
            let Some(value) = row.get(*col_idx).and_then(|v| v.as_f64()) else {
                eprintln!(
                    "    WARNING: non-numeric value in '{}.{}' for element {}, skipped",
                    table.name, col_name, element_id
                );
                skipped_values += 1;
                continue;
            };

            // Strict '>' so exact ties keep the first-seen provenance
            let replace = match entry.get(col_name) {
                Some(current) => value > current.value,
                None => true,
            };
            if replace {
                entry.insert(
                    col_name.clone(),
                    BestValue {
                        value,
                        source_store: store_name.to_string(),
                        source_table: table.name.clone(),
                        set_index,
                    },
                );
            }
        }

        // Drop the element again if every candidate cell in the row was skipped
        if entry.is_empty() {
            best.remove(&element_id);
        }
    }

    TableOutcome::Aggregated {
        rows: table.rows.len(),
        skipped_values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan_directory;
    use rusqlite::Connection;
    use std::path::Path;
    use tempfile::tempdir;

    fn make_test1(path: &Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE Slabs (elemId INTEGER, setN INTEGER, Asx REAL, Asy REAL);
             INSERT INTO Slabs VALUES (101, 5, 150.5, 200.0);
             INSERT INTO Slabs VALUES (102, 6, 100.0, 300.0);
             CREATE TABLE Beams (elemId INTEGER, setN INTEGER, Asx REAL, Asy REAL);
             INSERT INTO Beams VALUES (101, 8, 180.0, 190.0);",
        )
        .unwrap();
    }

    fn make_test2(path: &Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE Columns (elemId INTEGER, setN INTEGER, Asx REAL, Asy REAL);
             INSERT INTO Columns VALUES (102, 10, 90.0, 350.5);
             INSERT INTO Columns VALUES (103, 1, 50.0, 50.0);
             CREATE TABLE InvalidTable (elemId INTEGER, Asx REAL);
             INSERT INTO InvalidTable VALUES (999, 1000.0);",
        )
        .unwrap();
    }

    fn build_fixture_envelope(dir: &Path) -> Envelope {
        let scan = scan_directory(dir, &[]).unwrap();
        build_envelope(&scan.stores, &AnalyzerConfig::default()).unwrap()
    }

    #[test]
    fn test_two_store_scenario() {
        let dir = tempdir().unwrap();
        make_test1(&dir.path().join("test1.db"));
        make_test2(&dir.path().join("test2.db"));

        let envelope = build_fixture_envelope(dir.path());

        assert_eq!(envelope.element_count(), 3);

        let asx101 = envelope.get(101, "Asx").unwrap();
        assert_eq!(asx101.value, 180.0);
        assert_eq!(asx101.source_store, "test1.db");
        assert_eq!(asx101.source_table, "Beams");
        assert_eq!(asx101.set_index, 8);

        let asy101 = envelope.get(101, "Asy").unwrap();
        assert_eq!(asy101.value, 200.0);
        assert_eq!(asy101.source_table, "Slabs");
        assert_eq!(asy101.set_index, 5);

        assert_eq!(envelope.get(102, "Asx").unwrap().value, 100.0);
        let asy102 = envelope.get(102, "Asy").unwrap();
        assert_eq!(asy102.value, 350.5);
        assert_eq!(asy102.source_store, "test2.db");
        assert_eq!(asy102.source_table, "Columns");
        assert_eq!(asy102.set_index, 10);

        assert_eq!(envelope.get(103, "Asx").unwrap().value, 50.0);
        assert_eq!(envelope.get(103, "Asy").unwrap().value, 50.0);

        // element 999 lives only in the invalid table
        assert!(envelope.get(999, "Asx").is_none());
    }

    #[test]
    fn test_invalid_table_skip_reason_is_recorded() {
        let dir = tempdir().unwrap();
        make_test2(&dir.path().join("test2.db"));

        let envelope = build_fixture_envelope(dir.path());

        let report = envelope.store_report("test2.db").unwrap();
        let StoreOutcome::Scanned(tables) = &report.outcome else {
            panic!("store should have been scanned");
        };
        let invalid = tables.iter().find(|t| t.name == "InvalidTable").unwrap();
        assert_eq!(
            invalid.outcome,
            TableOutcome::Skipped(SkipReason::MissingColumn("setN".to_string()))
        );
    }

    #[test]
    fn test_no_reinforcement_columns_skips_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE Meta (elemId INTEGER, setN INTEGER, note TEXT);
             INSERT INTO Meta VALUES (1, 1, 'x');",
        )
        .unwrap();
        drop(conn);

        let envelope = build_fixture_envelope(dir.path());
        assert!(envelope.is_empty());

        let report = envelope.store_report("plain.db").unwrap();
        let StoreOutcome::Scanned(tables) = &report.outcome else {
            panic!("store should have been scanned");
        };
        assert_eq!(
            tables[0].outcome,
            TableOutcome::Skipped(SkipReason::NoReinforcementColumns)
        );
    }

    #[test]
    fn test_unreadable_store_is_isolated() {
        let dir = tempdir().unwrap();
        // not a SQLite file at all
        std::fs::write(dir.path().join("broken.db"), b"this is not a database").unwrap();
        make_test1(&dir.path().join("test1.db"));

        let envelope = build_fixture_envelope(dir.path());

        // the good store still contributed
        assert_eq!(envelope.element_count(), 2);
        let broken = envelope.store_report("broken.db").unwrap();
        assert!(matches!(broken.outcome, StoreOutcome::OpenFailed(_)));
    }

    #[test]
    fn test_tie_keeps_first_seen_provenance() {
        let dir = tempdir().unwrap();
        let conn = Connection::open(dir.path().join("a.db")).unwrap();
        conn.execute_batch(
            "CREATE TABLE First (elemId INTEGER, setN INTEGER, Asx REAL);
             INSERT INTO First VALUES (1, 2, 99.0);",
        )
        .unwrap();
        drop(conn);
        let conn = Connection::open(dir.path().join("b.db")).unwrap();
        conn.execute_batch(
            "CREATE TABLE Second (elemId INTEGER, setN INTEGER, Asx REAL);
             INSERT INTO Second VALUES (1, 7, 99.0);",
        )
        .unwrap();
        drop(conn);

        let envelope = build_fixture_envelope(dir.path());

        // a.db scans before b.db (sorted), so its provenance survives the tie
        let best = envelope.get(1, "Asx").unwrap();
        assert_eq!(best.value, 99.0);
        assert_eq!(best.source_store, "a.db");
        assert_eq!(best.source_table, "First");
        assert_eq!(best.set_index, 2);
    }

    #[test]
    fn test_non_numeric_values_are_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        let conn = Connection::open(dir.path().join("mixed.db")).unwrap();
        conn.execute_batch(
            "CREATE TABLE T (elemId INTEGER, setN INTEGER, Asx);
             INSERT INTO T VALUES (1, 1, 'not-a-number');
             INSERT INTO T VALUES (1, 2, 5.0);
             INSERT INTO T VALUES (2, 3, NULL);",
        )
        .unwrap();
        drop(conn);

        let envelope = build_fixture_envelope(dir.path());

        assert_eq!(envelope.get(1, "Asx").unwrap().value, 5.0);
        // element 2 only had a NULL, so it must not appear
        assert!(envelope.get(2, "Asx").is_none());

        let report = envelope.store_report("mixed.db").unwrap();
        let StoreOutcome::Scanned(tables) = &report.outcome else {
            panic!("store should have been scanned");
        };
        assert_eq!(
            tables[0].outcome,
            TableOutcome::Aggregated {
                rows: 3,
                skipped_values: 2
            }
        );
    }

    #[test]
    fn test_flatten_is_sorted() {
        let dir = tempdir().unwrap();
        make_test1(&dir.path().join("test1.db"));
        make_test2(&dir.path().join("test2.db"));

        let envelope = build_fixture_envelope(dir.path());
        let records = envelope.flatten();

        assert_eq!(records.len(), 6);
        let keys: Vec<(i64, &str)> = records
            .iter()
            .map(|r| (r.element_id, r.column.as_str()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys[0], (101, "Asx"));
        assert_eq!(keys[5], (103, "Asy"));
    }

    #[test]
    fn test_empty_store_list_yields_empty_envelope() {
        let envelope = build_envelope(&[], &AnalyzerConfig::default()).unwrap();
        assert!(envelope.is_empty());
        assert!(envelope.flatten().is_empty());
    }
}
