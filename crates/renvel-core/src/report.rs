//! Output sinks for the flattened envelope
//!
//! Two independent writers over the same record list: a `;`-delimited CSV in
//! Windows-1251 (the encoding the downstream spreadsheet tooling expects) and
//! a freshly created SQLite database with one typed table. Sink failures are
//! fatal; there is no partial-write recovery.

use crate::envelope::EnvelopeRecord;
use crate::error::{Error, Result};
use encoding_rs::WINDOWS_1251;
use rusqlite::Connection;
use std::fs;
use std::path::Path;

/// Fixed output header, shared by both sinks
pub const REPORT_HEADER: [&str; 6] = [
    "Element_ID",
    "Reinforcement_Type",
    "Max_Value",
    "Source_DB",
    "Source_Table",
    "Source_SetN",
];

/// Name of the table created in the relational sink
pub const RESULT_TABLE_NAME: &str = "EnvelopedReinforcement";

/// Write records to a `;`-delimited CSV file encoded as Windows-1251.
///
/// The rows are rendered into memory first and encoded in one pass, so the
/// target file is either written whole or not at all; any failure is
/// surfaced, never swallowed.
pub fn write_csv<P: AsRef<Path>>(records: &[EnvelopeRecord], path: P) -> Result<()> {
    let path = path.as_ref();
    let csv_err = |e: csv::Error| Error::Csv {
        path: path.to_path_buf(),
        source: e,
    };
    let out_err = |message: String| Error::OutputWrite {
        path: path.to_path_buf(),
        message,
    };

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(REPORT_HEADER).map_err(csv_err)?;
    for record in records {
        writer
            .write_record(&[
                record.element_id.to_string(),
                record.column.clone(),
                record.value.to_string(),
                record.source_store.clone(),
                record.source_table.clone(),
                record.set_index.to_string(),
            ])
            .map_err(csv_err)?;
    }

    let buffer = writer
        .into_inner()
        .map_err(|e| out_err(e.to_string()))?;
    let text = String::from_utf8(buffer).map_err(|e| out_err(e.to_string()))?;

    let (encoded, _, _) = WINDOWS_1251.encode(&text);
    fs::write(path, &encoded).map_err(|e| out_err(e.to_string()))?;

    Ok(())
}

/// Write records to a freshly created SQLite database.
///
/// A pre-existing target is deleted first; create, table definition, and the
/// bulk insert (one transaction, record order preserved) are all fatal on
/// failure.
pub fn write_db<P: AsRef<Path>>(records: &[EnvelopeRecord], path: P) -> Result<()> {
    let path = path.as_ref();
    let out_err = |message: String| Error::OutputWrite {
        path: path.to_path_buf(),
        message,
    };

    if path.exists() {
        fs::remove_file(path).map_err(|e| out_err(format!("cannot delete old output: {}", e)))?;
    }

    let mut conn = Connection::open(path).map_err(|e| out_err(e.to_string()))?;

    conn.execute(
        &format!(
            "CREATE TABLE {} (
                Element_ID          INTEGER,
                Reinforcement_Type  TEXT,
                Max_Value           REAL,
                Source_DB           TEXT,
                Source_Table        TEXT,
                Source_SetN         INTEGER
            )",
            RESULT_TABLE_NAME
        ),
        [],
    )
    .map_err(|e| out_err(e.to_string()))?;

    let tx = conn.transaction().map_err(|e| out_err(e.to_string()))?;
    {
        let mut stmt = tx
            .prepare(&format!(
                "INSERT INTO {} VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                RESULT_TABLE_NAME
            ))
            .map_err(|e| out_err(e.to_string()))?;

        for record in records {
            stmt.execute(rusqlite::params![
                record.element_id,
                record.column,
                record.value,
                record.source_store,
                record.source_table,
                record.set_index,
            ])
            .map_err(|e| out_err(e.to_string()))?;
        }
    }
    tx.commit().map_err(|e| out_err(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_records() -> Vec<EnvelopeRecord> {
        vec![
            EnvelopeRecord {
                element_id: 101,
                column: "Asx".to_string(),
                value: 180.0,
                source_store: "test1.db".to_string(),
                source_table: "Beams".to_string(),
                set_index: 8,
            },
            EnvelopeRecord {
                element_id: 101,
                column: "Asy".to_string(),
                value: 200.0,
                source_store: "test1.db".to_string(),
                source_table: "Slabs".to_string(),
                set_index: 5,
            },
        ]
    }

    #[test]
    fn test_write_csv_header_and_delimiter() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        write_csv(&sample_records(), &path).unwrap();

        let bytes = fs::read(&path).unwrap();
        let text = String::from_utf8(bytes).unwrap(); // ASCII-only fixture
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Element_ID;Reinforcement_Type;Max_Value;Source_DB;Source_Table;Source_SetN"
        );
        assert_eq!(lines.next().unwrap(), "101;Asx;180;test1.db;Beams;8");
        assert_eq!(lines.next().unwrap(), "101;Asy;200;test1.db;Slabs;5");
    }

    #[test]
    fn test_write_csv_uses_windows_1251() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut records = sample_records();
        records[0].source_table = "Плиты".to_string();

        write_csv(&records, &path).unwrap();

        let bytes = fs::read(&path).unwrap();
        // cp1251 is one byte per Cyrillic char; UTF-8 would need two
        assert!(String::from_utf8(bytes.clone()).is_err());
        let (decoded, _, had_errors) = WINDOWS_1251.decode(&bytes);
        assert!(!had_errors);
        assert!(decoded.contains("Плиты"));
    }

    #[test]
    fn test_write_csv_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        write_csv(&sample_records(), &path).unwrap();
        let first = fs::read(&path).unwrap();
        write_csv(&sample_records(), &path).unwrap();
        let second = fs::read(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_write_db_creates_typed_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.db");

        write_db(&sample_records(), &path).unwrap();

        let conn = Connection::open(&path).unwrap();
        let count: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {}", RESULT_TABLE_NAME),
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);

        let (id, col, value, set_n): (i64, String, f64, i64) = conn
            .query_row(
                &format!(
                    "SELECT Element_ID, Reinforcement_Type, Max_Value, Source_SetN FROM {} LIMIT 1",
                    RESULT_TABLE_NAME
                ),
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .unwrap();
        assert_eq!(id, 101);
        assert_eq!(col, "Asx");
        assert_eq!(value, 180.0);
        assert_eq!(set_n, 8);
    }

    #[test]
    fn test_write_db_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.db");

        write_db(&sample_records(), &path).unwrap();
        // second run must recreate, not append
        write_db(&sample_records(), &path).unwrap();

        let conn = Connection::open(&path).unwrap();
        let count: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {}", RESULT_TABLE_NAME),
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_write_empty_records() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("out.csv");
        let db_path = dir.path().join("out.db");

        write_csv(&[], &csv_path).unwrap();
        write_db(&[], &db_path).unwrap();

        let text = fs::read_to_string(&csv_path).unwrap();
        assert_eq!(text.lines().count(), 1); // header only
    }
}
