//! Read access to a single store (one SQLite database file)

use crate::error::{Error, Result};
use crate::table::{Column, Row, TableData, Value};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

/// An open store. The connection is exclusively owned and closed on drop,
/// before the caller moves on to the next store.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
    path: PathBuf,
}

impl Store {
    /// Open a store read-only
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| Error::StoreOpen {
                path: path.clone(),
                source: e,
            })?;
        Ok(Self { conn, path })
    }

    /// Path this store was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name of the store, for provenance fields
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// List table names from the store catalog, in enumeration order
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Check whether a table exists in the store
    pub fn has_table(&self, name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = ?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Read a whole table into memory
    pub fn read_table(&self, name: &str) -> Result<TableData> {
        let ctx = |e: rusqlite::Error| Error::TableRead {
            store: self.path.clone(),
            table: name.to_string(),
            source: e,
        };

        // Table names come from the catalog, not SQL text; quote defensively anyway
        let sql = format!("SELECT * FROM \"{}\"", name.replace('"', "\"\""));
        let mut stmt = self.conn.prepare(&sql).map_err(ctx)?;

        let columns: Vec<Column> = stmt
            .column_names()
            .into_iter()
            .enumerate()
            .map(|(i, n)| Column::new(n.to_string(), i))
            .collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut raw_rows = stmt.query([]).map_err(ctx)?;
        while let Some(raw) = raw_rows.next().map_err(ctx)? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                let v: rusqlite::types::Value = raw.get(i).map_err(ctx)?;
                cells.push(Value::from(v));
            }
            rows.push(Row::new(cells));
        }

        Ok(TableData {
            name: name.to_string(),
            columns,
            rows,
            source_path: self.path.clone(),
        })
    }
}
