//! Dump store tables to CSV files

use crate::error::{Error, Result};
use crate::store::Store;
use crate::table::{TableData, Value};
use std::path::{Path, PathBuf};

/// Options for CSV dumps
#[derive(Debug, Clone)]
pub struct DumpOptions {
    /// Field delimiter
    pub delimiter: u8,
    /// Collapse embedded line breaks in text values to spaces
    pub sanitize: bool,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            sanitize: false,
        }
    }
}

/// Result of dumping a whole store
#[derive(Debug, Clone)]
pub struct DumpResult {
    /// CSV files that were written
    pub files_written: Vec<PathBuf>,
    /// Tables that failed (table name, error message)
    pub errors: Vec<(String, String)>,
}

/// Dump every table of a store into `<out_dir>/<table>.csv`.
///
/// A failing table is recorded and the rest still get written.
pub fn dump_store<P: AsRef<Path>, Q: AsRef<Path>>(
    store_path: P,
    out_dir: Q,
    options: &DumpOptions,
) -> Result<DumpResult> {
    let out_dir = out_dir.as_ref();
    std::fs::create_dir_all(out_dir)?;

    let store = Store::open(store_path)?;
    let mut result = DumpResult {
        files_written: Vec::new(),
        errors: Vec::new(),
    };

    for table_name in store.table_names()? {
        let out_path = out_dir.join(format!("{}.csv", table_name));
        match store
            .read_table(&table_name)
            .and_then(|t| write_table_csv(&t, &out_path, options))
        {
            Ok(_) => result.files_written.push(out_path),
            Err(e) => result.errors.push((table_name, e.to_string())),
        }
    }

    Ok(result)
}

/// Dump one named table of a store to a single CSV file, returning the row count
pub fn dump_table<P: AsRef<Path>, Q: AsRef<Path>>(
    store_path: P,
    table: &str,
    out_path: Q,
    options: &DumpOptions,
) -> Result<usize> {
    let store = Store::open(&store_path)?;
    if !store.has_table(table)? {
        return Err(Error::TableNotFound {
            store: store_path.as_ref().to_path_buf(),
            table: table.to_string(),
        });
    }

    let data = store.read_table(table)?;
    write_table_csv(&data, out_path.as_ref(), options)?;
    Ok(data.row_count())
}

fn write_table_csv(table: &TableData, path: &Path, options: &DumpOptions) -> Result<()> {
    let csv_err = |e: csv::Error| Error::Csv {
        path: path.to_path_buf(),
        source: e,
    };

    let mut writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_path(path)
        .map_err(csv_err)?;

    let header: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    writer.write_record(&header).map_err(csv_err)?;

    for row in &table.rows {
        let fields: Vec<String> = row.cells.iter().map(|v| render(v, options)).collect();
        writer.write_record(&fields).map_err(csv_err)?;
    }

    writer.flush().map_err(|e| Error::OutputWrite {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(())
}

fn render(value: &Value, options: &DumpOptions) -> String {
    let s = value.to_string_value();
    if options.sanitize && (s.contains('\n') || s.contains('\r')) {
        s.replace(['\r', '\n'], " ")
    } else {
        s
    }
}
