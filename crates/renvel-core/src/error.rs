//! Error types for renvel-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in renvel-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to open a store database
    #[error("failed to open store '{path}': {source}")]
    StoreOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Failed to read a table from a store
    #[error("failed to read table '{table}' in '{store}': {source}")]
    TableRead {
        store: PathBuf,
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A named table does not exist in the store
    #[error("table '{table}' not found in '{store}'")]
    TableNotFound { store: PathBuf, table: String },

    /// No store files found in the input directory
    #[error("no store files (*.db) found in '{0}'")]
    NoStoresFound(PathBuf),

    /// The scan finished without accumulating a single record
    #[error("no records produced; check that input tables carry the required columns")]
    NoRecords,

    /// Failed to write an output sink
    #[error("failed to write output '{path}': {message}")]
    OutputWrite { path: PathBuf, message: String },

    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No export names could be extracted from a DEF listing
    #[error("no export names found in '{0}'")]
    NoExportsFound(PathBuf),

    /// A CSV file that cannot be loaded as a table
    #[error("failed to parse CSV '{path}': {message}")]
    CsvParse { path: PathBuf, message: String },

    /// CSV writer error
    #[error("CSV error for '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// SQLite error without a more specific context
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
