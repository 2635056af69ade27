//! renvel-core: Core library for the reinforcement envelope toolkit
//!
//! This library provides functionality to:
//! - Scan directories for SQLite stores holding structural-analysis results
//! - Fold every table into a per-element maximum over reinforcement columns
//! - Write the enveloped result to a delimited CSV and a fresh SQLite table
//! - Dump store tables to CSV and build stores back from CSV directories
//! - Clean DEF export listings and insert text blocks after marker lines

pub mod analyze;
pub mod config;
pub mod defclean;
pub mod dump;
pub mod envelope;
pub mod error;
pub mod import;
pub mod inserter;
pub mod report;
pub mod scanner;
pub mod store;
pub mod summary;
pub mod table;

pub use analyze::run_analysis;
pub use config::AnalyzerConfig;
pub use defclean::clean_def;
pub use dump::{dump_store, dump_table, DumpOptions, DumpResult};
pub use envelope::{
    build_envelope, BestValue, Envelope, EnvelopeRecord, SkipReason, StoreOutcome, StoreReport,
    TableOutcome, TableReport,
};
pub use error::{Error, Result};
pub use import::{group_csv_files, import_directory, CsvGroup, ImportOptions, ImportResult};
pub use inserter::{insert_after_marker, InsertResult};
pub use report::{write_csv, write_db, REPORT_HEADER, RESULT_TABLE_NAME};
pub use scanner::{scan_directory, ScanResult, StoreFile};
pub use store::Store;
pub use summary::RunSummary;
pub use table::{Column, Row, TableData, Value};
