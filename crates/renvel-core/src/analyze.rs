//! The full analysis pipeline: scan, aggregate, flatten, write both sinks

use crate::config::AnalyzerConfig;
use crate::envelope::build_envelope;
use crate::error::{Error, Result};
use crate::report::{write_csv, write_db};
use crate::scanner::scan_directory;
use crate::summary::RunSummary;
use chrono::Utc;
use std::path::Path;

/// Run one envelope analysis over `root`, writing both output files into it.
///
/// Fails only when no input stores are found, when nothing was accumulated,
/// or when an output sink cannot be written. Everything else is skipped and
/// recorded in the returned summary.
pub fn run_analysis<P: AsRef<Path>>(root: P, config: &AnalyzerConfig) -> Result<RunSummary> {
    let root = root.as_ref();
    let started_at = Utc::now();

    let scan = scan_directory(root, &config.excluded_store_names())?;
    if scan.stores.is_empty() {
        return Err(Error::NoStoresFound(root.to_path_buf()));
    }
    println!("OK: Found {} store file(s) to process.", scan.store_count());

    let envelope = build_envelope(&scan.stores, config)?;
    if envelope.is_empty() {
        return Err(Error::NoRecords);
    }

    let records = envelope.flatten();

    let csv_path = root.join(&config.csv_output);
    write_csv(&records, &csv_path)?;
    println!("OK: Results saved to CSV file: {}", csv_path.display());

    let db_path = root.join(&config.db_output);
    write_db(&records, &db_path)?;
    println!("OK: Results saved to DB file: {}", db_path.display());

    Ok(RunSummary {
        started_at,
        finished_at: Utc::now(),
        root: root.to_path_buf(),
        stores: envelope.stores.clone(),
        records_written: records.len(),
    })
}
