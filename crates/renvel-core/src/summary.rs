//! Run summaries
//!
//! Captures what one analysis run did (stores visited, tables skipped and
//! why, records written) so a run can be audited after the fact.

use crate::envelope::{StoreOutcome, StoreReport, TableOutcome};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A machine-readable record of one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Directory that was scanned
    pub root: std::path::PathBuf,
    /// Per-store outcomes, in scan order
    pub stores: Vec<StoreReport>,
    /// Number of records written to the sinks
    pub records_written: usize,
}

impl RunSummary {
    /// Number of stores that were opened successfully
    pub fn stores_scanned(&self) -> usize {
        self.stores
            .iter()
            .filter(|s| matches!(s.outcome, StoreOutcome::Scanned(_)))
            .count()
    }

    /// Number of tables that contributed rows
    pub fn tables_aggregated(&self) -> usize {
        self.tables()
            .filter(|t| matches!(t.outcome, TableOutcome::Aggregated { .. }))
            .count()
    }

    /// Number of tables skipped for any reason
    pub fn tables_skipped(&self) -> usize {
        self.tables()
            .filter(|t| matches!(t.outcome, TableOutcome::Skipped(_)))
            .count()
    }

    fn tables(&self) -> impl Iterator<Item = &crate::envelope::TableReport> {
        self.stores.iter().flat_map(|s| match &s.outcome {
            StoreOutcome::Scanned(tables) => tables.as_slice(),
            StoreOutcome::OpenFailed(_) => &[],
        })
    }

    /// Save the summary as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Load a previously saved summary
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }
}
