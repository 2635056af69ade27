//! Analysis configuration
//!
//! The original workflow hard-coded these as script-level constants; here they
//! travel as an explicit struct so nothing in the crate holds global state.

use serde::{Deserialize, Serialize};

/// Default name of the element identifier column
pub const DEFAULT_ELEMENT_ID_COLUMN: &str = "elemId";
/// Default name of the combination/set index column
pub const DEFAULT_SET_INDEX_COLUMN: &str = "setN";
/// Default prefix marking reinforcement columns
pub const DEFAULT_REINFORCEMENT_PREFIX: &str = "As";
/// Default file name for the delimited sink
pub const DEFAULT_CSV_OUTPUT: &str = "Enveloped_Reinforcement_Analysis.csv";
/// Default file name for the relational sink
pub const DEFAULT_DB_OUTPUT: &str = "Enveloped_Reinforcement_Analysis.db";

/// Configuration for one envelope analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Column identifying the structural element
    pub element_id_column: String,
    /// Column carrying the load-combination set number
    pub set_index_column: String,
    /// Columns starting with this prefix are maximized
    pub reinforcement_prefix: String,
    /// File name of the CSV sink
    pub csv_output: String,
    /// File name of the database sink
    pub db_output: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            element_id_column: DEFAULT_ELEMENT_ID_COLUMN.to_string(),
            set_index_column: DEFAULT_SET_INDEX_COLUMN.to_string(),
            reinforcement_prefix: DEFAULT_REINFORCEMENT_PREFIX.to_string(),
            csv_output: DEFAULT_CSV_OUTPUT.to_string(),
            db_output: DEFAULT_DB_OUTPUT.to_string(),
        }
    }
}

impl AnalyzerConfig {
    /// Store file names the scanner must skip (the run's own outputs)
    pub fn excluded_store_names(&self) -> Vec<&str> {
        vec![self.db_output.as_str()]
    }
}
