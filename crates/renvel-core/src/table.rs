//! Core table types for representing rows read out of a store

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A table read fully out of one store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableData {
    /// Table name as reported by the store catalog
    pub name: String,
    /// Column definitions
    pub columns: Vec<Column>,
    /// Row data
    pub rows: Vec<Row>,
    /// Path of the store the table came from
    pub source_path: PathBuf,
}

impl TableData {
    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Indices of all columns whose name starts with `prefix`
    pub fn columns_with_prefix(&self, prefix: &str) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|c| c.name.starts_with(prefix))
            .collect()
    }
}

/// A column definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name (e.g., "elemId" or "Asx")
    pub name: String,
    /// Column index (0-based)
    pub index: usize,
}

impl Column {
    /// Create a new column
    pub fn new(name: String, index: usize) -> Self {
        Self { name, index }
    }
}

/// A row of data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    /// Cell values for each column
    pub cells: Vec<Value>,
}

impl Row {
    /// Create a new row
    pub fn new(cells: Vec<Value>) -> Self {
        Self { cells }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.cells.get(index)
    }
}

/// A cell value mapped from a SQLite storage class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Integer value
    Integer(i64),
    /// Floating-point value
    Real(f64),
    /// Text value
    Text(String),
    /// NULL cell
    Null,
}

impl Value {
    /// Numeric view of the cell; text is parsed, NULL yields None
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(f) => Some(*f),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            Value::Null => None,
        }
    }

    /// Integer view of the cell; reals truncate, text is parsed
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Real(f) => Some(*f as i64),
            Value::Text(s) => s.trim().parse::<i64>().ok(),
            Value::Null => None,
        }
    }

    /// Check if the cell is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert to a display string (NULL becomes empty)
    pub fn to_string_value(&self) -> String {
        match self {
            Value::Integer(i) => i.to_string(),
            Value::Real(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::Null => String::new(),
        }
    }
}

impl From<rusqlite::types::Value> for Value {
    fn from(v: rusqlite::types::Value) -> Self {
        use rusqlite::types::Value as Sq;
        match v {
            Sq::Integer(i) => Value::Integer(i),
            Sq::Real(f) => Value::Real(f),
            Sq::Text(s) => Value::Text(s),
            // BLOBs never carry reinforcement data; keep the cell, lose the bytes
            Sq::Blob(_) => Value::Null,
            Sq::Null => Value::Null,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(fl) => write!(f, "{}", fl),
            Value::Text(s) => write!(f, "{}", s),
            Value::Null => write!(f, ""),
        }
    }
}
