use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::{EtlError, Result};

/// a single typed value, tagged once when the dataset is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    Timestamp(NaiveDateTime),
    /// anything the readers cannot classify (spreadsheet durations, database blobs).
    Other(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// plain text form of the value, `None` for nulls.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Integer(i) => Some(i.to_string()),
            Cell::Float(f) => Some(format_float(*f)),
            Cell::Boolean(true) => Some("TRUE".to_string()),
            Cell::Boolean(false) => Some("FALSE".to_string()),
            Cell::Text(s) | Cell::Other(s) => Some(s.clone()),
            Cell::Timestamp(ts) => Some(ts.to_string()),
        }
    }
}

/// renders a float the way a dynamic language prints it: integral values keep a trailing `.0`.
pub(crate) fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// inferred scalar kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    Text,
    Integer,
    Float,
    Boolean,
    Timestamp,
    /// the column held nothing but nulls.
    Unknown,
}

impl StorageType {
    /// canonical label consumed by [`crate::map_type`].
    pub fn label(self) -> &'static str {
        match self {
            StorageType::Text => "text",
            StorageType::Integer => "int64",
            StorageType::Float => "float64",
            StorageType::Boolean => "bool",
            StorageType::Timestamp => "timestamp",
            StorageType::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub storage_type: StorageType,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, storage_type: StorageType, cells: Vec<Cell>) -> Self {
        Column {
            name: name.into(),
            storage_type,
            cells,
        }
    }
}

/// an immutable in-memory table: ordered columns of equal length with unique names.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let expected = first.cells.len();
            if let Some(bad) = columns.iter().find(|c| c.cells.len() != expected) {
                return Err(EtlError::InvalidDataset(format!(
                    "column \"{}\" has {} rows, expected {}",
                    bad.name,
                    bad.cells.len(),
                    expected
                )));
            }
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(EtlError::InvalidDataset(format!(
                    "duplicate column name \"{}\"",
                    column.name
                )));
            }
        }

        Ok(Dataset { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.cells.len())
    }

    /// cells of one row in column order.
    pub fn row(&self, index: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.columns.iter().filter_map(move |c| c.cells.get(index))
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }
}
