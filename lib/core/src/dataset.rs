//! In-memory tabular dataset
//!
//! Rows are observations, columns are named variables. Column order is fixed
//! and shared by every row.

use crate::error::SchemaError;
use crate::value::Value;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};

/// Ordered observations over a fixed set of named columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDataset")]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct RawDataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl TryFrom<RawDataset> for Dataset {
    type Error = SchemaError;

    fn try_from(raw: RawDataset) -> Result<Self, Self::Error> {
        Dataset::new(raw.columns, raw.rows)
    }
}

impl Dataset {
    /// Create a dataset, checking that names are unique and every row has
    /// exactly one value per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, SchemaError> {
        let mut seen = AHashSet::with_capacity(columns.len());
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::DuplicateColumn(name.clone()));
            }
        }

        for (row, values) in rows.iter().enumerate() {
            if values.len() != columns.len() {
                return Err(SchemaError::RowLength {
                    row,
                    expected: columns.len(),
                    found: values.len(),
                });
            }
        }

        Ok(Self { columns, rows })
    }

    /// Build a dataset from column-major data
    pub fn from_columns(columns: Vec<(String, Vec<Value>)>) -> Result<Self, SchemaError> {
        let n_rows = columns.first().map(|(_, values)| values.len()).unwrap_or(0);
        let mut rows = vec![Vec::with_capacity(columns.len()); n_rows];
        let mut names = Vec::with_capacity(columns.len());

        for (name, values) in columns {
            if values.len() != n_rows {
                return Err(SchemaError::RowLength {
                    row: values.len().min(n_rows),
                    expected: n_rows,
                    found: values.len(),
                });
            }
            for (row, value) in rows.iter_mut().zip(values) {
                row.push(value);
            }
            names.push(name);
        }

        Self::new(names, rows)
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[Value]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn value(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Iterate over the values of one column in row order
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[index])
    }
}
