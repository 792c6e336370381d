//! The in-memory tabular result shared by every engine.
//!
//! A [`Table`] is produced once per query or file load and is immutable
//! afterwards: filters, aggregations, and comparisons return *new* tables
//! rather than mutating in place, so concurrent callers never observe
//! partial state.

use crate::core::value::Value;
use crate::error::{DatalensError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::collections::HashSet;

/// An ordered table of named columns and row records.
///
/// Rows are stored densely: every row has exactly one cell per column, in
/// column order, with missing source fields represented as [`Value::Null`].
/// That invariant is enforced at construction and holds for the lifetime of
/// the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Creates a table from column names and dense rows.
    ///
    /// Fails with a configuration error if column names are not unique or
    /// any row's arity disagrees with the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(DatalensError::Configuration(format!(
                    "duplicate column name '{name}'"
                )));
            }
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(DatalensError::Configuration(format!(
                    "row {i} has {} values but the table has {} columns",
                    row.len(),
                    columns.len()
                )));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Creates an empty table with the given columns.
    pub fn empty(columns: Vec<String>) -> Result<Self> {
        Self::new(columns, Vec::new())
    }

    /// Builds a table from loosely shaped records (JSON objects), the way a
    /// database collaborator returns rows.
    ///
    /// Column order is the first-seen order across all records; fields
    /// absent from a record become [`Value::Null`].
    pub fn from_records(records: Vec<Map<String, serde_json::Value>>) -> Result<Self> {
        let mut columns: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for record in &records {
            for key in record.keys() {
                if seen.insert(key.clone()) {
                    columns.push(key.clone());
                }
            }
        }

        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let mut row = Vec::with_capacity(columns.len());
            for column in &columns {
                let cell = match record.get(column) {
                    None => Value::Null,
                    Some(json) => serde_json::from_value(json.clone())?,
                };
                row.push(cell);
            }
            rows.push(row);
        }

        Self::new(columns, rows)
    }

    /// The ordered column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The row records, in source order.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Resolves a column name to its index, or fails with
    /// [`DatalensError::ColumnNotFound`].
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| DatalensError::column_not_found(name))
    }

    /// Whether the table has a column with the given name.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Iterates the cells of one column, in row order.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Consumes the table, returning its rows.
    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }

    /// The first `n` rows as a new table, preserving order.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Converts the table to record-shaped JSON, one object per row.
    pub fn to_records(&self) -> serde_json::Value {
        let records: Vec<serde_json::Value> = self
            .rows
            .iter()
            .map(|row| {
                let mut object = Map::new();
                for (name, cell) in self.columns.iter().zip(row) {
                    object.insert(
                        name.clone(),
                        serde_json::to_value(cell).unwrap_or(serde_json::Value::Null),
                    );
                }
                serde_json::Value::Object(object)
            })
            .collect();
        serde_json::Value::Array(records)
    }

    /// Internal constructor for engine outputs whose invariants are already
    /// established (same columns, rebuilt rows).
    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Table {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Table { columns, rows }
    }
}
