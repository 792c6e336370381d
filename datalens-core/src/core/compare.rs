//! Structural and value-level comparison of two tabular results.
//!
//! Two independently executed queries do not share a row order, so row-level
//! diffing is only defined when the caller names key columns to join on.
//! Without keys the report is limited to row counts, the schema difference,
//! and aggregate numeric deltas per common column.

use crate::core::inference::{self, ColumnType};
use crate::core::stats::{summary_statistics, ColumnSummary};
use crate::core::table::Table;
use crate::core::value::{Value, ValueKey};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Columns present on only one side or on both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDiff {
    pub only_in_left: Vec<String>,
    pub only_in_right: Vec<String>,
    pub common: Vec<String>,
}

/// Mean and standard-deviation deltas (right minus left) for a common
/// numeric column. A side with undefined statistics yields `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericDelta {
    pub mean_delta: Option<f64>,
    pub std_delta: Option<f64>,
}

/// One cell mismatch found by a keyed comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowChange {
    /// The key tuple identifying the row.
    pub key: Vec<Value>,
    pub column: String,
    pub left: Value,
    pub right: Value,
}

/// Row-level differences, present only when key columns were supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowDiff {
    /// Key tuples present only in the right table.
    pub added: Vec<Vec<Value>>,
    /// Key tuples present only in the left table.
    pub removed: Vec<Vec<Value>>,
    /// Cell mismatches for keys present on both sides.
    pub changed: Vec<RowChange>,
}

/// The result of comparing two tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub left_rows: usize,
    pub right_rows: usize,
    /// `right_rows - left_rows`.
    pub row_count_delta: i64,
    pub schema_diff: SchemaDiff,
    /// Aggregate deltas per common numeric column; populated only when no
    /// key columns were given.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub numeric_deltas: BTreeMap<String, NumericDelta>,
    /// Row-level diff; populated only when key columns were given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_diff: Option<RowDiff>,
}

/// Compares two tables.
///
/// With `key_columns`, rows are joined by key equality and compared
/// field-by-field over the common non-key columns; keys must exist on both
/// sides. Without them, only counts and per-column aggregate statistics are
/// diffed — positional comparison is never used as a substitute for a join
/// key. Duplicate keys keep their first occurrence on each side.
pub fn compare(
    left: &Table,
    right: &Table,
    key_columns: Option<&[String]>,
) -> Result<ComparisonReport> {
    let schema_diff = diff_schema(left, right);

    let mut report = ComparisonReport {
        left_rows: left.row_count(),
        right_rows: right.row_count(),
        row_count_delta: right.row_count() as i64 - left.row_count() as i64,
        schema_diff,
        numeric_deltas: BTreeMap::new(),
        row_diff: None,
    };

    match key_columns {
        Some(keys) => report.row_diff = Some(diff_rows(left, right, keys, &report.schema_diff)?),
        None => report.numeric_deltas = diff_statistics(left, right, &report.schema_diff)?,
    }

    debug!(
        left_rows = report.left_rows,
        right_rows = report.right_rows,
        common_columns = report.schema_diff.common.len(),
        keyed = key_columns.is_some(),
        "Compared tabular results"
    );
    Ok(report)
}

fn diff_schema(left: &Table, right: &Table) -> SchemaDiff {
    let left_set: HashSet<&str> = left.columns().iter().map(String::as_str).collect();
    let right_set: HashSet<&str> = right.columns().iter().map(String::as_str).collect();

    SchemaDiff {
        only_in_left: left
            .columns()
            .iter()
            .filter(|c| !right_set.contains(c.as_str()))
            .cloned()
            .collect(),
        only_in_right: right
            .columns()
            .iter()
            .filter(|c| !left_set.contains(c.as_str()))
            .cloned()
            .collect(),
        common: left
            .columns()
            .iter()
            .filter(|c| right_set.contains(c.as_str()))
            .cloned()
            .collect(),
    }
}

fn diff_statistics(
    left: &Table,
    right: &Table,
    schema: &SchemaDiff,
) -> Result<BTreeMap<String, NumericDelta>> {
    let left_types = inference::infer_types(left);
    let right_types = inference::infer_types(right);

    let mut numeric_common = Vec::new();
    for column in &schema.common {
        let li = left.column_index(column)?;
        let ri = right.column_index(column)?;
        if left_types[li] == ColumnType::Numeric && right_types[ri] == ColumnType::Numeric {
            numeric_common.push(column.clone());
        }
    }
    if numeric_common.is_empty() {
        return Ok(BTreeMap::new());
    }

    let left_stats = summary_statistics(left, Some(&numeric_common))?;
    let right_stats = summary_statistics(right, Some(&numeric_common))?;

    let mut deltas = BTreeMap::new();
    for column in numeric_common {
        let (left_mean, left_std) = numeric_fields(&left_stats[&column]);
        let (right_mean, right_std) = numeric_fields(&right_stats[&column]);
        deltas.insert(
            column,
            NumericDelta {
                mean_delta: delta(right_mean, left_mean),
                std_delta: delta(right_std, left_std),
            },
        );
    }
    Ok(deltas)
}

fn numeric_fields(summary: &ColumnSummary) -> (Option<f64>, Option<f64>) {
    match summary {
        ColumnSummary::Numeric { mean, std, .. } => (*mean, *std),
        ColumnSummary::Categorical { .. } => (None, None),
    }
}

fn delta(right: Option<f64>, left: Option<f64>) -> Option<f64> {
    Some(right? - left?)
}

fn diff_rows(
    left: &Table,
    right: &Table,
    key_columns: &[String],
    schema: &SchemaDiff,
) -> Result<RowDiff> {
    let left_keys: Vec<usize> = key_columns
        .iter()
        .map(|k| left.column_index(k))
        .collect::<Result<_>>()?;
    let right_keys: Vec<usize> = key_columns
        .iter()
        .map(|k| right.column_index(k))
        .collect::<Result<_>>()?;

    let compared: Vec<&String> = schema
        .common
        .iter()
        .filter(|c| !key_columns.contains(c))
        .collect();

    let index_of = |table: &Table, indices: &[usize]| {
        let mut map: HashMap<Vec<ValueKey>, usize> = HashMap::new();
        for (row_index, row) in table.rows().iter().enumerate() {
            let key: Vec<ValueKey> = indices.iter().map(|&i| row[i].key()).collect();
            map.entry(key).or_insert(row_index);
        }
        map
    };
    let left_index = index_of(left, &left_keys);
    let right_index = index_of(right, &right_keys);

    let key_tuple = |table: &Table, row: usize, indices: &[usize]| -> Vec<Value> {
        indices.iter().map(|&i| table.rows()[row][i].clone()).collect()
    };

    let mut removed = Vec::new();
    let mut changed = Vec::new();
    // Iterate left rows in order so the report is deterministic.
    for (row_index, row) in left.rows().iter().enumerate() {
        let key: Vec<ValueKey> = left_keys.iter().map(|&i| row[i].key()).collect();
        if left_index[&key] != row_index {
            continue; // duplicate key, first occurrence already handled
        }
        match right_index.get(&key) {
            None => removed.push(key_tuple(left, row_index, &left_keys)),
            Some(&right_row) => {
                for column in &compared {
                    let li = left.column_index(column)?;
                    let ri = right.column_index(column)?;
                    let left_cell = &left.rows()[row_index][li];
                    let right_cell = &right.rows()[right_row][ri];
                    if !cells_match(left_cell, right_cell) {
                        changed.push(RowChange {
                            key: key_tuple(left, row_index, &left_keys),
                            column: (*column).clone(),
                            left: left_cell.clone(),
                            right: right_cell.clone(),
                        });
                    }
                }
            }
        }
    }

    let mut added = Vec::new();
    for (row_index, row) in right.rows().iter().enumerate() {
        let key: Vec<ValueKey> = right_keys.iter().map(|&i| row[i].key()).collect();
        if right_index[&key] == row_index && !left_index.contains_key(&key) {
            added.push(key_tuple(right, row_index, &right_keys));
        }
    }

    Ok(RowDiff {
        added,
        removed,
        changed,
    })
}

/// Two cells match when they are loosely equal or both null.
fn cells_match(left: &Value, right: &Value) -> bool {
    (left.is_null() && right.is_null()) || left.loosely_equals(right)
}
