//! Group-by aggregation.
//!
//! Partitions a table by the distinct values of one column and computes a
//! set of aggregate functions per requested column within each group. The
//! output is itself a table: group keys in first-appearance order, one
//! `{column}_{function}` output column per requested pair.

use crate::core::inference::{self, ColumnType};
use crate::core::table::Table;
use crate::core::value::{Value, ValueKey};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// An aggregation function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFunc {
    Count,
    Sum,
    Mean,
    Min,
    Max,
    Std,
}

impl AggFunc {
    /// Suffix used to name the output column.
    pub fn suffix(&self) -> &'static str {
        match self {
            AggFunc::Count => "count",
            AggFunc::Sum => "sum",
            AggFunc::Mean => "mean",
            AggFunc::Min => "min",
            AggFunc::Max => "max",
            AggFunc::Std => "std",
        }
    }
}

/// Aggregations requested for one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnAggregates {
    pub column: String,
    pub functions: Vec<AggFunc>,
}

/// A group-by request: the grouping column plus ordered per-column function
/// lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateSpec {
    pub group_by: String,
    pub aggregates: Vec<ColumnAggregates>,
}

impl AggregateSpec {
    /// Starts a spec grouping by the given column.
    pub fn group_by(column: impl Into<String>) -> Self {
        Self {
            group_by: column.into(),
            aggregates: Vec::new(),
        }
    }

    /// Adds functions for one column.
    pub fn aggregate(mut self, column: impl Into<String>, functions: &[AggFunc]) -> Self {
        self.aggregates.push(ColumnAggregates {
            column: column.into(),
            functions: functions.to_vec(),
        });
        self
    }
}

/// The outcome of a group-by: the aggregated table plus warnings for any
/// (column, function) pair that was skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupByResult {
    pub table: Table,
    pub warnings: Vec<String>,
}

/// Partitions `table` by `spec.group_by` and aggregates.
///
/// Null is its own group, never dropped. Group keys appear in
/// first-appearance order. `count` counts all rows in the group; every other
/// function runs over the non-null numeric values of its column within the
/// group, yielding an explicit null when none exist. Non-count functions on
/// a non-numeric column are skipped with a warning rather than failing the
/// whole analysis.
pub fn group_by(table: &Table, spec: &AggregateSpec) -> Result<GroupByResult> {
    let group_index = table.column_index(&spec.group_by)?;
    let types = inference::infer_types(table);

    // Validate aggregate columns up front and keep only runnable pairs.
    let mut warnings = Vec::new();
    let mut pairs: Vec<(usize, &str, AggFunc)> = Vec::new();
    for request in &spec.aggregates {
        let index = table.column_index(&request.column)?;
        for func in &request.functions {
            if *func != AggFunc::Count && types[index] != ColumnType::Numeric {
                warnings.push(format!(
                    "skipped {}({}) because the column is {}, not numeric",
                    func.suffix(),
                    request.column,
                    types[index]
                ));
                continue;
            }
            // A repeated (column, function) request adds nothing.
            if pairs.iter().any(|&(i, _, f)| i == index && f == *func) {
                continue;
            }
            pairs.push((index, request.column.as_str(), *func));
        }
    }

    // Partition rows, preserving first-appearance order of keys.
    let mut group_of: HashMap<ValueKey, usize> = HashMap::new();
    let mut group_keys: Vec<Value> = Vec::new();
    let mut group_rows: Vec<Vec<usize>> = Vec::new();
    for (row_index, row) in table.rows().iter().enumerate() {
        let key = row[group_index].key();
        let group = *group_of.entry(key).or_insert_with(|| {
            group_keys.push(row[group_index].clone());
            group_rows.push(Vec::new());
            group_keys.len() - 1
        });
        group_rows[group].push(row_index);
    }

    // Output names must stay unique even when the group column is itself
    // named like a generated aggregate (e.g. grouping by `v_sum` while
    // summing `v`).
    let mut columns = vec![spec.group_by.clone()];
    for (_, column, func) in &pairs {
        let base = format!("{}_{}", column, func.suffix());
        let mut name = base.clone();
        let mut n = 2;
        while columns.contains(&name) {
            name = format!("{base}_{n}");
            n += 1;
        }
        columns.push(name);
    }

    let mut rows = Vec::with_capacity(group_keys.len());
    for (group, key) in group_keys.iter().enumerate() {
        let members = &group_rows[group];
        let mut row = Vec::with_capacity(columns.len());
        row.push(key.clone());
        for (index, _, func) in &pairs {
            row.push(aggregate_cell(table, members, *index, *func));
        }
        rows.push(row);
    }

    debug!(
        group_column = %spec.group_by,
        groups = group_keys.len(),
        output_columns = columns.len(),
        skipped = warnings.len(),
        "Computed group-by aggregation"
    );

    Ok(GroupByResult {
        table: Table::from_parts(columns, rows),
        warnings,
    })
}

fn aggregate_cell(table: &Table, members: &[usize], column: usize, func: AggFunc) -> Value {
    if func == AggFunc::Count {
        return Value::Int(members.len() as i64);
    }

    let values: Vec<f64> = members
        .iter()
        .filter_map(|&row| table.rows()[row][column].as_number())
        .collect();
    if values.is_empty() {
        return Value::Null;
    }

    let n = values.len() as f64;
    match func {
        AggFunc::Sum => Value::Float(values.iter().sum()),
        AggFunc::Mean => Value::Float(values.iter().sum::<f64>() / n),
        AggFunc::Min => Value::Float(values.iter().copied().fold(f64::INFINITY, f64::min)),
        AggFunc::Max => Value::Float(values.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        AggFunc::Std => {
            if values.len() == 1 {
                return Value::Float(0.0);
            }
            let mean = values.iter().sum::<f64>() / n;
            let sum_sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
            Value::Float((sum_sq / (n - 1.0)).sqrt())
        }
        AggFunc::Count => unreachable!("count handled above"),
    }
}
