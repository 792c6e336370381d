//! Row predicates and column projection.
//!
//! A [`FilterSpec`] is a declarative set of per-column predicates combined
//! by logical AND. Filtering never reorders rows: the output is always a
//! subset of the input in original order.

use crate::core::inference::{self, parse_timestamp, ColumnType};
use crate::core::table::Table;
use crate::core::value::Value;
use crate::error::{DatalensError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// Comparison operator for a filter clause.
///
/// Null cells satisfy no clause, including `ne`: an unknown value is not
/// evidence of inequality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Ne,
    Contains,
}

/// One condition in a filter specification: either a bare literal (equality)
/// or an explicit operator clause.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterCondition {
    /// `{"op": "gt", "value": 30}`
    Clause { op: FilterOp, value: Value },
    /// `"New York"` — shorthand for equality.
    Equals(Value),
}

/// A mapping from column name to condition. All clauses must hold for a row
/// to pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec(pub HashMap<String, FilterCondition>);

impl FilterSpec {
    /// Creates an empty specification (matches every row).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality condition.
    pub fn equals(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0
            .insert(column.into(), FilterCondition::Equals(value.into()));
        self
    }

    /// Adds an operator clause.
    pub fn clause(mut self, column: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.0.insert(
            column.into(),
            FilterCondition::Clause {
                op,
                value: value.into(),
            },
        );
        self
    }
}

struct CompiledClause<'a> {
    index: usize,
    op: FilterOp,
    operand: &'a Value,
}

/// Keeps the rows satisfying every clause of `spec`, preserving input order,
/// then truncates to `limit` rows if one is given.
///
/// Errors eagerly on an unknown column or on `contains` applied to a column
/// not inferred as text. Ordered comparisons coerce per cell: a null or
/// non-coercible cell simply never matches.
pub fn filter_rows(table: &Table, spec: &FilterSpec, limit: Option<usize>) -> Result<Table> {
    let types = inference::infer_types(table);

    let mut clauses = Vec::with_capacity(spec.0.len());
    for (column, condition) in &spec.0 {
        let index = table.column_index(column)?;
        let (op, operand) = match condition {
            FilterCondition::Clause { op, value } => (*op, value),
            FilterCondition::Equals(value) => (FilterOp::Eq, value),
        };
        if op == FilterOp::Contains && types[index] != ColumnType::Text {
            return Err(DatalensError::filter(
                column,
                format!(
                    "'contains' is only defined for text columns, but '{column}' is {}",
                    types[index]
                ),
            ));
        }
        clauses.push(CompiledClause { index, op, operand });
    }

    let mut rows = Vec::new();
    for row in table.rows() {
        if clauses.iter().all(|clause| matches(clause, &row[clause.index])) {
            rows.push(row.clone());
            if let Some(max) = limit {
                if rows.len() == max {
                    break;
                }
            }
        }
    }

    debug!(
        input_rows = table.row_count(),
        output_rows = rows.len(),
        clauses = clauses.len(),
        "Applied row filter"
    );

    Ok(Table::from_parts(table.columns().to_vec(), rows))
}

fn matches(clause: &CompiledClause<'_>, cell: &Value) -> bool {
    if cell.is_null() {
        return false;
    }
    match clause.op {
        FilterOp::Eq => cell.loosely_equals(clause.operand),
        FilterOp::Ne => !cell.loosely_equals(clause.operand),
        FilterOp::Contains => match (cell.as_text(), clause.operand) {
            (Some(haystack), operand) => haystack.contains(&operand.render()),
            (None, _) => false,
        },
        FilterOp::Gt => ordered(cell, clause.operand) == Some(Ordering::Greater),
        FilterOp::Gte => matches!(
            ordered(cell, clause.operand),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        FilterOp::Lt => ordered(cell, clause.operand) == Some(Ordering::Less),
        FilterOp::Lte => matches!(
            ordered(cell, clause.operand),
            Some(Ordering::Less | Ordering::Equal)
        ),
    }
}

/// Orders a cell against an operand: numerically when both coerce to
/// numbers, chronologically when both parse as timestamps, otherwise
/// undefined (the row does not match).
fn ordered(cell: &Value, operand: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (cell.as_number(), operand.as_number()) {
        return a.partial_cmp(&b);
    }
    let left = match cell {
        Value::Timestamp(ts) => Some(*ts),
        Value::Text(s) => parse_timestamp(s),
        _ => None,
    }?;
    let right = match operand {
        Value::Timestamp(ts) => Some(*ts),
        Value::Text(s) => parse_timestamp(s),
        _ => None,
    }?;
    Some(left.cmp(&right))
}

/// Returns a table containing only the requested columns, in caller order.
///
/// Requesting an unknown column fails with [`DatalensError::ColumnNotFound`].
/// Projection is idempotent: projecting the same set twice equals projecting
/// once.
pub fn project_columns(table: &Table, names: &[String]) -> Result<Table> {
    let mut indices = Vec::with_capacity(names.len());
    for name in names {
        indices.push(table.column_index(name)?);
    }
    let rows = table
        .rows()
        .iter()
        .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
        .collect();
    Table::new(names.to_vec(), rows)
}
