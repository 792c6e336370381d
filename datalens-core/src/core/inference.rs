//! Column type inference.
//!
//! Source values may arrive as text regardless of logical type (a CSV cell
//! holding `"42"` is a number to the analyst). Instead of duck-typing at
//! each use site, classification happens once here: a pure, deterministic
//! pass that resolves every column to exactly one [`ColumnType`] consumed by
//! all downstream engines. It never fails.

use crate::core::table::Table;
use crate::core::value::Value;
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The inferred semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Every non-null value parses as a number (typed or text numeral).
    Numeric,
    /// Every non-null value is in the boolean lexicon.
    Boolean,
    /// Every non-null value parses under the fixed date/time format set.
    Temporal,
    /// Anything else, and the default for all-null columns.
    Text,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Boolean => "boolean",
            ColumnType::Temporal => "temporal",
            ColumnType::Text => "text",
        };
        f.write_str(name)
    }
}

/// Pattern matching utilities for text-cell classification.
struct TypePatterns {
    integer: Regex,
    float: Regex,
    boolean_true: Regex,
    boolean_false: Regex,
}

static PATTERNS: Lazy<TypePatterns> = Lazy::new(|| TypePatterns {
    integer: Regex::new(r"^[+-]?\d+$").expect("static integer pattern"),
    float: Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("static float pattern"),
    boolean_true: Regex::new(r"(?i)^(true|t|yes|y)$").expect("static boolean pattern"),
    boolean_false: Regex::new(r"(?i)^(false|f|no|n)$").expect("static boolean pattern"),
});

/// Date/time formats recognized by temporal inference, tried in order.
const TEMPORAL_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const TEMPORAL_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Parses text under the fixed temporal format set. Bare dates resolve to
/// midnight.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    for format in TEMPORAL_DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(ts);
        }
    }
    for format in TEMPORAL_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Parses text under the boolean lexicon (`true/false`, `t/f`, `yes/no`,
/// `y/n`, case-insensitive).
pub fn parse_boolean(text: &str) -> Option<bool> {
    let trimmed = text.trim();
    if PATTERNS.boolean_true.is_match(trimmed) {
        Some(true)
    } else if PATTERNS.boolean_false.is_match(trimmed) {
        Some(false)
    } else {
        None
    }
}

fn is_numeric_cell(value: &Value) -> bool {
    match value {
        Value::Int(_) | Value::Float(_) => true,
        Value::Text(s) => {
            let trimmed = s.trim();
            PATTERNS.integer.is_match(trimmed) || PATTERNS.float.is_match(trimmed)
        }
        _ => false,
    }
}

fn is_boolean_cell(value: &Value) -> bool {
    match value {
        Value::Bool(_) => true,
        Value::Text(s) => parse_boolean(s).is_some(),
        _ => false,
    }
}

fn is_temporal_cell(value: &Value) -> bool {
    match value {
        Value::Timestamp(_) => true,
        Value::Text(s) => parse_timestamp(s).is_some(),
        _ => false,
    }
}

/// Classifies one column from its non-null cells.
///
/// Inference is all-or-nothing per column: a single non-conforming cell
/// demotes the whole column to the next candidate. Numeric and boolean are
/// tried before temporal so date-like numbers are not misclassified. A
/// column with no non-null cells is `Text` (no evidence to classify it
/// otherwise).
pub fn infer_column_type<'a>(cells: impl Iterator<Item = &'a Value>) -> ColumnType {
    let mut saw_value = false;
    let mut all_numeric = true;
    let mut all_boolean = true;
    let mut all_temporal = true;

    for cell in cells {
        if cell.is_null() {
            continue;
        }
        saw_value = true;
        all_numeric = all_numeric && is_numeric_cell(cell);
        all_boolean = all_boolean && is_boolean_cell(cell);
        all_temporal = all_temporal && is_temporal_cell(cell);
        if !(all_numeric || all_boolean || all_temporal) {
            return ColumnType::Text;
        }
    }

    if !saw_value {
        return ColumnType::Text;
    }
    if all_numeric {
        ColumnType::Numeric
    } else if all_boolean {
        ColumnType::Boolean
    } else if all_temporal {
        ColumnType::Temporal
    } else {
        ColumnType::Text
    }
}

/// Classifies every column of a table. The result is aligned with
/// [`Table::columns`].
pub fn infer_types(table: &Table) -> Vec<ColumnType> {
    (0..table.column_count())
        .map(|index| infer_column_type(table.column_values(index)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::table::Table;

    fn column(values: Vec<Value>) -> ColumnType {
        infer_column_type(values.iter())
    }

    #[test]
    fn test_numeric_from_typed_and_text_cells() {
        assert_eq!(
            column(vec![Value::Int(1), Value::Text("42".into()), Value::Float(2.5)]),
            ColumnType::Numeric
        );
        assert_eq!(
            column(vec![Value::Text("1e3".into()), Value::Text("-7".into())]),
            ColumnType::Numeric
        );
    }

    #[test]
    fn test_single_non_numeric_cell_demotes_to_text() {
        assert_eq!(
            column(vec![Value::Int(1), Value::Text("abc".into())]),
            ColumnType::Text
        );
    }

    #[test]
    fn test_boolean_lexicon() {
        assert_eq!(
            column(vec![
                Value::Text("yes".into()),
                Value::Text("NO".into()),
                Value::Bool(true),
            ]),
            ColumnType::Boolean
        );
        // "1"/"0" are numeric first, never boolean.
        assert_eq!(
            column(vec![Value::Text("1".into()), Value::Text("0".into())]),
            ColumnType::Numeric
        );
    }

    #[test]
    fn test_temporal_formats() {
        assert_eq!(
            column(vec![
                Value::Text("2024-01-15".into()),
                Value::Text("2024-02-01 08:30:00".into()),
                Value::Text("3/14/2024".into()),
            ]),
            ColumnType::Temporal
        );
        assert!(parse_timestamp("2024-01-15T10:00:00").is_some());
        assert!(parse_timestamp("not a date").is_none());
    }

    #[test]
    fn test_nulls_are_ignored_and_all_null_defaults_to_text() {
        assert_eq!(
            column(vec![Value::Null, Value::Int(3), Value::Null]),
            ColumnType::Numeric
        );
        assert_eq!(column(vec![Value::Null, Value::Null]), ColumnType::Text);
        assert_eq!(column(vec![]), ColumnType::Text);
    }

    #[test]
    fn test_infer_types_alignment() {
        let table = Table::new(
            vec!["n".into(), "b".into(), "t".into(), "s".into()],
            vec![vec![
                Value::Text("10".into()),
                Value::Text("true".into()),
                Value::Text("2023-12-25".into()),
                Value::Text("hello".into()),
            ]],
        )
        .unwrap();
        assert_eq!(
            infer_types(&table),
            vec![
                ColumnType::Numeric,
                ColumnType::Boolean,
                ColumnType::Temporal,
                ColumnType::Text,
            ]
        );
    }
}
