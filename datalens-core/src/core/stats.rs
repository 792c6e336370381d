//! Descriptive statistics, correlation, and outlier detection over numeric
//! columns.
//!
//! All statistics distinguish "no data" from "bad request": a column with
//! too few values reports undefined fields (`null` in the payload), while a
//! misnamed column or a statistically meaningless request errors eagerly.

use crate::core::inference::{self, ColumnType};
use crate::core::table::Table;
use crate::error::{DatalensError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// How many of the most frequent values a non-numeric summary reports.
const TOP_VALUE_LIMIT: usize = 10;

/// A value frequency entry in a non-numeric column summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopValue {
    /// Rendered value.
    pub value: String,
    /// Number of rows holding it.
    pub count: usize,
}

/// Summary statistics for one column.
///
/// Numeric columns get the full descriptive record; anything else gets
/// counts and value frequencies, never a numeric mean. Undefined fields
/// (empty column, single value) serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnSummary {
    Numeric {
        /// Count of non-null values.
        count: usize,
        null_count: usize,
        mean: Option<f64>,
        /// Sample standard deviation (n-1 divisor); 0 for a single value.
        std: Option<f64>,
        min: Option<f64>,
        max: Option<f64>,
        p25: Option<f64>,
        median: Option<f64>,
        p75: Option<f64>,
    },
    Categorical {
        data_type: ColumnType,
        /// Count of non-null values.
        count: usize,
        null_count: usize,
        distinct: usize,
        top_values: Vec<TopValue>,
    },
}

/// Computes per-column summary statistics.
///
/// With no explicit request the numeric columns are summarized; requested
/// non-numeric columns get the categorical record. An unknown requested
/// column fails with [`DatalensError::ColumnNotFound`]. An empty table
/// yields records with all counts 0 and undefined numeric fields, never an
/// error.
pub fn summary_statistics(
    table: &Table,
    columns: Option<&[String]>,
) -> Result<BTreeMap<String, ColumnSummary>> {
    let types = inference::infer_types(table);

    let selected: Vec<usize> = match columns {
        Some(names) => {
            let mut indices = Vec::with_capacity(names.len());
            for name in names {
                indices.push(table.column_index(name)?);
            }
            indices
        }
        None if table.row_count() == 0 => (0..table.column_count()).collect(),
        None => (0..table.column_count())
            .filter(|&i| types[i] == ColumnType::Numeric)
            .collect(),
    };

    let mut result = BTreeMap::new();
    for index in selected {
        let name = table.columns()[index].clone();
        // With zero rows there is no evidence to classify a column, so every
        // selected column reports the empty numeric record.
        let summary = if table.row_count() == 0 || types[index] == ColumnType::Numeric {
            numeric_summary(table, index)
        } else {
            categorical_summary(table, index, types[index])
        };
        result.insert(name, summary);
    }

    debug!(columns = result.len(), rows = table.row_count(), "Computed summary statistics");
    Ok(result)
}

fn numeric_summary(table: &Table, index: usize) -> ColumnSummary {
    let mut values: Vec<f64> = Vec::new();
    let mut null_count = 0usize;
    for cell in table.column_values(index) {
        match cell.as_number() {
            Some(v) => values.push(v),
            None => null_count += 1,
        }
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let count = values.len();
    let mean = mean(&values);
    ColumnSummary::Numeric {
        count,
        null_count,
        mean,
        std: sample_std(&values, mean),
        min: values.first().copied(),
        max: values.last().copied(),
        p25: percentile(&values, 0.25),
        median: percentile(&values, 0.5),
        p75: percentile(&values, 0.75),
    }
}

fn categorical_summary(table: &Table, index: usize, data_type: ColumnType) -> ColumnSummary {
    let mut frequencies: HashMap<String, usize> = HashMap::new();
    let mut count = 0usize;
    let mut null_count = 0usize;
    for cell in table.column_values(index) {
        if cell.is_null() {
            null_count += 1;
        } else {
            count += 1;
            *frequencies.entry(cell.render()).or_insert(0) += 1;
        }
    }

    let distinct = frequencies.len();
    let mut top_values: Vec<TopValue> = frequencies
        .into_iter()
        .map(|(value, count)| TopValue { value, count })
        .collect();
    top_values.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    top_values.truncate(TOP_VALUE_LIMIT);

    ColumnSummary::Categorical {
        data_type,
        count,
        null_count,
        distinct,
        top_values,
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation with n-1 divisor; defined as 0 when only one
/// value is present, undefined when none are.
fn sample_std(values: &[f64], mean: Option<f64>) -> Option<f64> {
    match (values.len(), mean) {
        (0, _) => None,
        (1, _) => Some(0.0),
        (n, Some(m)) => {
            let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
            Some((sum_sq / (n as f64 - 1.0)).sqrt())
        }
        _ => None,
    }
}

/// Percentile with linear interpolation between closest ranks over a sorted
/// slice.
fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = q * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }
    let weight = rank - lower as f64;
    Some(sorted[lower] * (1.0 - weight) + sorted[upper] * weight)
}

/// A pairwise Pearson correlation matrix over numeric columns.
///
/// Symmetric by construction. A cell is `None` where correlation is
/// mathematically undefined (zero variance on either side).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    /// Columns in matrix order.
    pub columns: Vec<String>,
    /// `values[i][j]` is the coefficient between `columns[i]` and
    /// `columns[j]`.
    pub values: Vec<Vec<Option<f64>>>,
}

/// A strongly correlated column pair, reported by
/// [`CorrelationMatrix::strong_pairs`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedPair {
    pub left: String,
    pub right: String,
    pub coefficient: f64,
}

impl CorrelationMatrix {
    /// Looks up the coefficient for a pair of columns, flattening unknown
    /// columns and undefined cells to `None`.
    pub fn coefficient(&self, left: &str, right: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == left)?;
        let j = self.columns.iter().position(|c| c == right)?;
        self.values[i][j]
    }

    /// Pairs with |coefficient| at or above `threshold`, strongest first.
    pub fn strong_pairs(&self, threshold: f64) -> Vec<CorrelatedPair> {
        let mut pairs = Vec::new();
        for i in 0..self.columns.len() {
            for j in (i + 1)..self.columns.len() {
                if let Some(r) = self.values[i][j] {
                    if r.abs() >= threshold {
                        pairs.push(CorrelatedPair {
                            left: self.columns[i].clone(),
                            right: self.columns[j].clone(),
                            coefficient: r,
                        });
                    }
                }
            }
        }
        pairs.sort_by(|a, b| {
            b.coefficient
                .abs()
                .partial_cmp(&a.coefficient.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        pairs
    }
}

/// Computes the Pearson correlation matrix over the table's numeric columns,
/// intersected with `columns` when given.
///
/// Fails with [`DatalensError::InsufficientData`] when fewer than two
/// numeric columns qualify, or when a pair has fewer than two rows with
/// values on both sides. A zero-variance side yields an explicit undefined
/// cell rather than a propagated NaN.
pub fn correlation_analysis(
    table: &Table,
    columns: Option<&[String]>,
) -> Result<CorrelationMatrix> {
    let types = inference::infer_types(table);

    let candidates: Vec<usize> = match columns {
        Some(names) => {
            let mut indices = Vec::with_capacity(names.len());
            for name in names {
                indices.push(table.column_index(name)?);
            }
            indices
                .into_iter()
                .filter(|&i| types[i] == ColumnType::Numeric)
                .collect()
        }
        None => (0..table.column_count())
            .filter(|&i| types[i] == ColumnType::Numeric)
            .collect(),
    };

    if candidates.len() < 2 {
        return Err(DatalensError::insufficient_data(format!(
            "correlation requires at least two numeric columns, found {}",
            candidates.len()
        )));
    }

    let names: Vec<String> = candidates
        .iter()
        .map(|&i| table.columns()[i].clone())
        .collect();
    let series: Vec<Vec<Option<f64>>> = candidates
        .iter()
        .map(|&i| table.column_values(i).map(|v| v.as_number()).collect())
        .collect();

    let n = names.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        values[i][i] = diagonal(&series[i]);
        for j in (i + 1)..n {
            let r = pearson(&names[i], &names[j], &series[i], &series[j])?;
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    debug!(columns = n, rows = table.row_count(), "Computed correlation matrix");
    Ok(CorrelationMatrix {
        columns: names,
        values,
    })
}

/// 1.0 when the column's own variance is defined, otherwise undefined.
fn diagonal(series: &[Option<f64>]) -> Option<f64> {
    let values: Vec<f64> = series.iter().flatten().copied().collect();
    if values.len() < 2 {
        return None;
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    let var: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    if var == 0.0 {
        None
    } else {
        Some(1.0)
    }
}

/// Pearson coefficient over pairwise complete rows. `Ok(None)` marks a
/// mathematically undefined pair (zero variance); `Err` marks a pair with
/// too few complete rows to evaluate at all.
fn pearson(
    left_name: &str,
    right_name: &str,
    left: &[Option<f64>],
    right: &[Option<f64>],
) -> Result<Option<f64>> {
    let pairs: Vec<(f64, f64)> = left
        .iter()
        .zip(right)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();

    if pairs.len() < 2 {
        return Err(DatalensError::insufficient_data(format!(
            "correlation between '{left_name}' and '{right_name}' requires at least two rows \
             with values in both columns, found {}",
            pairs.len()
        )));
    }

    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (a, b) in &pairs {
        let da = a - mean_a;
        let db = b - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return Ok(None);
    }
    Ok(Some(cov / (var_a.sqrt() * var_b.sqrt())))
}

/// Outlier detection method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    /// |z| > 3 over population moments.
    Zscore,
    /// Outside the 1.5 x IQR fences.
    Iqr,
}

/// A row flagged as an outlier in one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlier {
    /// Index of the row in the source table.
    pub row_index: usize,
    /// The offending value.
    pub value: f64,
    /// Z-score, or distance beyond the nearest IQR fence.
    pub score: f64,
}

/// Flags outlying values in a numeric column.
///
/// Applying this to a non-numeric column is a request mistake and fails
/// with a filter error naming the column.
pub fn detect_outliers(table: &Table, column: &str, method: OutlierMethod) -> Result<Vec<Outlier>> {
    let index = table.column_index(column)?;
    let types = inference::infer_types(table);
    if types[index] != ColumnType::Numeric {
        return Err(DatalensError::filter(
            column,
            format!(
                "outlier detection is only defined for numeric columns, but '{column}' is {}",
                types[index]
            ),
        ));
    }

    let cells: Vec<(usize, f64)> = table
        .column_values(index)
        .enumerate()
        .filter_map(|(row, cell)| cell.as_number().map(|v| (row, v)))
        .collect();
    let values: Vec<f64> = cells.iter().map(|(_, v)| *v).collect();

    let mut outliers = Vec::new();
    match method {
        OutlierMethod::Zscore => {
            let Some(m) = mean(&values) else {
                return Ok(outliers);
            };
            let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
            let std = var.sqrt();
            if std == 0.0 {
                return Ok(outliers);
            }
            for (row_index, value) in cells {
                let z = (value - m) / std;
                if z.abs() > 3.0 {
                    outliers.push(Outlier {
                        row_index,
                        value,
                        score: z,
                    });
                }
            }
        }
        OutlierMethod::Iqr => {
            let mut sorted = values.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let (Some(q1), Some(q3)) = (percentile(&sorted, 0.25), percentile(&sorted, 0.75))
            else {
                return Ok(outliers);
            };
            let iqr = q3 - q1;
            let lower = q1 - 1.5 * iqr;
            let upper = q3 + 1.5 * iqr;
            for (row_index, value) in cells {
                if value < lower || value > upper {
                    let score = if value < lower {
                        lower - value
                    } else {
                        value - upper
                    };
                    outliers.push(Outlier {
                        row_index,
                        value,
                        score,
                    });
                }
            }
        }
    }
    Ok(outliers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::Value;

    fn numeric_table(values: Vec<Vec<Value>>) -> Table {
        Table::new(vec!["x".into(), "y".into()], values).unwrap()
    }

    #[test]
    fn test_summary_basic_moments() {
        let table = Table::new(
            vec!["v".into()],
            vec![
                vec![Value::Int(1)],
                vec![Value::Int(2)],
                vec![Value::Int(3)],
                vec![Value::Int(4)],
                vec![Value::Null],
            ],
        )
        .unwrap();
        let stats = summary_statistics(&table, None).unwrap();
        let ColumnSummary::Numeric {
            count,
            null_count,
            mean,
            std,
            min,
            max,
            p25,
            median,
            p75,
        } = &stats["v"]
        else {
            panic!("expected numeric summary");
        };
        assert_eq!(*count, 4);
        assert_eq!(*null_count, 1);
        assert_eq!(*mean, Some(2.5));
        assert_eq!(*min, Some(1.0));
        assert_eq!(*max, Some(4.0));
        // Linear interpolation between closest ranks.
        assert_eq!(*p25, Some(1.75));
        assert_eq!(*median, Some(2.5));
        assert_eq!(*p75, Some(3.25));
        let expected_std = (((1.5f64 * 1.5) * 2.0 + (0.5 * 0.5) * 2.0) / 3.0).sqrt();
        assert!((std.unwrap() - expected_std).abs() < 1e-12);
    }

    #[test]
    fn test_summary_single_value_std_is_zero() {
        let table = Table::new(vec!["v".into()], vec![vec![Value::Int(9)]]).unwrap();
        let stats = summary_statistics(&table, None).unwrap();
        let ColumnSummary::Numeric { std, .. } = &stats["v"] else {
            panic!("expected numeric summary");
        };
        assert_eq!(*std, Some(0.0));
    }

    #[test]
    fn test_summary_empty_table_never_raises() {
        let table = Table::empty(vec!["a".into(), "b".into()]).unwrap();
        let stats = summary_statistics(&table, None).unwrap();
        assert_eq!(stats.len(), 2);
        for summary in stats.values() {
            let ColumnSummary::Numeric { count, mean, .. } = summary else {
                panic!("expected numeric record on empty table");
            };
            assert_eq!(*count, 0);
            assert_eq!(*mean, None);
        }
    }

    #[test]
    fn test_summary_requested_text_column_reports_distinct() {
        let table = Table::new(
            vec!["c".into()],
            vec![
                vec![Value::Text("x".into())],
                vec![Value::Text("x".into())],
                vec![Value::Text("y".into())],
                vec![Value::Null],
            ],
        )
        .unwrap();
        let request = vec!["c".to_string()];
        let stats = summary_statistics(&table, Some(&request)).unwrap();
        let ColumnSummary::Categorical {
            count,
            null_count,
            distinct,
            top_values,
            ..
        } = &stats["c"]
        else {
            panic!("expected categorical summary");
        };
        assert_eq!(*count, 3);
        assert_eq!(*null_count, 1);
        assert_eq!(*distinct, 2);
        assert_eq!(top_values[0].value, "x");
        assert_eq!(top_values[0].count, 2);
    }

    #[test]
    fn test_summary_unknown_column_errors() {
        let table = Table::empty(vec!["a".into()]).unwrap();
        let request = vec!["ghost".to_string()];
        assert!(matches!(
            summary_statistics(&table, Some(&request)),
            Err(DatalensError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_correlation_perfect_and_symmetric() {
        let table = numeric_table(vec![
            vec![Value::Int(1), Value::Int(2)],
            vec![Value::Int(2), Value::Int(4)],
            vec![Value::Int(3), Value::Int(6)],
        ]);
        let matrix = correlation_analysis(&table, None).unwrap();
        let r = matrix.coefficient("x", "y").unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        assert_eq!(matrix.coefficient("x", "y"), matrix.coefficient("y", "x"));
        assert_eq!(matrix.coefficient("x", "x"), Some(1.0));
    }

    #[test]
    fn test_correlation_zero_variance_is_undefined_not_nan() {
        let table = numeric_table(vec![
            vec![Value::Int(5), Value::Int(1)],
            vec![Value::Int(5), Value::Int(2)],
            vec![Value::Int(5), Value::Int(3)],
        ]);
        let matrix = correlation_analysis(&table, None).unwrap();
        assert_eq!(matrix.coefficient("x", "y"), None);
        // Zero-variance diagonal is undefined as well.
        assert_eq!(matrix.coefficient("x", "x"), None);
        assert_eq!(matrix.coefficient("y", "y"), Some(1.0));
    }

    #[test]
    fn test_correlation_requires_two_numeric_columns() {
        let table = Table::new(
            vec!["x".into(), "label".into()],
            vec![vec![Value::Int(1), Value::Text("a".into())]],
        )
        .unwrap();
        assert!(matches!(
            correlation_analysis(&table, None),
            Err(DatalensError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_correlation_sparse_pair_errors() {
        let table = numeric_table(vec![
            vec![Value::Int(1), Value::Null],
            vec![Value::Null, Value::Int(2)],
            vec![Value::Int(3), Value::Null],
        ]);
        let err = correlation_analysis(&table, None).unwrap_err();
        assert!(err.to_string().contains("'x'"));
        assert!(err.to_string().contains("'y'"));
    }

    #[test]
    fn test_strong_pairs_sorted_by_magnitude() {
        let matrix = CorrelationMatrix {
            columns: vec!["a".into(), "b".into(), "c".into()],
            values: vec![
                vec![Some(1.0), Some(0.3), Some(-0.9)],
                vec![Some(0.3), Some(1.0), Some(0.7)],
                vec![Some(-0.9), Some(0.7), Some(1.0)],
            ],
        };
        let pairs = matrix.strong_pairs(0.5);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].coefficient, -0.9);
        assert_eq!(pairs[1].coefficient, 0.7);
    }

    #[test]
    fn test_outliers_zscore() {
        let mut rows: Vec<Vec<Value>> = (0..30).map(|_| vec![Value::Int(10)]).collect();
        rows.push(vec![Value::Int(1000)]);
        // Identical values plus one spike: only the spike is flagged.
        let table = Table::new(vec!["v".into()], rows).unwrap();
        let outliers = detect_outliers(&table, "v", OutlierMethod::Zscore).unwrap();
        assert_eq!(outliers.len(), 1);
        assert_eq!(outliers[0].row_index, 30);
        assert_eq!(outliers[0].value, 1000.0);
    }

    #[test]
    fn test_outliers_iqr() {
        let mut rows: Vec<Vec<Value>> = (1..=20).map(|i| vec![Value::Int(i)]).collect();
        rows.push(vec![Value::Int(500)]);
        let table = Table::new(vec!["v".into()], rows).unwrap();
        let outliers = detect_outliers(&table, "v", OutlierMethod::Iqr).unwrap();
        assert_eq!(outliers.len(), 1);
        assert_eq!(outliers[0].value, 500.0);
    }

    #[test]
    fn test_outliers_reject_text_column() {
        let table = Table::new(
            vec!["c".into()],
            vec![vec![Value::Text("hello".into())]],
        )
        .unwrap();
        assert!(matches!(
            detect_outliers(&table, "c", OutlierMethod::Zscore),
            Err(DatalensError::Filter { .. })
        ));
    }
}
