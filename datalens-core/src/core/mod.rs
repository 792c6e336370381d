//! The analysis engines: values, tables, inference, and the operations
//! built on top of them.

pub mod aggregate;
pub mod compare;
pub mod export;
pub mod filter;
pub mod inference;
pub mod stats;
pub mod table;
pub mod value;

pub use aggregate::{group_by, AggFunc, AggregateSpec, ColumnAggregates, GroupByResult};
pub use compare::{compare, ComparisonReport, NumericDelta, RowChange, RowDiff, SchemaDiff};
pub use export::{from_csv_reader, from_csv_str, to_csv, to_csv_string};
pub use filter::{filter_rows, project_columns, FilterCondition, FilterOp, FilterSpec};
pub use inference::{infer_column_type, infer_types, parse_boolean, parse_timestamp, ColumnType};
pub use stats::{
    correlation_analysis, detect_outliers, summary_statistics, ColumnSummary, CorrelatedPair,
    CorrelationMatrix, Outlier, OutlierMethod, TopValue,
};
pub use table::Table;
pub use value::{Value, ValueKey};
