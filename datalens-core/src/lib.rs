//! # Datalens - Query Result Analysis for Rust
//!
//! Datalens turns raw tabular query results into typed, analyzable tables
//! and provides the operations an analyst reaches for first: filtering and
//! projection, summary statistics, correlation, group-by aggregation,
//! result comparison, and CSV export. Rows come from pluggable
//! [`sources::DataSource`] collaborators; every analysis runs on an
//! immutable in-memory [`core::Table`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use datalens_core::prelude::*;
//! use datalens_core::core::{AggFunc, AggregateSpec, FilterOp, FilterSpec};
//! use datalens_core::sources::CsvSource;
//!
//! # async fn example() -> datalens_core::Result<()> {
//! let toolkit = AnalysisToolkit::new();
//! let orders = CsvSource::new("data/orders.csv");
//!
//! // What does this dataset look like?
//! let info = toolkit.describe(&orders).await?;
//! println!("{} rows, {} columns", info.row_count, info.column_count);
//!
//! // Filter, then aggregate.
//! let spec = FilterSpec::new().clause("total", FilterOp::Gt, 100i64);
//! let large = toolkit.filter(&orders, &spec, None).await?;
//!
//! let agg = AggregateSpec::group_by("region")
//!     .aggregate("total", &[AggFunc::Count, AggFunc::Sum, AggFunc::Mean]);
//! let by_region = toolkit.group_by(&orders, &agg).await?;
//! for warning in &by_region.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`core`**: the pure engines — [`core::Value`] and [`core::Table`],
//!   type inference, filtering and projection, statistics, aggregation,
//!   comparison, and CSV serialization. No I/O, no async.
//! - **`sources`**: [`sources::DataSource`] collaborators that materialize
//!   tables (CSV files with glob support, in-memory tables).
//! - **`tools`**: [`tools::AnalysisToolkit`], the async boundary that
//!   fetches under a timeout and runs the engines.
//! - **`logging`**: `tracing` subscriber configuration.
//!
//! ## Type inference
//!
//! Source values often arrive as text regardless of logical type. Each
//! column is classified once, from its non-null cells, as numeric, boolean,
//! temporal, or text; classification is all-or-nothing per column, so a
//! single stray value demotes the column rather than corrupting downstream
//! math. See [`core::inference`].

pub mod core;
pub mod error;
pub mod logging;
pub mod prelude;
pub mod sources;
pub mod tools;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{DatalensError, Result};
