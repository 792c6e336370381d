//! The tool-call boundary: one async method per analysis operation.
//!
//! [`AnalysisToolkit`] connects data sources to the pure engines. Every
//! method fetches through the collaborator under a timeout, runs the
//! engine on the materialized table, and returns a serializable payload.
//! The toolkit is stateless; no table is shared or mutated across calls.

use crate::core::aggregate::{self, AggregateSpec, GroupByResult};
use crate::core::compare::{self, ComparisonReport};
use crate::core::export;
use crate::core::filter::{self, FilterSpec};
use crate::core::inference;
use crate::core::stats::{self, ColumnSummary, CorrelationMatrix};
use crate::core::table::Table;
use crate::error::{DatalensError, Result};
use crate::sources::{ColumnSchema, DataSource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, instrument};

/// Configuration for the toolkit.
#[derive(Debug, Clone)]
pub struct ToolkitConfig {
    /// How long a collaborator fetch may take before the operation fails
    /// with [`DatalensError::Timeout`].
    pub fetch_timeout: Duration,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

impl ToolkitConfig {
    /// Sets the fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

/// Shape and typing overview of a dataset: counts, per-column inferred
/// types, and a small sample of leading rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub description: String,
    pub row_count: usize,
    pub column_count: usize,
    pub schema: Vec<ColumnSchema>,
    pub sample: Table,
}

/// Number of leading rows included in [`DatasetInfo::sample`].
const DESCRIBE_SAMPLE_ROWS: usize = 5;

/// Entry point for analysis operations over [`DataSource`] collaborators.
///
/// # Examples
///
/// ```rust,ignore
/// use datalens_core::prelude::*;
///
/// # async fn example(source: impl DataSource) -> Result<()> {
/// let toolkit = AnalysisToolkit::new();
/// let spec = FilterSpec::new().clause("age", FilterOp::Gt, 30i64);
/// let adults = toolkit.filter(&source, &spec, None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AnalysisToolkit {
    config: ToolkitConfig,
}

impl AnalysisToolkit {
    /// Creates a toolkit with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a toolkit with an explicit configuration.
    pub fn with_config(config: ToolkitConfig) -> Self {
        Self { config }
    }

    /// Fetches from a collaborator under the configured timeout.
    ///
    /// On timeout the operation fails outright; there is no partial
    /// analysis and no retry.
    async fn fetch(&self, source: &(impl DataSource + ?Sized)) -> Result<Table> {
        let timeout = self.config.fetch_timeout;
        match tokio::time::timeout(timeout, source.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(DatalensError::Timeout {
                source_type: source.description(),
                elapsed_ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// Materializes the full result table of a source.
    #[instrument(skip(self, source), fields(source = %source.description()))]
    pub async fn query(&self, source: &(impl DataSource + ?Sized)) -> Result<Table> {
        let table = self.fetch(source).await?;
        info!(rows = table.row_count(), columns = table.column_count(), "Query complete");
        Ok(table)
    }

    /// Fetches and filters rows, optionally truncating to `limit`.
    #[instrument(skip(self, source, spec), fields(source = %source.description(), clauses = spec.0.len()))]
    pub async fn filter(
        &self,
        source: &(impl DataSource + ?Sized),
        spec: &FilterSpec,
        limit: Option<usize>,
    ) -> Result<Table> {
        let table = self.fetch(source).await?;
        let filtered = filter::filter_rows(&table, spec, limit)?;
        info!(
            input_rows = table.row_count(),
            output_rows = filtered.row_count(),
            "Filter complete"
        );
        Ok(filtered)
    }

    /// Fetches and keeps only the requested columns, in caller order.
    #[instrument(skip(self, source), fields(source = %source.description(), columns = columns.len()))]
    pub async fn project(
        &self,
        source: &(impl DataSource + ?Sized),
        columns: &[String],
    ) -> Result<Table> {
        let table = self.fetch(source).await?;
        filter::project_columns(&table, columns)
    }

    /// Fetches and computes per-column summary statistics.
    #[instrument(skip(self, source, columns), fields(source = %source.description()))]
    pub async fn summary_statistics(
        &self,
        source: &(impl DataSource + ?Sized),
        columns: Option<&[String]>,
    ) -> Result<BTreeMap<String, ColumnSummary>> {
        let table = self.fetch(source).await?;
        let summaries = stats::summary_statistics(&table, columns)?;
        info!(rows = table.row_count(), summarized = summaries.len(), "Summary complete");
        Ok(summaries)
    }

    /// Fetches and computes the pairwise Pearson correlation matrix over
    /// numeric columns.
    #[instrument(skip(self, source, columns), fields(source = %source.description()))]
    pub async fn correlation(
        &self,
        source: &(impl DataSource + ?Sized),
        columns: Option<&[String]>,
    ) -> Result<CorrelationMatrix> {
        let table = self.fetch(source).await?;
        stats::correlation_analysis(&table, columns)
    }

    /// Fetches, partitions by the spec's group column, and aggregates.
    #[instrument(skip(self, source, spec), fields(source = %source.description(), group_by = %spec.group_by))]
    pub async fn group_by(
        &self,
        source: &(impl DataSource + ?Sized),
        spec: &AggregateSpec,
    ) -> Result<GroupByResult> {
        let table = self.fetch(source).await?;
        let result = aggregate::group_by(&table, spec)?;
        info!(
            groups = result.table.row_count(),
            warnings = result.warnings.len(),
            "Group-by complete"
        );
        Ok(result)
    }

    /// Fetches both sources and compares them, optionally joining rows on
    /// key columns.
    #[instrument(skip_all, fields(left = %left.description(), right = %right.description(), keyed = key_columns.is_some()))]
    pub async fn compare(
        &self,
        left: &(impl DataSource + ?Sized),
        right: &(impl DataSource + ?Sized),
        key_columns: Option<&[String]>,
    ) -> Result<ComparisonReport> {
        let left_table = self.fetch(left).await?;
        let right_table = self.fetch(right).await?;
        compare::compare(&left_table, &right_table, key_columns)
    }

    /// Fetches and serializes the result as a CSV document.
    #[instrument(skip(self, source), fields(source = %source.description()))]
    pub async fn export_csv(&self, source: &(impl DataSource + ?Sized)) -> Result<String> {
        let table = self.fetch(source).await?;
        export::to_csv_string(&table)
    }

    /// Fetches and reports the dataset's shape, inferred column types, and
    /// a sample of leading rows.
    #[instrument(skip(self, source), fields(source = %source.description()))]
    pub async fn describe(&self, source: &(impl DataSource + ?Sized)) -> Result<DatasetInfo> {
        let table = self.fetch(source).await?;
        let types = inference::infer_types(&table);
        let schema = table
            .columns()
            .iter()
            .zip(types)
            .map(|(name, data_type)| ColumnSchema {
                name: name.clone(),
                data_type,
            })
            .collect();
        Ok(DatasetInfo {
            description: source.description(),
            row_count: table.row_count(),
            column_count: table.column_count(),
            schema,
            sample: table.head(DESCRIBE_SAMPLE_ROWS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::Value;
    use crate::sources::MemorySource;

    fn source() -> MemorySource {
        let table = Table::new(
            vec!["name".into(), "score".into()],
            vec![
                vec![Value::Text("alice".into()), Value::Int(90)],
                vec![Value::Text("bob".into()), Value::Int(75)],
            ],
        )
        .unwrap();
        MemorySource::new("scores", table)
    }

    #[tokio::test]
    async fn test_query_materializes_the_source() {
        let toolkit = AnalysisToolkit::new();
        let table = toolkit.query(&source()).await.unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[tokio::test]
    async fn test_describe_reports_shape_and_types() {
        let toolkit = AnalysisToolkit::new();
        let info = toolkit.describe(&source()).await.unwrap();
        assert_eq!(info.row_count, 2);
        assert_eq!(info.column_count, 2);
        assert_eq!(info.schema[1].data_type, inference::ColumnType::Numeric);
        assert_eq!(info.sample.row_count(), 2);
    }

    #[tokio::test]
    async fn test_default_config_timeout() {
        assert_eq!(
            ToolkitConfig::default().fetch_timeout,
            Duration::from_secs(30)
        );
    }
}
