//! CSV file source with glob pattern support.

use crate::core::export::cell_from_field;
use crate::core::table::Table;
use crate::error::{DatalensError, Result};
use crate::sources::{expand_globs, DataSource};
use async_trait::async_trait;
use std::fs::File;
use std::io::BufReader;
use tracing::{debug, instrument};

/// Parsing options for CSV files.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Whether the first record of each file is a header row.
    pub has_header: bool,
    /// Field delimiter.
    pub delimiter: u8,
    /// Quote character.
    pub quote: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
            quote: b'"',
        }
    }
}

impl CsvOptions {
    /// Sets whether files carry a header row.
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Sets the field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets the quote character.
    pub fn with_quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }
}

/// A data source backed by one or more CSV files.
///
/// Multiple files are concatenated row-wise; their headers must agree. With
/// `has_header` disabled, columns are named `column_1`, `column_2`, and so
/// on, and every file must have the same arity.
///
/// # Examples
///
/// ```rust,ignore
/// use datalens_core::sources::{CsvOptions, CsvSource, DataSource};
///
/// # async fn example() -> datalens_core::Result<()> {
/// let source = CsvSource::from_glob("data/events-*.csv");
/// let table = source.fetch().await?;
///
/// let tsv = CsvSource::with_options(
///     "data/events.tsv",
///     CsvOptions::default().with_delimiter(b'\t'),
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CsvSource {
    patterns: Vec<String>,
    options: CsvOptions,
}

impl CsvSource {
    /// Creates a source reading one path or glob pattern with default
    /// options.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            patterns: vec![pattern.into()],
            options: CsvOptions::default(),
        }
    }

    /// Creates a source reading one path or glob pattern with explicit
    /// options.
    pub fn with_options(pattern: impl Into<String>, options: CsvOptions) -> Self {
        Self {
            patterns: vec![pattern.into()],
            options,
        }
    }

    /// Creates a source reading several paths or glob patterns.
    pub fn from_paths(patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            options: CsvOptions::default(),
        }
    }

    /// Alias of [`CsvSource::new`] that reads as intent at call sites using
    /// glob patterns.
    pub fn from_glob(pattern: impl Into<String>) -> Self {
        Self::new(pattern)
    }

    fn read_file(&self, path: &str) -> Result<Table> {
        let file = File::open(path).map_err(|e| DatalensError::DataSource {
            source_type: "csv".to_string(),
            message: format!("Failed to open '{path}'"),
            source: Some(Box::new(e)),
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(self.options.has_header)
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .flexible(false)
            .from_reader(BufReader::new(file));

        let mut columns: Vec<String> = if self.options.has_header {
            reader.headers()?.iter().map(|h| h.to_string()).collect()
        } else {
            Vec::new()
        };

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| DatalensError::DataSource {
                source_type: "csv".to_string(),
                message: format!("Malformed record in '{path}'"),
                source: Some(Box::new(e)),
            })?;
            if columns.is_empty() {
                columns = (1..=record.len()).map(|i| format!("column_{i}")).collect();
            }
            rows.push(record.iter().map(cell_from_field).collect());
        }

        // Headerless empty file: no record ever fixed the arity.
        if columns.is_empty() {
            return Err(DatalensError::data_source(
                "csv",
                format!("Cannot determine columns of empty headerless file '{path}'"),
            ));
        }

        Table::new(columns, rows)
    }
}

#[async_trait]
impl DataSource for CsvSource {
    #[instrument(skip(self), fields(patterns = ?self.patterns))]
    async fn fetch(&self) -> Result<Table> {
        // expand_globs fails rather than returning an empty list.
        let paths = expand_globs(&self.patterns)?;

        let mut table = self.read_file(&paths[0])?;
        for path in &paths[1..] {
            let next = self.read_file(path)?;
            if next.columns() != table.columns() {
                return Err(DatalensError::data_source(
                    "csv",
                    format!(
                        "Column mismatch in '{path}': expected {:?}, found {:?}",
                        table.columns(),
                        next.columns()
                    ),
                ));
            }
            let columns = table.columns().to_vec();
            let mut rows = table.into_rows();
            rows.extend(next.into_rows());
            table = Table::from_parts(columns, rows);
        }
        debug!(
            files = paths.len(),
            rows = table.row_count(),
            columns = table.column_count(),
            "Loaded CSV data"
        );
        Ok(table)
    }

    fn description(&self) -> String {
        format!("CSV source: {}", self.patterns.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::Value;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> String {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        write!(file, "{content}").unwrap();
        path.display().to_string()
    }

    #[tokio::test]
    async fn test_single_file_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "people.csv", "name,age\nalice,30\nbob,\n");
        let table = CsvSource::new(path).fetch().await.unwrap();
        assert_eq!(table.columns(), &["name", "age"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[1][1], Value::Null);
    }

    #[tokio::test]
    async fn test_headerless_columns_are_numbered() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "raw.csv", "1,2\n3,4\n");
        let source = CsvSource::with_options(path, CsvOptions::default().with_header(false));
        let table = source.fetch().await.unwrap();
        assert_eq!(table.columns(), &["column_1", "column_2"]);
        assert_eq!(table.row_count(), 2);
    }

    #[tokio::test]
    async fn test_glob_concatenates_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir, "part-1.csv", "x\n1\n");
        write_file(&dir, "part-2.csv", "x\n2\n");
        let source = CsvSource::from_glob(format!("{}/part-*.csv", dir.path().display()));
        let table = source.fetch().await.unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[tokio::test]
    async fn test_header_mismatch_across_files() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir, "a.csv", "x\n1\n");
        write_file(&dir, "b.csv", "y\n2\n");
        let source = CsvSource::from_glob(format!("{}/*.csv", dir.path().display()));
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, DatalensError::DataSource { .. }));
    }

    #[tokio::test]
    async fn test_custom_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "data.tsv", "a\tb\n1\t2\n");
        let source = CsvSource::with_options(path, CsvOptions::default().with_delimiter(b'\t'));
        let table = source.fetch().await.unwrap();
        assert_eq!(table.columns(), &["a", "b"]);
        assert_eq!(table.rows()[0][0], Value::Text("1".into()));
    }

    #[tokio::test]
    async fn test_missing_file_is_a_source_error() {
        let source = CsvSource::new("/nonexistent/never.csv");
        assert!(matches!(
            source.fetch().await,
            Err(DatalensError::DataSource { .. })
        ));
    }

    #[tokio::test]
    async fn test_schema_reports_inferred_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "typed.csv", "n,s\n1,hello\n2,world\n");
        let schema = CsvSource::new(path).schema().await.unwrap();
        assert_eq!(schema[0].name, "n");
        assert_eq!(schema[0].data_type, crate::core::ColumnType::Numeric);
        assert_eq!(schema[1].data_type, crate::core::ColumnType::Text);
    }
}
