//! Data source connectors.
//!
//! A [`DataSource`] produces a [`Table`] on demand; the analysis toolkit
//! never cares where the rows came from. File-backed sources support glob
//! patterns; in-memory sources wrap an existing table for tests and
//! embedding applications.

use crate::core::inference;
use crate::core::table::Table;
use crate::error::{DatalensError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::Path;

mod csv;
mod memory;

pub use csv::{CsvOptions, CsvSource};
pub use memory::MemorySource;

/// The name and inferred type of one column, as reported by a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: inference::ColumnType,
}

/// A source of tabular data.
///
/// # Examples
///
/// ```rust,ignore
/// use datalens_core::sources::{CsvSource, DataSource};
///
/// # async fn example() -> datalens_core::Result<()> {
/// let source = CsvSource::new("data/users.csv");
/// let table = source.fetch().await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait DataSource: Debug + Send + Sync {
    /// Materializes the full result table.
    async fn fetch(&self) -> Result<Table>;

    /// Returns the column names and inferred types.
    ///
    /// The default implementation fetches the data and runs inference on it;
    /// sources with a cheaper way to answer should override it.
    async fn schema(&self) -> Result<Vec<ColumnSchema>> {
        let table = self.fetch().await?;
        let types = inference::infer_types(&table);
        Ok(table
            .columns()
            .iter()
            .zip(types)
            .map(|(name, data_type)| ColumnSchema {
                name: name.clone(),
                data_type,
            })
            .collect())
    }

    /// Returns a human-readable description of this data source.
    fn description(&self) -> String;
}

/// Expands glob patterns into concrete file paths.
///
/// Fails on an invalid pattern or when no file matches any pattern.
pub(crate) fn expand_globs(patterns: &[String]) -> Result<Vec<String>> {
    use glob::glob;

    let mut paths = Vec::new();
    for pattern in patterns {
        let matches = glob(pattern).map_err(|e| {
            DatalensError::Configuration(format!("Invalid glob pattern '{pattern}': {e}"))
        })?;

        for entry in matches {
            let path = entry
                .map_err(|e| DatalensError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

            if path.is_file() {
                if let Some(path_str) = path.to_str() {
                    paths.push(path_str.to_string());
                }
            }
        }
    }

    if paths.is_empty() {
        return Err(DatalensError::DataSource {
            source_type: "file".to_string(),
            message: "No files found matching glob patterns".to_string(),
            source: None,
        });
    }

    Ok(paths)
}

/// Lists the CSV datasets in a directory, sorted by file stem.
pub fn list_datasets(dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}
