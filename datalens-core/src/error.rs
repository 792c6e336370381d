//! Error types for the datalens analysis engine.
//!
//! This module provides the error handling strategy for the crate using
//! `thiserror`. All errors are represented by the [`DatalensError`] enum.
//!
//! Request mistakes (bad column name, misapplied operator, statistically
//! meaningless request, malformed import) are raised eagerly and name the
//! offending column or operator. Per-cell absence of data is never an error:
//! it is represented as a null value or an absent statistic in the result
//! payload.

use thiserror::Error;

/// The main error type for the datalens library.
#[derive(Error, Debug)]
pub enum DatalensError {
    /// A referenced column is absent from the table's schema.
    #[error("Column '{column}' not found in result")]
    ColumnNotFound {
        /// Name of the missing column
        column: String,
    },

    /// A filter operator was applied to a column whose inferred type does
    /// not support it.
    #[error("Filter error on column '{column}': {message}")]
    Filter {
        /// Column the offending clause targets
        column: String,
        /// What was misapplied and why
        message: String,
    },

    /// An analysis was requested on too little data to be meaningful.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Malformed delimited text during export/import round-trip.
    #[error("Format error: {0}")]
    Format(String),

    /// A collaborator fetch (query execution or file read) failed.
    #[error("Data source error: {message}")]
    DataSource {
        /// Kind of data source (e.g., "csv", "memory", "database")
        source_type: String,
        /// Detailed error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A collaborator fetch did not complete within the configured timeout.
    #[error("Data source '{source_type}' timed out after {elapsed_ms}ms")]
    Timeout {
        /// Description of the source that timed out
        source_type: String,
        /// Milliseconds waited before giving up
        elapsed_ms: u64,
    },

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error when parsing or processing data.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error related to configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, DatalensError>`.
///
/// This is the standard `Result` type used throughout the library.
pub type Result<T> = std::result::Result<T, DatalensError>;

impl DatalensError {
    /// Creates a column-not-found error.
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }

    /// Creates a filter misuse error for the given column.
    pub fn filter(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Filter {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Creates an insufficient-data error.
    pub fn insufficient_data(message: impl Into<String>) -> Self {
        Self::InsufficientData(message.into())
    }

    /// Creates a new data source error.
    pub fn data_source(source_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new data source error with an underlying cause.
    pub fn data_source_with_source(
        source_type: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: Some(source),
        }
    }
}

impl From<csv::Error> for DatalensError {
    fn from(err: csv::Error) -> Self {
        Self::Format(err.to_string())
    }
}

impl From<serde_json::Error> for DatalensError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<DatalensError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| {
            let base_error = e.into();
            DatalensError::Internal(format!("{}: {}", msg, base_error))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let msg = f();
            let base_error = e.into();
            DatalensError::Internal(format!("{}: {}", msg, base_error))
        })
    }
}
