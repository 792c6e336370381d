//! Prelude for commonly used types and traits in datalens-core.

pub use crate::core::{ColumnType, Table, Value};
pub use crate::error::{DatalensError, ErrorContext, Result};
pub use crate::sources::DataSource;
pub use crate::tools::{AnalysisToolkit, ToolkitConfig};
