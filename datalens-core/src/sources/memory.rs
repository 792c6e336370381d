//! In-memory data source.

use crate::core::table::Table;
use crate::error::Result;
use crate::sources::DataSource;
use async_trait::async_trait;

/// A data source wrapping a table already held in memory.
///
/// Useful for tests and for embedding applications that assemble rows
/// themselves before handing them to the toolkit.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    table: Table,
}

impl MemorySource {
    /// Wraps a table under a descriptive name.
    pub fn new(name: impl Into<String>, table: Table) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }

    /// The wrapped table, without going through the async trait.
    pub fn table(&self) -> &Table {
        &self.table
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch(&self) -> Result<Table> {
        Ok(self.table.clone())
    }

    fn description(&self) -> String {
        format!("in-memory source '{}'", self.name)
    }
}
