//! Output table trait.
//!
//! The table is append-only. The pipeline driver is its only writer and
//! appends one row at a time.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::TableResult;
use crate::types::row::OutputRow;

/// Persistent destination for output rows.
#[async_trait]
pub trait ResultTable: Send + Sync {
    /// Append a row. Returns only once the row is durable.
    async fn append(&self, row: &OutputRow) -> TableResult<()>;

    /// Titles of rows already in the table.
    async fn processed_titles(&self) -> TableResult<HashSet<String>>;

    /// Number of rows in the table.
    async fn row_count(&self) -> TableResult<usize> {
        Ok(self.processed_titles().await?.len())
    }
}
