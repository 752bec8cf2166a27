//! In-memory output table for testing and development.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::error::{TableError, TableResult};
use crate::traits::table::ResultTable;
use crate::types::row::OutputRow;

/// In-memory output table.
///
/// Useful for testing and development. Not suitable for production
/// as data is lost on restart.
#[derive(Default)]
pub struct MemoryTable {
    rows: RwLock<Vec<OutputRow>>,
    read_only: AtomicBool,
}

impl MemoryTable {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table pre-filled with rows.
    pub fn with_rows(rows: impl IntoIterator<Item = OutputRow>) -> Self {
        Self {
            rows: RwLock::new(rows.into_iter().collect()),
            read_only: AtomicBool::new(false),
        }
    }

    /// Make further appends fail, as an unwritable destination would.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Snapshot of stored rows.
    pub fn rows(&self) -> Vec<OutputRow> {
        self.rows.read().unwrap().clone()
    }

    /// Clear all stored rows.
    pub fn clear(&self) {
        self.rows.write().unwrap().clear();
    }
}

#[async_trait]
impl ResultTable for MemoryTable {
    async fn append(&self, row: &OutputRow) -> TableResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(TableError::Io {
                path: PathBuf::from("<memory>"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "table is read-only"),
            });
        }
        self.rows.write().unwrap().push(row.clone());
        Ok(())
    }

    async fn processed_titles(&self) -> TableResult<HashSet<String>> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .iter()
            .map(|r| r.title.clone())
            .collect())
    }

    async fn row_count(&self) -> TableResult<usize> {
        Ok(self.rows.read().unwrap().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_and_titles() {
        let table = MemoryTable::new();
        table.append(&OutputRow::new("a")).await.unwrap();
        table.append(&OutputRow::new("b")).await.unwrap();

        assert_eq!(table.row_count().await.unwrap(), 2);
        assert!(table.processed_titles().await.unwrap().contains("b"));
    }

    #[tokio::test]
    async fn test_read_only_rejects_append() {
        let table = MemoryTable::new();
        table.set_read_only(true);
        assert!(table.append(&OutputRow::new("a")).await.is_err());
        assert!(table.rows().is_empty());
    }
}
