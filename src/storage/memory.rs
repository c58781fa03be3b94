//! In-process table store.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::types::{Record, TableName};

use super::{StorageResult, TableStore};

/// Table store keeping every table in memory.
///
/// Useful for tests and for embedding the pipeline in a process that owns
/// its own persistence.
#[derive(Debug, Default)]
pub struct MemoryTableStore {
    tables: RwLock<HashMap<TableName, Vec<Record>>>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of all tables that currently hold at least one row.
    pub fn table_names(&self) -> Vec<TableName> {
        let tables = self.tables.read();
        let mut names: Vec<TableName> = tables
            .iter()
            .filter(|(_, rows)| !rows.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Number of rows in a table (0 for unknown tables).
    pub fn row_count(&self, table: &TableName) -> usize {
        self.tables.read().get(table).map(Vec::len).unwrap_or(0)
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn select_all(&self, table: &TableName) -> StorageResult<Vec<Record>> {
        Ok(self.tables.read().get(table).cloned().unwrap_or_default())
    }

    async fn delete_all(&self, table: &TableName) -> StorageResult<()> {
        self.tables.write().remove(table);
        Ok(())
    }

    async fn insert_many(&self, table: &TableName, records: &[Record]) -> StorageResult<()> {
        self.tables
            .write()
            .entry(table.clone())
            .or_default()
            .extend_from_slice(records);
        Ok(())
    }
}
