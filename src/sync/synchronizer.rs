//! Full-replace synchronization of records into a table.

use std::sync::Arc;

use crate::config::SyncConfig;
use crate::storage::TableStore;
use crate::types::{Record, TableName};

use super::coerce::coerce_records;
use super::{SyncError, SyncResult};

/// Replaces a table's contents with a new record set.
///
/// A sync is two storage steps, delete-all then insert-all, with no
/// transaction around them:
///
/// - If the delete fails, the table is untouched and [`SyncError::Delete`]
///   is returned.
/// - If an insert fails after the delete succeeded, batches that already
///   went in are deleted again so the table is left empty. The error is
///   [`SyncError::Insert`] with `table_cleared = true`. The previous contents
///   are not restored.
/// - If that cleanup delete fails too, the error carries
///   `cleanup_failed = true` and `table_cleared = false`: the table holds
///   the batches that made it in.
///
/// Syncing the same records twice yields the same table.
#[derive(Clone)]
pub struct TableSynchronizer {
    store: Arc<dyn TableStore>,
    coerce: bool,
    batch_size: usize,
}

impl TableSynchronizer {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self::with_config(store, &SyncConfig::default())
    }

    pub fn with_config(store: Arc<dyn TableStore>, config: &SyncConfig) -> Self {
        Self {
            store,
            coerce: config.coerce_values,
            batch_size: config.batch_size.max(1),
        }
    }

    pub fn store(&self) -> &Arc<dyn TableStore> {
        &self.store
    }

    /// Make `table` hold exactly `records`. Returns the records as written,
    /// after any coercion.
    pub async fn sync(
        &self,
        table: &TableName,
        mut records: Vec<Record>,
    ) -> SyncResult<Vec<Record>> {
        if self.coerce {
            coerce_records(&mut records);
        }

        self.store
            .delete_all(table)
            .await
            .map_err(|source| SyncError::Delete {
                table: table.clone(),
                source,
            })?;

        let batch_size = if self.store.batched_inserts() {
            self.batch_size
        } else {
            records.len().max(1)
        };

        for (batch, chunk) in records.chunks(batch_size).enumerate() {
            if let Err(source) = self.store.insert_many(table, chunk).await {
                let cleanup_failed = batch > 0 && !self.discard_partial(table).await;
                return Err(SyncError::Insert {
                    table: table.clone(),
                    table_cleared: !cleanup_failed,
                    cleanup_failed,
                    source,
                });
            }
            crate::debug_event!("sync", "batch", "{table} #{batch}: {} rows", chunk.len());
        }

        crate::log_event!(
            "sync",
            "replaced",
            "{table}: {} rows via {}",
            records.len(),
            self.store.name()
        );
        Ok(records)
    }

    /// Delete the batches a failed sync already inserted. Returns whether the
    /// table is empty again.
    async fn discard_partial(&self, table: &TableName) -> bool {
        match self.store.delete_all(table).await {
            Ok(()) => {
                crate::debug_event!("sync", "discarded", "partial rows of {table}");
                true
            }
            Err(e) => {
                tracing::warn!("[sync] cannot discard partial rows of {table}: {e}");
                false
            }
        }
    }

    /// Remove every row from `table`.
    pub async fn clear(&self, table: &TableName) -> SyncResult<()> {
        self.store
            .delete_all(table)
            .await
            .map_err(|source| SyncError::Delete {
                table: table.clone(),
                source,
            })?;
        crate::log_event!("sync", "cleared", "{table}");
        Ok(())
    }
}
