//! Table storage backends.
//!
//! The synchronizer and the export writer only ever see the [`TableStore`]
//! capability set; concrete backends are picked from configuration by
//! [`open_store`].

mod error;
mod local;
mod memory;
mod postgrest;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{StorageBackend, StorageConfig};
use crate::types::{Record, TableName};

pub use error::{StorageError, StorageResult};
pub use local::LocalTableStore;
pub use memory::MemoryTableStore;
pub use postgrest::{PostgrestConfig, PostgrestTableStore};

/// The operations a table backend must provide.
///
/// Implementations must be safe to share between tasks. Reading an unknown
/// table returns no rows rather than an error.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Every row of the table, however many there are.
    async fn select_all(&self, table: &TableName) -> StorageResult<Vec<Record>>;

    /// Remove every row of the table.
    async fn delete_all(&self, table: &TableName) -> StorageResult<()>;

    /// Append rows to the table.
    async fn insert_many(&self, table: &TableName, records: &[Record]) -> StorageResult<()>;

    /// Whether a large insert should be split into batches. Backends whose
    /// insert rewrites the whole table return `false` and get every row in
    /// one call.
    fn batched_inserts(&self) -> bool {
        true
    }
}

/// Build the configured table store.
pub fn open_store(config: &StorageConfig) -> StorageResult<Arc<dyn TableStore>> {
    let store: Arc<dyn TableStore> = match config.backend {
        StorageBackend::Memory => Arc::new(MemoryTableStore::new()),
        StorageBackend::Local => Arc::new(LocalTableStore::new(config.local_path.clone())),
        StorageBackend::Postgrest => {
            let url = config.resolved_url().ok_or_else(|| {
                StorageError::Config("postgrest backend needs storage.url or SUPABASE_URL".into())
            })?;
            let api_key = config.resolved_api_key().ok_or_else(|| {
                StorageError::Config(
                    "postgrest backend needs storage.api_key or SUPABASE_KEY".into(),
                )
            })?;
            Arc::new(PostgrestTableStore::new(PostgrestConfig {
                url,
                api_key,
                delete_filter: config.delete_filter.clone(),
                page_size: config.page_size,
                order_by: config.order_by.clone(),
                timeout: std::time::Duration::from_secs(config.timeout_secs),
            })?)
        }
    };

    crate::debug_event!("storage", "opened", "{}", store.name());
    Ok(store)
}
