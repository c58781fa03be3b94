//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module.

pub mod export;
pub mod init;
pub mod sync;
pub mod watch;

use std::sync::Arc;

use anyhow::Context;

use crate::config::Settings;
use crate::notifications::ChangeNotifier;
use crate::storage::{TableStore, open_store};
use crate::sync::{SyncPipeline, TableSynchronizer};

/// Open the configured table store.
pub fn store_from(settings: &Settings) -> anyhow::Result<Arc<dyn TableStore>> {
    let storage = settings.storage();
    open_store(&storage)
        .with_context(|| format!("failed to open the {:?} table store", storage.backend))
}

/// Store, synchronizer and notifier wired into a pipeline.
pub fn pipeline_from(settings: &Settings) -> anyhow::Result<Arc<SyncPipeline>> {
    let synchronizer = TableSynchronizer::with_config(store_from(settings)?, &settings.sync);
    Ok(Arc::new(SyncPipeline::new(
        synchronizer,
        Arc::new(ChangeNotifier::new()),
    )))
}
