//! Error types for table synchronization.

use std::path::PathBuf;
use thiserror::Error;

use crate::parsing::ParseError;
use crate::storage::StorageError;
use crate::types::TableName;

/// Errors from syncing records into a table.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to clear table '{table}': {source}")]
    Delete {
        table: TableName,
        #[source]
        source: StorageError,
    },

    /// `table_cleared` is true when the table was left empty rather than
    /// unchanged. `cleanup_failed` is true when rows from earlier batches
    /// could not be deleted again, so the table is partially filled.
    #[error(
        "Failed to insert into table '{table}' (table cleared: {table_cleared}, cleanup failed: {cleanup_failed}): {source}"
    )]
    Insert {
        table: TableName,
        table_cleared: bool,
        cleanup_failed: bool,
        #[source]
        source: StorageError,
    },

    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("Not a data file: {path}")]
    UnsupportedFile { path: PathBuf },
}

impl SyncError {
    /// The table was emptied by a sync that then failed.
    pub fn left_table_empty(&self) -> bool {
        matches!(
            self,
            SyncError::Insert {
                table_cleared: true,
                ..
            }
        )
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
