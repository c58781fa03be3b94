//! Table store persisting each table as a JSON file in a directory.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::types::{Record, TableName};

use super::{StorageError, StorageResult, TableStore};

/// Local table store: `<root>/<table>.json`, one pretty-printed array per
/// table.
///
/// Writes go through a temporary file in the same directory and are renamed
/// into place, so readers never observe a half-written table. Values keep
/// their exact variant (see [`crate::Value`]'s serde form).
#[derive(Debug, Clone)]
pub struct LocalTableStore {
    root: PathBuf,
    /// Serializes read-modify-write cycles across tasks.
    write_lock: Arc<Mutex<()>>,
}

impl LocalTableStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn table_path(&self, table: &TableName) -> PathBuf {
        self.root.join(format!("{table}.json"))
    }

    async fn blocking<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> StorageResult<T> + Send + 'static,
    {
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| StorageError::Unavailable(format!("storage task failed: {e}")))?
    }
}

fn read_table(path: &Path) -> StorageResult<Vec<Record>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

fn write_table(root: &Path, path: &Path, rows: &[Record]) -> StorageResult<()> {
    std::fs::create_dir_all(root)?;
    let mut temp = tempfile::NamedTempFile::new_in(root)?;
    serde_json::to_writer_pretty(&mut temp, rows)?;
    temp.flush()?;
    temp.persist(path).map_err(|e| StorageError::Io(e.error))?;
    Ok(())
}

#[async_trait]
impl TableStore for LocalTableStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn select_all(&self, table: &TableName) -> StorageResult<Vec<Record>> {
        let path = self.table_path(table);
        self.blocking(move || read_table(&path)).await
    }

    async fn delete_all(&self, table: &TableName) -> StorageResult<()> {
        let path = self.table_path(table);
        let lock = Arc::clone(&self.write_lock);
        self.blocking(move || {
            let _guard = lock.lock();
            match std::fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    /// Reads and rewrites the whole table file, so each call costs the
    /// table's full size.
    async fn insert_many(&self, table: &TableName, records: &[Record]) -> StorageResult<()> {
        let root = self.root.clone();
        let path = self.table_path(table);
        let lock = Arc::clone(&self.write_lock);
        let records = records.to_vec();
        self.blocking(move || {
            let _guard = lock.lock();
            let mut rows = read_table(&path)?;
            rows.extend(records);
            write_table(&root, &path, &rows)
        })
        .await
    }

    fn batched_inserts(&self) -> bool {
        false
    }
}
