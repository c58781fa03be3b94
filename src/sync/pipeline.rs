//! File-to-table pipeline: read, parse, sync, notify.
//!
//! Shared by the watcher and the one-shot `sync`/`clear` commands. Every
//! outcome that concerns a known table is published on the notifier,
//! failures included.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::notifications::{ChangeEvent, ChangeKind, ChangeNotifier};
use crate::parsing::ParserFactory;
use crate::types::{FileFormat, TableName};

use super::{SyncError, SyncResult, TableSynchronizer};

/// Result of a successful file sync.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    pub table: TableName,
    /// `Added` the first time this pipeline syncs the table, `Changed` after.
    pub kind: ChangeKind,
    pub rows: usize,
}

pub struct SyncPipeline {
    parsers: ParserFactory,
    synchronizer: TableSynchronizer,
    notifier: Arc<ChangeNotifier>,
    synced: Mutex<HashSet<TableName>>,
}

impl SyncPipeline {
    pub fn new(synchronizer: TableSynchronizer, notifier: Arc<ChangeNotifier>) -> Self {
        Self {
            parsers: ParserFactory::new(),
            synchronizer,
            notifier,
            synced: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_parsers(mut self, parsers: ParserFactory) -> Self {
        self.parsers = parsers;
        self
    }

    pub fn notifier(&self) -> &Arc<ChangeNotifier> {
        &self.notifier
    }

    pub fn synchronizer(&self) -> &TableSynchronizer {
        &self.synchronizer
    }

    /// Read `path` and sync it into the table named after its file stem.
    pub async fn sync_file(&self, path: &Path) -> SyncResult<SyncOutcome> {
        let table = table_for(path)?;
        self.sync_file_as(path, table).await
    }

    /// Read `path` and sync it into `table`.
    pub async fn sync_file_as(&self, path: &Path, table: TableName) -> SyncResult<SyncOutcome> {
        let contents = match tokio::fs::read(path).await {
            Ok(contents) => contents,
            Err(source) => {
                let err = SyncError::Read {
                    path: path.to_path_buf(),
                    source,
                };
                return Err(self.report_failure(table, err));
            }
        };
        self.sync_contents_as(path, table, &contents).await
    }

    /// Sync already-read contents of `path` into the table named after it.
    pub async fn sync_contents(&self, path: &Path, contents: &[u8]) -> SyncResult<SyncOutcome> {
        let table = table_for(path)?;
        self.sync_contents_as(path, table, contents).await
    }

    /// Sync already-read contents of `path` into `table`.
    pub async fn sync_contents_as(
        &self,
        path: &Path,
        table: TableName,
        contents: &[u8],
    ) -> SyncResult<SyncOutcome> {
        let format = FileFormat::from_path(path).ok_or_else(|| SyncError::UnsupportedFile {
            path: path.to_path_buf(),
        })?;

        let records = match self.parsers.parse(format, contents) {
            Ok(records) => records,
            Err(source) => {
                let err = SyncError::Parse {
                    path: path.to_path_buf(),
                    source,
                };
                return Err(self.report_failure(table, err));
            }
        };

        let written = match self.synchronizer.sync(&table, records).await {
            Ok(written) => written,
            Err(err) => return Err(self.report_failure(table, err)),
        };

        let first_sync = self.synced.lock().insert(table.clone());
        let rows = written.len();
        let event = if first_sync {
            ChangeEvent::added(table.clone(), written)
        } else {
            ChangeEvent::changed(table.clone(), written)
        };
        let kind = event.kind.clone();
        self.notifier.emit(&event);

        crate::log_event!(
            "pipeline",
            kind.as_str(),
            "{} -> {table} ({rows} rows)",
            path.display()
        );
        Ok(SyncOutcome { table, kind, rows })
    }

    /// Clear the table fed by a removed file.
    pub async fn remove_file(&self, path: &Path) -> SyncResult<TableName> {
        let table = table_for(path)?;
        self.clear_table(&table).await?;
        Ok(table)
    }

    /// Clear `table` and publish a `Deleted` event.
    pub async fn clear_table(&self, table: &TableName) -> SyncResult<()> {
        if let Err(err) = self.synchronizer.clear(table).await {
            return Err(self.report_failure(table.clone(), err));
        }
        self.synced.lock().remove(table);
        self.notifier.emit(&ChangeEvent::deleted(table.clone()));
        Ok(())
    }

    /// Log `err`, publish a `Failed` event for `table`, and hand the error back.
    pub fn report_failure(&self, table: TableName, err: SyncError) -> SyncError {
        tracing::warn!("[pipeline] {table}: {err}");
        self.notifier.emit(&ChangeEvent::failed(table, err.to_string()));
        err
    }
}

fn table_for(path: &Path) -> SyncResult<TableName> {
    if FileFormat::from_path(path).is_none() {
        return Err(SyncError::UnsupportedFile {
            path: path.to_path_buf(),
        });
    }
    TableName::from_path(path).ok_or_else(|| SyncError::UnsupportedFile {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryTableStore, TableStore};
    use crate::types::{Record, Value};
    use tempfile::TempDir;

    fn pipeline() -> (SyncPipeline, Arc<MemoryTableStore>) {
        let store = Arc::new(MemoryTableStore::new());
        let pipeline = SyncPipeline::new(
            TableSynchronizer::new(store.clone()),
            Arc::new(ChangeNotifier::new()),
        );
        (pipeline, store)
    }

    #[tokio::test]
    async fn test_added_then_changed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("equipment.csv");
        let (pipeline, store) = pipeline();
        let (_id, mut events) = pipeline.notifier().subscribe_channel();

        std::fs::write(&path, "name,serial\nPump1,SN001\n").unwrap();
        let outcome = pipeline.sync_file(&path).await.unwrap();
        assert_eq!(outcome.kind, ChangeKind::Added);
        assert_eq!(outcome.rows, 1);

        std::fs::write(&path, "name,serial\nPump1,SN001\nPump2,SN002\n").unwrap();
        let outcome = pipeline.sync_file(&path).await.unwrap();
        assert_eq!(outcome.kind, ChangeKind::Changed);

        let table = TableName::new("equipment").unwrap();
        assert_eq!(store.select_all(&table).await.unwrap().len(), 2);

        let first = events.recv().await.unwrap();
        assert_eq!(first.kind, ChangeKind::Added);
        let second = events.recv().await.unwrap();
        assert_eq!(second.kind, ChangeKind::Changed);
        assert_eq!(second.data.as_ref().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_parse_failure_emits_failed_and_keeps_table() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("equipment.json");
        let (pipeline, store) = pipeline();
        let table = TableName::new("equipment").unwrap();
        store
            .insert_many(
                &table,
                &[Record::from_iter([("name".to_string(), Value::from("Keep"))])],
            )
            .await
            .unwrap();
        let (_id, mut events) = pipeline.notifier().subscribe_channel();

        std::fs::write(&path, "{\"not\": \"an array\"}").unwrap();
        let err = pipeline.sync_file(&path).await.unwrap_err();

        assert!(matches!(err, SyncError::Parse { .. }));
        assert_eq!(store.select_all(&table).await.unwrap().len(), 1);
        let event = events.recv().await.unwrap();
        assert!(matches!(event.kind, ChangeKind::Failed { .. }));
    }

    #[tokio::test]
    async fn test_unsupported_file() {
        let (pipeline, _store) = pipeline();
        let err = pipeline
            .sync_contents(Path::new("notes.txt"), b"hello")
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::UnsupportedFile { .. }));
    }

    #[tokio::test]
    async fn test_sync_file_as_overrides_table() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("export_2024.csv");
        std::fs::write(&path, "a\n1\n").unwrap();
        let (pipeline, store) = pipeline();

        let table = TableName::new("readings").unwrap();
        pipeline.sync_file_as(&path, table.clone()).await.unwrap();

        assert_eq!(store.select_all(&table).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_file_clears_and_emits_deleted() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("equipment.csv");
        std::fs::write(&path, "name\nPump1\n").unwrap();
        let (pipeline, store) = pipeline();
        pipeline.sync_file(&path).await.unwrap();
        let (_id, mut events) = pipeline.notifier().subscribe_channel();

        std::fs::remove_file(&path).unwrap();
        let table = pipeline.remove_file(&path).await.unwrap();

        assert!(store.select_all(&table).await.unwrap().is_empty());
        let event = events.recv().await.unwrap();
        assert_eq!(event.kind, ChangeKind::Deleted);
        assert_eq!(event.table, table);

        // Re-adding after a delete is an add again
        std::fs::write(&path, "name\nPump1\n").unwrap();
        let outcome = pipeline.sync_file(&path).await.unwrap();
        assert_eq!(outcome.kind, ChangeKind::Added);
    }

    #[tokio::test]
    async fn test_failed_event_carries_reason() {
        let (pipeline, _store) = pipeline();
        let (_id, mut events) = pipeline.notifier().subscribe_channel();

        let _ = pipeline
            .sync_contents(Path::new("bad.json"), b"[1, 2]")
            .await;

        let event = events.recv().await.unwrap();
        let ChangeKind::Failed { reason } = event.kind else {
            panic!("expected a failed event");
        };
        assert!(reason.contains("bad.json"));
        assert!(reason.contains("element 0"));
    }
}
