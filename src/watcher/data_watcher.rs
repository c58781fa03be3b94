//! Watches a data directory and feeds changed files through the pipeline.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{Duration, MissedTickBehavior};
use walkdir::WalkDir;

use crate::config::WatcherConfig;
use crate::sync::{SyncError, SyncPipeline};

use super::debouncer::Debouncer;
use super::error::WatchError;
use super::watched_file::{Fingerprint, WatchedFile, is_hidden};

/// File watcher for one data directory.
///
/// A single task owns the notify channel, the debouncer and the tracked
/// files, so events are handled one at a time in arrival order:
///
/// - create/modify events are debounced per path, then the file is read,
///   fingerprinted and synced unless its contents match the last
///   successful sync
/// - remove events cancel any pending change and clear the table at once
///
/// A file that fails to parse or sync is logged and reported as a `Failed`
/// event; the loop carries on with other files.
pub struct DataWatcher {
    root: PathBuf,
    pipeline: Arc<SyncPipeline>,
    debouncer: Debouncer,
    files: HashMap<PathBuf, WatchedFile>,
    event_rx: mpsc::Receiver<notify::Result<Event>>,
    watcher: notify::RecommendedWatcher,
    tick: Duration,
    initial_scan: bool,
    recursive: bool,
}

impl DataWatcher {
    pub fn builder() -> DataWatcherBuilder {
        DataWatcherBuilder::new()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files seen so far, keyed by path.
    pub fn files(&self) -> &HashMap<PathBuf, WatchedFile> {
        &self.files
    }

    pub fn pending_count(&self) -> usize {
        self.debouncer.pending_count()
    }

    /// Run until the process is killed.
    pub async fn watch(self) -> Result<(), WatchError> {
        self.watch_until(std::future::pending()).await
    }

    /// Run until `shutdown` completes. Changes still waiting out their
    /// debounce window at shutdown are dropped.
    pub async fn watch_until<F>(mut self, shutdown: F) -> Result<(), WatchError>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;
        tokio::pin!(shutdown);

        let mut tick = tokio::time::interval(self.tick);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    crate::log_event!("watcher", "stopped");
                    return Ok(());
                }

                res = self.event_rx.recv() => match res {
                    Some(Ok(event)) => self.handle_event(event).await,
                    Some(Err(e)) => {
                        let err = WatchError::EventError { details: e.to_string() };
                        tracing::error!("[watcher] {err}");
                    }
                    None => return Err(WatchError::ChannelClosed),
                },

                _ = tick.tick() => self.flush_ready().await,
            }
        }
    }

    /// Begin watching the root, then process files already present.
    pub async fn start(&mut self) -> Result<(), WatchError> {
        let mode = if self.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        self.watcher
            .watch(&self.root, mode)
            .map_err(|e| WatchError::PathWatchFailed {
                path: self.root.clone(),
                reason: e.to_string(),
            })?;
        crate::log_event!("watcher", "watching", "{}", self.root.display());

        if self.initial_scan {
            self.scan().await;
        }
        Ok(())
    }

    /// Process every recognized file under the root once.
    pub async fn scan(&mut self) {
        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let paths: Vec<PathBuf> = WalkDir::new(&self.root)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
            })
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("[watcher] scan error: {e}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| self.accepts(path))
            .collect();

        crate::log_event!("watcher", "initial scan", "{} files", paths.len());
        for path in paths {
            self.process_change(&path).await;
        }
    }

    /// Route one notify event. Changes are debounced; removals run now.
    pub async fn handle_event(&mut self, event: Event) {
        for path in event.paths {
            if !self.accepts(&path) {
                crate::debug_event!(
                    "watcher",
                    "ignored",
                    "{:?} {}",
                    event.kind,
                    path.display()
                );
                continue;
            }

            match event.kind {
                EventKind::Create(_) | EventKind::Modify(_) => {
                    self.debouncer.record(path);
                }
                EventKind::Remove(_) => {
                    self.debouncer.remove(&path);
                    self.process_removal(&path).await;
                }
                _ => {}
            }
        }
    }

    /// Process every change whose debounce window has passed.
    pub async fn flush_ready(&mut self) {
        for path in self.debouncer.take_ready() {
            self.process_change(&path).await;
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        WatchedFile::recognize(path).is_some() && !is_hidden(path, &self.root)
    }

    async fn process_change(&mut self, path: &Path) {
        // Renames show up as modify events for a path that is gone
        if !path.exists() {
            self.process_removal(path).await;
            return;
        }

        let Some(recognized) = WatchedFile::recognize(path) else {
            return;
        };
        let file = self
            .files
            .entry(path.to_path_buf())
            .or_insert(recognized);

        let contents = match tokio::fs::read(path).await {
            Ok(contents) => contents,
            Err(source) => {
                let err = SyncError::Read {
                    path: path.to_path_buf(),
                    source,
                };
                self.pipeline.report_failure(file.table.clone(), err);
                return;
            }
        };

        let fingerprint = Fingerprint::of(&contents);
        if file.is_unchanged(&fingerprint) {
            crate::debug_event!("watcher", "unchanged", "{}", path.display());
            return;
        }

        // Failures are logged and published by the pipeline; keeping the old
        // fingerprint lets a re-save of the same bytes retry.
        let synced = self
            .pipeline
            .sync_contents_as(path, file.table.clone(), &contents)
            .await;
        if synced.is_ok() {
            file.fingerprint = Some(fingerprint);
        }
    }

    async fn process_removal(&mut self, path: &Path) {
        let Some(file) = self
            .files
            .remove(path)
            .or_else(|| WatchedFile::recognize(path))
        else {
            tracing::warn!("[watcher] removed file maps to no table: {}", path.display());
            return;
        };
        // Failures are logged and published by the pipeline
        let _ = self.pipeline.clear_table(&file.table).await;
    }
}

/// Builder for [`DataWatcher`].
pub struct DataWatcherBuilder {
    root: Option<PathBuf>,
    pipeline: Option<Arc<SyncPipeline>>,
    config: WatcherConfig,
}

impl DataWatcherBuilder {
    pub fn new() -> Self {
        Self {
            root: None,
            pipeline: None,
            config: WatcherConfig::default(),
        }
    }

    /// Directory to watch. Required.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Pipeline that processes changed files. Required.
    pub fn pipeline(mut self, pipeline: Arc<SyncPipeline>) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Take debounce, tick, scan and recursion settings from config.
    pub fn config(mut self, config: &WatcherConfig) -> Self {
        self.config = config.clone();
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.config.debounce_ms = ms;
        self
    }

    pub fn tick_ms(mut self, ms: u64) -> Self {
        self.config.tick_ms = ms;
        self
    }

    pub fn initial_scan(mut self, enabled: bool) -> Self {
        self.config.initial_scan = enabled;
        self
    }

    pub fn recursive(mut self, enabled: bool) -> Self {
        self.config.recursive = enabled;
        self
    }

    pub fn build(self) -> Result<DataWatcher, WatchError> {
        let root = self.root.ok_or_else(|| WatchError::InitFailed {
            reason: "Watch root is required".to_string(),
        })?;
        let pipeline = self.pipeline.ok_or_else(|| WatchError::InitFailed {
            reason: "Sync pipeline is required".to_string(),
        })?;

        // notify reports canonical paths
        let root = root
            .canonicalize()
            .map_err(|e| WatchError::PathWatchFailed {
                path: root.clone(),
                reason: e.to_string(),
            })?;
        if !root.is_dir() {
            return Err(WatchError::PathWatchFailed {
                path: root,
                reason: "not a directory".to_string(),
            });
        }

        let (tx, rx) = mpsc::channel(100);
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        })?;

        Ok(DataWatcher {
            root,
            pipeline,
            debouncer: Debouncer::new(self.config.debounce_ms),
            files: HashMap::new(),
            event_rx: rx,
            watcher,
            tick: Duration::from_millis(self.config.tick_ms.max(1)),
            initial_scan: self.config.initial_scan,
            recursive: self.config.recursive,
        })
    }
}

impl Default for DataWatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
