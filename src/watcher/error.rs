//! Error types for the data directory watcher.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop the watcher. Per-file failures never surface here; they
/// are logged and published as `Failed` change events.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("Cannot watch path {path}: {reason}")]
    PathWatchFailed { path: PathBuf, reason: String },

    #[error("File system event error: {details}")]
    EventError { details: String },

    #[error("Event channel closed unexpectedly")]
    ChannelClosed,
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::InitFailed {
            reason: e.to_string(),
        }
    }
}
