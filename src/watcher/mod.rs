//! Data directory watching.
//!
//! ```text
//! notify::RecommendedWatcher
//!   -> mpsc channel
//!   -> DataWatcher loop (debouncer, tracked files + fingerprints)
//!   -> SyncPipeline (parse, sync, notify)
//! ```

mod data_watcher;
mod debouncer;
mod error;
mod watched_file;

pub use data_watcher::{DataWatcher, DataWatcherBuilder};
pub use debouncer::Debouncer;
pub use error::WatchError;
pub use watched_file::{Fingerprint, WatchedFile, is_hidden};
