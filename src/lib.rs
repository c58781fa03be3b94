//! Mirror spreadsheet, CSV and JSON files into database tables.
//!
//! A [`watcher::DataWatcher`] observes a data directory. Every added or
//! changed file is parsed into records ([`parsing`]), written over the table
//! named after the file ([`sync`]), and announced to subscribers
//! ([`notifications`]). Tables can be exported back to files ([`export`]).
//! Storage backends sit behind [`storage::TableStore`].

pub mod cli;
pub mod config;
pub mod export;
pub mod logging;
pub mod notifications;
pub mod parsing;
pub mod storage;
pub mod sync;
pub mod types;
pub mod watcher;

pub use config::Settings;
pub use export::{ExportError, ExportWriter, ExportedFile};
pub use notifications::{ChangeEvent, ChangeKind, ChangeNotifier, SubscriptionId};
pub use parsing::{ParseError, ParserFactory, RecordParser};
pub use storage::{StorageError, TableStore};
pub use sync::{SyncError, SyncPipeline, TableSynchronizer};
pub use types::{FileFormat, Record, TableName, Value};
pub use watcher::{DataWatcher, WatchError};
