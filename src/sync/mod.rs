//! Table synchronization.
//!
//! [`TableSynchronizer`] replaces a table's contents with a record set;
//! [`SyncPipeline`] drives a file through parse, sync and notification.

mod coerce;
mod error;
mod pipeline;
mod synchronizer;

pub use coerce::{coerce_records, coerce_value};
pub use error::{SyncError, SyncResult};
pub use pipeline::{SyncOutcome, SyncPipeline};
pub use synchronizer::TableSynchronizer;
