//! Change notification for synced tables.
//!
//! A process-wide registry of callbacks. Events are delivered synchronously,
//! in emission order, on the task that emits them. A panicking subscriber is
//! contained and logged; the remaining subscribers still receive the event.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::types::{Record, TableName};

/// What happened to a table.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeKind {
    /// First sync of a newly seen file.
    Added,
    /// Re-sync after the file changed.
    Changed,
    /// The file was removed and the table cleared.
    Deleted,
    /// Parsing or syncing failed; the table may have been left empty.
    Failed { reason: String },
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Changed => "changed",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Failed { .. } => "failed",
        }
    }
}

/// A change to one table.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub table: TableName,
    pub kind: ChangeKind,
    /// The records now in the table, for `Added` and `Changed`.
    pub data: Option<Vec<Record>>,
}

impl ChangeEvent {
    pub fn added(table: TableName, records: Vec<Record>) -> Self {
        Self {
            table,
            kind: ChangeKind::Added,
            data: Some(records),
        }
    }

    pub fn changed(table: TableName, records: Vec<Record>) -> Self {
        Self {
            table,
            kind: ChangeKind::Changed,
            data: Some(records),
        }
    }

    pub fn deleted(table: TableName) -> Self {
        Self {
            table,
            kind: ChangeKind::Deleted,
            data: None,
        }
    }

    pub fn failed(table: TableName, reason: impl Into<String>) -> Self {
        Self {
            table,
            kind: ChangeKind::Failed {
                reason: reason.into(),
            },
            data: None,
        }
    }
}

/// Handle returned by [`ChangeNotifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Subscribe/unsubscribe registry delivering [`ChangeEvent`]s.
#[derive(Default)]
pub struct ChangeNotifier {
    next_id: AtomicU64,
    subscribers: RwLock<Vec<(SubscriptionId, Callback)>>,
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for every future event.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push((id, Arc::new(callback)));
        id
    }

    /// Forward every future event into an unbounded channel.
    ///
    /// For async consumers (e.g. a network fan-out). The subscription stays
    /// registered until `unsubscribe` is called; events sent after the
    /// receiver is dropped are discarded.
    pub fn subscribe_channel(&self) -> (SubscriptionId, mpsc::UnboundedReceiver<ChangeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.subscribe(move |event| {
            let _ = tx.send(event.clone());
        });
        (id, rx)
    }

    /// Remove a callback. Returns `false` if it was already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Deliver an event to every subscriber. Returns how many callbacks
    /// completed without panicking.
    pub fn emit(&self, event: &ChangeEvent) -> usize {
        // Snapshot so callbacks may (un)subscribe without deadlocking
        let callbacks: Vec<Callback> = self
            .subscribers
            .read()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        let mut delivered = 0;
        for callback in callbacks {
            match catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    tracing::error!(
                        "[notify] subscriber panicked on {} event for {}",
                        event.kind.as_str(),
                        event.table
                    );
                }
            }
        }

        crate::debug_event!(
            "notify",
            "emitted",
            "{} {} to {delivered} subscribers",
            event.kind.as_str(),
            event.table
        );
        delivered
    }
}
