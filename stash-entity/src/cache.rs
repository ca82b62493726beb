//! Reactive record cache.
//!
//! Holds the ordered snapshot of every record of one entity type. Observers
//! subscribe through a `tokio::sync::watch` receiver; only the owning entity
//! publishes.

use stash_types::Record;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// Immutable, newest-first list of records.
pub type Snapshot = Arc<Vec<Record>>;

/// Subscription handle to an entity's cache.
pub type SnapshotReceiver = watch::Receiver<Snapshot>;

/// Observable snapshot of one entity type.
#[derive(Debug)]
pub struct ReactiveCache {
    tx: watch::Sender<Snapshot>,
    generation: AtomicU64,
}

impl ReactiveCache {
    /// Creates an empty cache that has never been published.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            tx,
            generation: AtomicU64::new(0),
        }
    }

    /// Replaces the snapshot and wakes subscribers.
    pub(crate) fn publish(&self, records: Vec<Record>) -> u64 {
        self.tx.send_replace(Arc::new(records));
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn subscribe(&self) -> SnapshotReceiver {
        self.tx.subscribe()
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.tx.borrow())
    }

    /// How many times the cache has been published.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

impl Default for ReactiveCache {
    fn default() -> Self {
        Self::new()
    }
}
