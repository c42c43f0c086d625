//! Snapshot storage that keeps the persisted snapshot in memory.

use async_trait::async_trait;
use mea::rwlock::RwLock;
use serde_json::Value;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use docrest_core::{
    error::DocumentStoreResult,
    snapshot::{Snapshot, SnapshotCodec, SnapshotStorage},
};

/// In-memory [`SnapshotStorage`].
///
/// Loads a seed snapshot and keeps a copy of the latest flushed one. Clones share the
/// same state, so a test can keep a handle and inspect what the store persisted.
#[derive(Default, Clone, Debug)]
pub struct MemorySnapshot {
    persisted: Arc<RwLock<Snapshot>>,
    flushes: Arc<AtomicUsize>,
}

impl MemorySnapshot {
    /// Creates a storage whose initial snapshot is `seed`.
    pub fn new(seed: Snapshot) -> Self {
        Self {
            persisted: Arc::new(RwLock::new(seed)),
            flushes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Creates a storage seeded from snapshot JSON, parsing the default date fields.
    pub fn from_json(value: Value) -> DocumentStoreResult<Self> {
        Ok(Self::new(SnapshotCodec::default().decode(value)?))
    }

    /// Returns a copy of the last persisted snapshot.
    pub async fn persisted(&self) -> Snapshot {
        self.persisted
            .read()
            .await
            .clone()
    }

    /// Number of flushes performed so far.
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotStorage for MemorySnapshot {
    async fn load(&self) -> DocumentStoreResult<Snapshot> {
        Ok(self.persisted().await)
    }

    async fn flush(&self, snapshot: &Snapshot) -> DocumentStoreResult<()> {
        *self.persisted.write().await = snapshot.clone();
        self.flushes.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }
}
