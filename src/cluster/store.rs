use bytes::Bytes;
use dashmap::DashMap;
use uuid::Uuid;

/// In-memory chunk storage for a single node.
///
/// Chunks are immutable once stored; `set` on an existing id overwrites.
/// `DashMap` gives shard-level locking, so operations on distinct ids do
/// not serialize against each other.
pub struct ChunkStore {
    chunks: DashMap<Uuid, Bytes>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self {
            chunks: DashMap::new(),
        }
    }

    pub fn set(&self, id: Uuid, payload: Bytes) {
        self.chunks.insert(id, payload);
    }

    pub fn get(&self, id: &Uuid) -> Option<Bytes> {
        self.chunks.get(id).map(|entry| entry.value().clone())
    }

    /// Removes a chunk. No-op if the id is absent.
    pub fn delete(&self, id: &Uuid) {
        self.chunks.remove(id);
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Snapshot of everything this node currently holds.
    pub fn dump(&self) -> Vec<(Uuid, Bytes)> {
        self.chunks
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }
}
