use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use uuid::Uuid;

use super::store::ChunkStore;

/// Node membership for the storage cluster.
///
/// Each node is an opaque address string owning one [`ChunkStore`]. Chunk
/// reads and writes are routed to the owning node's store; the registry
/// itself never creates stores implicitly.
pub struct ClusterRegistry {
    nodes: DashMap<String, Arc<ChunkStore>>,
}

impl ClusterRegistry {
    pub fn new() -> Self {
        Self {
            nodes: DashMap::new(),
        }
    }

    /// Registers a node with a fresh, empty store. Re-adding an existing
    /// address replaces its store.
    pub fn add_node(&self, address: &str) {
        self.nodes
            .insert(address.to_string(), Arc::new(ChunkStore::new()));
    }

    /// Drops a node from the cluster. Chunks it held are not migrated or
    /// purged; they become unreachable.
    pub fn remove_node(&self, address: &str) {
        self.nodes.remove(address);
    }

    pub fn node(&self, address: &str) -> Option<Arc<ChunkStore>> {
        self.nodes.get(address).map(|entry| entry.value().clone())
    }

    /// Fetches a chunk from a node. `None` covers both an unknown address
    /// and an unknown chunk id; either way the node cannot serve it.
    pub fn get_chunk(&self, address: &str, id: &Uuid) -> Option<Bytes> {
        self.node(address)?.get(id)
    }

    /// Stores a chunk on a node. Returns `false` if the address is not
    /// registered; the caller decides how severe that is. No store entry
    /// is created for unknown addresses.
    pub fn set_chunk(&self, address: &str, id: Uuid, payload: Bytes) -> bool {
        match self.node(address) {
            Some(store) => {
                store.set(id, payload);
                true
            }
            None => false,
        }
    }

    /// Stable, ordered snapshot of the current member addresses.
    pub fn node_addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self.nodes.iter().map(|entry| entry.key().clone()).collect();
        addresses.sort();
        addresses
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
