//! Storage Cluster Module
//!
//! Models the set of storage nodes and the per-node chunk stores.
//!
//! ## Core Concepts
//! - **ChunkStore**: an isolated in-memory key-value store mapping chunk ids to payloads.
//! - **ClusterRegistry**: node membership keyed by address; routes chunk reads and writes
//!   to the owning node's store.
//! - **Membership**: nodes can be added and removed at runtime. Removing a node does not
//!   migrate or purge its chunks; anything it held becomes unreachable.

pub mod registry;
pub mod store;
