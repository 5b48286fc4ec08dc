use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use uuid::Uuid;

use crate::catalog::memory::MetadataCatalog;
use crate::catalog::types::FileRecord;
use crate::cluster::registry::ClusterRegistry;

/// Maximum payload size of a single chunk. Only the final chunk of a file
/// may be smaller.
pub const DEFAULT_CHUNK_SIZE: usize = 512 * 1024;

/// Cap on the raw upload body, enforced at the HTTP boundary independent
/// of chunking.
pub const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024 + 1024;

/// Upper bound on chunk storage units in flight per upload.
const MAX_IN_FLIGHT_CHUNKS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// The upload stream was malformed or failed mid-read.
    #[error("upload input error: {0}")]
    Input(String),
    /// A chunk could not be persisted on its assigned node.
    #[error("chunk storage failed")]
    Storage,
}

/// Splits an upload stream into fixed-size chunks and distributes them
/// across the configured node list.
///
/// The node list is fixed at construction and captured once per upload, so
/// chunk `i` always lands on node `i % N` regardless of concurrent cluster
/// membership changes.
pub struct UploadCoordinator {
    catalog: Arc<MetadataCatalog>,
    registry: Arc<ClusterRegistry>,
    nodes: Vec<String>,
    chunk_size: usize,
}

impl UploadCoordinator {
    pub fn new(
        catalog: Arc<MetadataCatalog>,
        registry: Arc<ClusterRegistry>,
        nodes: Vec<String>,
    ) -> Self {
        Self::with_chunk_size(catalog, registry, nodes, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(
        catalog: Arc<MetadataCatalog>,
        registry: Arc<ClusterRegistry>,
        nodes: Vec<String>,
        chunk_size: usize,
    ) -> Self {
        Self {
            catalog,
            registry,
            nodes,
            chunk_size,
        }
    }

    /// Reads the stream to its end, storing one chunk per `chunk_size`
    /// span of input.
    ///
    /// Splitting and storing are overlapped: reading the next span is not
    /// gated on completion of already dispatched units, only on the
    /// in-flight cap. Once a failure is observed no new units are
    /// dispatched, but units already running are left to finish; the call
    /// returns only after every dispatched unit has settled. On failure no
    /// record is committed -- chunks persisted before the failure was
    /// observed stay behind as orphans.
    ///
    /// An empty stream is a valid zero-length file and commits a record
    /// with no chunks.
    pub async fn store_stream<S, E>(
        &self,
        file_name: &str,
        content_type: &str,
        mut stream: S,
    ) -> Result<FileRecord, UploadError>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: std::fmt::Display,
    {
        let nodes = self.nodes.clone();
        let in_flight = Arc::new(Semaphore::new(MAX_IN_FLIGHT_CHUNKS));
        let mut units: JoinSet<Result<(), UploadError>> = JoinSet::new();
        let mut chunks: Vec<Uuid> = Vec::new();
        let mut buffer = BytesMut::new();
        let mut size: u64 = 0;
        let mut first_failure: Option<UploadError> = None;

        'read: loop {
            // Reap finished units so a failure stops the read loop promptly.
            while let Some(outcome) = units.try_join_next() {
                note_failure(outcome, &mut first_failure);
            }
            if first_failure.is_some() {
                break;
            }

            match stream.next().await {
                Some(Ok(data)) => {
                    size += data.len() as u64;
                    buffer.extend_from_slice(&data);
                    while buffer.len() >= self.chunk_size {
                        let payload = buffer.split_to(self.chunk_size).freeze();
                        if let Err(err) = self
                            .dispatch(&nodes, &mut chunks, payload, &in_flight, &mut units)
                            .await
                        {
                            first_failure = Some(err);
                            break 'read;
                        }
                    }
                }
                Some(Err(err)) => {
                    tracing::error!(file_name = %file_name, error = %err, "upload stream read failed");
                    first_failure = Some(UploadError::Input(err.to_string()));
                    break;
                }
                None => {
                    if !buffer.is_empty() {
                        let payload = buffer.split().freeze();
                        if let Err(err) = self
                            .dispatch(&nodes, &mut chunks, payload, &in_flight, &mut units)
                            .await
                        {
                            first_failure = Some(err);
                        }
                    }
                    break;
                }
            }
        }

        // In-flight units run to completion either way; wait for all of
        // them to settle before reporting the outcome.
        while let Some(outcome) = units.join_next().await {
            note_failure(outcome, &mut first_failure);
        }

        if let Some(err) = first_failure {
            tracing::warn!(
                file_name = %file_name,
                dispatched = chunks.len(),
                error = %err,
                "upload failed; no record committed"
            );
            return Err(err);
        }

        let record = FileRecord {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            size,
            chunks,
        };
        self.catalog.set_file(record.clone());
        tracing::info!(
            file_name = %file_name,
            size_bytes = size,
            chunks = record.chunks.len(),
            "upload committed"
        );
        Ok(record)
    }

    async fn dispatch(
        &self,
        nodes: &[String],
        chunks: &mut Vec<Uuid>,
        payload: Bytes,
        in_flight: &Arc<Semaphore>,
        units: &mut JoinSet<Result<(), UploadError>>,
    ) -> Result<(), UploadError> {
        if nodes.is_empty() {
            tracing::error!("no storage nodes configured");
            return Err(UploadError::Storage);
        }
        let index = chunks.len();
        let node = nodes[index % nodes.len()].clone();
        let id = Uuid::new_v4();
        chunks.push(id);

        let permit = in_flight
            .clone()
            .acquire_owned()
            .await
            .expect("in-flight semaphore closed");
        let catalog = self.catalog.clone();
        let registry = self.registry.clone();
        units.spawn(async move {
            let _permit = permit;
            // Owner entry first, then the bytes; the record referencing
            // this chunk is only committed after every unit succeeded.
            catalog.set_chunk_owner(id, node.clone());
            if registry.set_chunk(&node, id, payload) {
                Ok(())
            } else {
                tracing::error!(chunk = %id, node = %node, "assigned node is not in the cluster");
                Err(UploadError::Storage)
            }
        });
        Ok(())
    }
}

/// Keeps the first failure observed across the upload's storage units.
fn note_failure(
    outcome: Result<Result<(), UploadError>, JoinError>,
    first_failure: &mut Option<UploadError>,
) {
    let failure = match outcome {
        Ok(Ok(())) => return,
        Ok(Err(err)) => err,
        Err(err) => {
            tracing::error!(error = %err, "chunk storage unit aborted");
            UploadError::Storage
        }
    };
    if first_failure.is_none() {
        *first_failure = Some(failure);
    }
}
