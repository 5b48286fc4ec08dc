use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::catalog::memory::MetadataCatalog;
use crate::catalog::types::FileRecord;
use crate::cluster::registry::ClusterRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    /// No record exists under the requested file name.
    #[error("file not found")]
    NotFound,
    /// A chunk listed in the record has no owner entry.
    #[error("chunk not found in catalog")]
    ChunkMetadataMissing,
    /// The owning node cannot serve the chunk (node removed, or the bytes
    /// are gone).
    #[error("chunk not found in storage")]
    ChunkUnavailable,
}

/// Reassembles files by fetching their chunks in record order.
pub struct DownloadCoordinator {
    catalog: Arc<MetadataCatalog>,
    registry: Arc<ClusterRegistry>,
}

impl DownloadCoordinator {
    pub fn new(catalog: Arc<MetadataCatalog>, registry: Arc<ClusterRegistry>) -> Self {
        Self { catalog, registry }
    }

    /// Resolves the record for `file_name` and returns it with a lazy
    /// stream of chunk payloads in list order.
    ///
    /// Output is incremental: a consumer may already have received earlier
    /// chunks when a later one turns out to be missing. In that case the
    /// stream ends with the error and the output stays truncated -- there
    /// is no way to take emitted bytes back.
    pub fn open(
        &self,
        file_name: &str,
    ) -> Result<(FileRecord, BoxStream<'static, Result<Bytes, DownloadError>>), DownloadError>
    {
        let record = self
            .catalog
            .get_file(file_name)
            .ok_or(DownloadError::NotFound)?;

        let catalog = self.catalog.clone();
        let registry = self.registry.clone();
        let chunk_ids = record.chunks.clone();

        let chunk_stream = async_stream::stream! {
            for id in chunk_ids {
                let Some(node) = catalog.get_chunk_owner(&id) else {
                    tracing::error!(chunk = %id, "chunk has no owner entry");
                    yield Err(DownloadError::ChunkMetadataMissing);
                    return;
                };
                let Some(payload) = registry.get_chunk(&node, &id) else {
                    tracing::error!(chunk = %id, node = %node, "owning node cannot serve chunk");
                    yield Err(DownloadError::ChunkUnavailable);
                    return;
                };
                yield Ok(payload);
            }
        }
        .boxed();

        Ok((record, chunk_stream))
    }
}
