//! Transfer Module Tests
//!
//! Validates the split/distribute/commit pipeline and the reassembly path.
//!
//! ## Test Scopes
//! - **Placement**: round-robin assignment is a pure function of read order.
//! - **Visibility**: a record only ever appears after all chunks are stored;
//!   failed uploads leave orphans but no record.
//! - **Reassembly**: downloads reproduce the original bytes, or truncate on
//!   a missing chunk.

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::Arc;

    use bytes::Bytes;
    use futures::{Stream, StreamExt};

    use crate::catalog::memory::MetadataCatalog;
    use crate::catalog::types::FileRecord;
    use crate::cluster::registry::ClusterRegistry;
    use crate::transfer::download::{DownloadCoordinator, DownloadError};
    use crate::transfer::upload::{UploadCoordinator, UploadError};

    fn cluster(
        node_names: &[&str],
    ) -> (Arc<MetadataCatalog>, Arc<ClusterRegistry>, Vec<String>) {
        let registry = Arc::new(ClusterRegistry::new());
        for node in node_names {
            registry.add_node(node);
        }
        let catalog = Arc::new(MetadataCatalog::new());
        let nodes = node_names.iter().map(|node| node.to_string()).collect();
        (catalog, registry, nodes)
    }

    /// Frames `data` the way a transport would: arbitrary read sizes that
    /// do not line up with chunk boundaries.
    fn frames(
        data: &[u8],
        frame_size: usize,
    ) -> impl Stream<Item = Result<Bytes, Infallible>> + Unpin {
        let parts: Vec<Result<Bytes, Infallible>> = data
            .chunks(frame_size)
            .map(|part| Ok(Bytes::copy_from_slice(part)))
            .collect();
        futures::stream::iter(parts)
    }

    // ============================================================
    // UPLOAD: PLACEMENT AND COMMIT
    // ============================================================

    #[tokio::test]
    async fn test_round_robin_assignment_is_deterministic() {
        let (catalog, registry, nodes) = cluster(&["s0", "s1", "s2"]);
        let uploads =
            UploadCoordinator::with_chunk_size(catalog.clone(), registry.clone(), nodes.clone(), 4);

        // The same split always lands on the same nodes, run after run.
        for run in 0..5 {
            let name = format!("file-{}.bin", run);
            let record = uploads
                .store_stream(&name, "application/octet-stream", frames(b"ABCDEFGHIJ", 3))
                .await
                .unwrap();

            assert_eq!(record.chunks.len(), 3);
            for (index, chunk) in record.chunks.iter().enumerate() {
                assert_eq!(
                    catalog.get_chunk_owner(chunk),
                    Some(nodes[index % nodes.len()].clone()),
                    "chunk {} of run {} misplaced",
                    index,
                    run
                );
            }
        }
    }

    #[tokio::test]
    async fn test_split_preserves_byte_order_and_sizes() {
        let (catalog, registry, nodes) = cluster(&["s0", "s1", "s2"]);
        let uploads =
            UploadCoordinator::with_chunk_size(catalog, registry.clone(), nodes, 4);

        let record = uploads
            .store_stream("letters.txt", "text/plain", frames(b"ABCDEFGHIJ", 10))
            .await
            .unwrap();

        assert_eq!(record.size, 10);
        let expected: [(&str, &[u8]); 3] = [("s0", b"ABCD"), ("s1", b"EFGH"), ("s2", b"IJ")];
        for (index, (node, payload)) in expected.iter().enumerate() {
            assert_eq!(
                registry.get_chunk(node, &record.chunks[index]),
                Some(Bytes::copy_from_slice(payload))
            );
        }
    }

    #[tokio::test]
    async fn test_single_node_takes_every_chunk() {
        let (catalog, registry, nodes) = cluster(&["only"]);
        let uploads = UploadCoordinator::with_chunk_size(catalog.clone(), registry, nodes, 4);

        let record = uploads
            .store_stream("solo.bin", "application/octet-stream", frames(b"ABCDEFGHIJ", 4))
            .await
            .unwrap();

        assert_eq!(record.chunks.len(), 3);
        for chunk in &record.chunks {
            assert_eq!(catalog.get_chunk_owner(chunk).as_deref(), Some("only"));
        }
    }

    #[tokio::test]
    async fn test_empty_upload_commits_empty_record() {
        let (catalog, registry, nodes) = cluster(&["s0", "s1"]);
        let uploads = UploadCoordinator::new(catalog.clone(), registry.clone(), nodes);
        let downloads = DownloadCoordinator::new(catalog, registry);

        let record = uploads
            .store_stream("empty.bin", "application/octet-stream", frames(b"", 4))
            .await
            .unwrap();

        assert!(record.chunks.is_empty());
        assert_eq!(record.size, 0);

        let (_, chunk_stream) = downloads.open("empty.bin").unwrap();
        let parts: Vec<_> = chunk_stream.collect().await;
        assert!(parts.is_empty());
    }

    #[tokio::test]
    async fn test_reupload_same_name_replaces_record() {
        let (catalog, registry, nodes) = cluster(&["s0", "s1"]);
        let uploads =
            UploadCoordinator::with_chunk_size(catalog.clone(), registry, nodes, 4);

        uploads
            .store_stream("doc.txt", "text/plain", frames(b"old contents", 4))
            .await
            .unwrap();
        let second = uploads
            .store_stream("doc.txt", "text/plain", frames(b"new", 4))
            .await
            .unwrap();

        let found = catalog.get_file("doc.txt").unwrap();
        assert_eq!(found.chunks, second.chunks);
        assert_eq!(found.size, 3);
    }

    // ============================================================
    // UPLOAD: FAILURE SEMANTICS
    // ============================================================

    #[tokio::test]
    async fn test_failed_chunk_blocks_record_visibility() {
        // "s1" is on the round-robin list but missing from the cluster, so
        // the second chunk's storage unit fails.
        let (catalog, registry, _) = cluster(&["s0", "s2"]);
        let nodes = vec!["s0".to_string(), "s1".to_string(), "s2".to_string()];
        let uploads =
            UploadCoordinator::with_chunk_size(catalog.clone(), registry, nodes, 4);

        let err = uploads
            .store_stream("doomed.bin", "application/octet-stream", frames(b"ABCDEFGHIJ", 10))
            .await
            .unwrap_err();

        assert_eq!(err, UploadError::Storage);
        assert!(catalog.get_file("doomed.bin").is_none());
    }

    #[tokio::test]
    async fn test_orphaned_chunks_remain_fetchable() {
        let (catalog, registry, _) = cluster(&["s0", "s2"]);
        let nodes = vec!["s0".to_string(), "s1".to_string(), "s2".to_string()];
        let uploads =
            UploadCoordinator::with_chunk_size(catalog.clone(), registry.clone(), nodes, 4);

        uploads
            .store_stream("doomed.bin", "application/octet-stream", frames(b"ABCDEFGHIJ", 10))
            .await
            .unwrap_err();

        // Chunks stored before the failure settled stay behind: owner
        // entries and bytes are still reachable even though no record
        // references them.
        assert_eq!(catalog.file_count(), 0);
        assert_eq!(catalog.chunk_owner_count(), 3);

        let survivors = registry.node("s0").unwrap().dump();
        assert_eq!(survivors.len(), 1);
        let (id, payload) = &survivors[0];
        assert_eq!(payload.as_ref(), b"ABCD");
        assert_eq!(catalog.get_chunk_owner(id).as_deref(), Some("s0"));
        assert_eq!(registry.get_chunk("s0", id), Some(payload.clone()));
    }

    #[tokio::test]
    async fn test_stream_read_error_fails_upload_as_input() {
        let (catalog, registry, nodes) = cluster(&["s0", "s1"]);
        let uploads =
            UploadCoordinator::with_chunk_size(catalog.clone(), registry, nodes, 4);

        let broken = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"ABCD")),
            Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "connection reset",
            )),
        ]);

        let err = uploads
            .store_stream("partial.bin", "application/octet-stream", broken)
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Input(_)));
        assert!(catalog.get_file("partial.bin").is_none());
    }

    // ============================================================
    // DOWNLOAD: REASSEMBLY
    // ============================================================

    #[tokio::test]
    async fn test_download_reproduces_original_bytes() {
        let (catalog, registry, nodes) = cluster(&["s0", "s1", "s2"]);
        let uploads =
            UploadCoordinator::with_chunk_size(catalog.clone(), registry.clone(), nodes, 1024);
        let downloads = DownloadCoordinator::new(catalog, registry);

        let input: Vec<u8> = (0..3 * 1024 + 7).map(|i| (i % 251) as u8).collect();
        uploads
            .store_stream("pattern.bin", "application/octet-stream", frames(&input, 300))
            .await
            .unwrap();

        let (record, chunk_stream) = downloads.open("pattern.bin").unwrap();
        assert_eq!(record.size, input.len() as u64);

        let mut output = Vec::new();
        let parts: Vec<_> = chunk_stream.collect().await;
        for part in parts {
            output.extend_from_slice(&part.unwrap());
        }
        assert_eq!(output, input);
    }

    #[tokio::test]
    async fn test_download_unknown_file_is_not_found() {
        let (catalog, registry, _) = cluster(&["s0"]);
        let downloads = DownloadCoordinator::new(catalog, registry);

        let err = match downloads.open("nowhere.bin") {
            Ok(_) => panic!("expected open to fail"),
            Err(e) => e,
        };
        assert_eq!(err, DownloadError::NotFound);
    }

    #[tokio::test]
    async fn test_download_missing_owner_entry_is_surfaced() {
        let (catalog, registry, _) = cluster(&["s0"]);
        // A record referencing a chunk the catalog has no owner entry for.
        catalog.set_file(FileRecord {
            file_name: "broken.bin".to_string(),
            content_type: "application/octet-stream".to_string(),
            size: 4,
            chunks: vec![uuid::Uuid::new_v4()],
        });
        let downloads = DownloadCoordinator::new(catalog, registry);

        let (_, chunk_stream) = downloads.open("broken.bin").unwrap();
        let parts: Vec<_> = chunk_stream.collect().await;
        assert_eq!(parts, vec![Err(DownloadError::ChunkMetadataMissing)]);
    }

    #[tokio::test]
    async fn test_download_truncates_on_missing_chunk_bytes() {
        let (catalog, registry, nodes) = cluster(&["s0", "s1", "s2"]);
        let uploads =
            UploadCoordinator::with_chunk_size(catalog.clone(), registry.clone(), nodes, 4);
        let downloads = DownloadCoordinator::new(catalog.clone(), registry.clone());

        let record = uploads
            .store_stream("gapped.bin", "application/octet-stream", frames(b"ABCDEFGHIJ", 10))
            .await
            .unwrap();

        // Drop the second chunk's bytes from its node, as if the node had
        // lost them.
        let owner = catalog.get_chunk_owner(&record.chunks[1]).unwrap();
        registry.node(&owner).unwrap().delete(&record.chunks[1]);

        let (_, chunk_stream) = downloads.open("gapped.bin").unwrap();
        let parts: Vec<_> = chunk_stream.collect().await;
        assert_eq!(
            parts,
            vec![
                Ok(Bytes::from_static(b"ABCD")),
                Err(DownloadError::ChunkUnavailable)
            ]
        );
    }
}
