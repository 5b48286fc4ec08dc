use dashmap::DashMap;
use uuid::Uuid;

use super::types::FileRecord;

/// In-memory metadata catalog.
///
/// Two independent maps, each with its own shard locks: one mapping's
/// writers never block the other's readers. A chunk-owner entry is written
/// once at upload time and never updated afterward; an owner entry without
/// a referencing FileRecord is an orphan from a failed upload.
pub struct MetadataCatalog {
    files: DashMap<String, FileRecord>,
    chunk_owners: DashMap<Uuid, String>,
}

impl MetadataCatalog {
    pub fn new() -> Self {
        Self {
            files: DashMap::new(),
            chunk_owners: DashMap::new(),
        }
    }

    /// Stores a file record, keyed by its file name. Overwrites any prior
    /// record under the same name.
    pub fn set_file(&self, record: FileRecord) {
        self.files.insert(record.file_name.clone(), record);
    }

    pub fn get_file(&self, file_name: &str) -> Option<FileRecord> {
        self.files.get(file_name).map(|entry| entry.value().clone())
    }

    pub fn delete_file(&self, file_name: &str) {
        self.files.remove(file_name);
    }

    pub fn set_chunk_owner(&self, chunk: Uuid, node_address: String) {
        self.chunk_owners.insert(chunk, node_address);
    }

    pub fn get_chunk_owner(&self, chunk: &Uuid) -> Option<String> {
        self.chunk_owners
            .get(chunk)
            .map(|entry| entry.value().clone())
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn chunk_owner_count(&self) -> usize {
        self.chunk_owners.len()
    }
}
