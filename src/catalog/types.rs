use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata binding a file name to its ordered chunk list.
///
/// `chunks` is byte order in the original upload stream; reconstruction
/// concatenates chunk payloads in exactly this order. `file_name` is the
/// primary key in the catalog, so re-uploading the same name replaces the
/// prior record. `size` is the total byte length of the original stream,
/// letting a client check a download for truncation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    pub chunks: Vec<Uuid>,
}
