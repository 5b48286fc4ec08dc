//! Transfer HTTP Protocol
//!
//! Defines the public API endpoints and the Data Transfer Objects used by
//! the upload/download surface.

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Public endpoint for uploading a file as a multipart stream.
pub const ENDPOINT_UPLOAD: &str = "/upload";
/// Public endpoint for downloading a reassembled file by name.
pub const ENDPOINT_DOWNLOAD: &str = "/download/:filename";

// --- Data Transfer Objects ---

/// Acknowledgment for a committed upload.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Whether the file record was committed.
    pub stored: bool,
    /// The name the file was stored under.
    pub file_name: String,
    /// Number of chunks the upload was split into.
    pub chunks: usize,
}
