//! File Transfer Module
//!
//! The distribution and reconstruction engine on top of the cluster and
//! the catalog.
//!
//! ## Responsibilities
//! - **Splitting**: incoming byte streams are cut into fixed-size chunks, each with a
//!   fresh id, placed round-robin over the configured node list.
//! - **Dispatch**: chunk storage units run concurrently with each other and with the
//!   read loop; the first failure stops new dispatches and fails the upload.
//! - **Commit**: a file record becomes visible only after every chunk of the upload
//!   has been stored.
//! - **Reconstruction**: downloads resolve each chunk's owner and stream payloads back
//!   in record order.

pub mod download;
pub mod handlers;
pub mod protocol;
pub mod upload;

#[cfg(test)]
mod tests;
