//! Metadata Catalog Module
//!
//! Holds the two mappings that describe where file data lives:
//!
//! - `file name -> FileRecord` (the ordered chunk list of each file)
//! - `chunk id -> owning node address`
//!
//! The two mappings are independently lockable; writers on one never block
//! readers on the other. There is no cross-mapping transactionality -- the
//! upload path sequences its writes so that a FileRecord only ever becomes
//! visible after all of its chunks are stored.

pub mod memory;
pub mod types;
