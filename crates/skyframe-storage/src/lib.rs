//! SkyFrame Storage Library
//!
//! This crate provides the blob store abstraction and the local filesystem
//! implementation used for uploaded videos and enhancement outputs.
//!
//! # Storage key format
//!
//! Keys are date-partitioned and derived from record ids, never from raw
//! client input:
//!
//! - **Source videos**: `uploads/{yyyy}/{mm}/{dd}/{upload_id}_{filename}`
//! - **Enhanced outputs**: `outputs/{yyyy}/{mm}/{dd}/{job_id}_enhanced_{filename}`
//!
//! Filenames are sanitized before they enter a key. Keys must not contain
//! `..` or a leading `/`. Key generation is centralized in the `keys` module
//! so every caller produces the same layout.

pub mod keys;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use keys::{result_key, sanitize_filename, source_key};
pub use local::LocalDiskStore;
pub use traits::{BlobStore, ByteReader, ByteStream, StorageError, StorageResult};
