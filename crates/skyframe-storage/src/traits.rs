//! Blob store abstraction trait
//!
//! This module defines the BlobStore trait that all storage backends must implement.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Chunked read of a stored blob.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Incoming payload consumed without buffering the whole body in memory.
pub type ByteReader = Pin<Box<dyn AsyncRead + Send>>;

/// Blob store abstraction trait
///
/// All storage backends must implement this trait. This allows the upload and
/// job services to persist and serve video bytes without coupling to a
/// specific backend.
///
/// **Key format:** Keys are date-partitioned: `uploads/{yyyy}/{mm}/{dd}/{upload_id}_{filename}`
/// for source videos and `outputs/{yyyy}/{mm}/{dd}/{job_id}_enhanced_{filename}` for
/// enhancement results. See the crate root documentation.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write a full in-memory buffer under the given key.
    ///
    /// Returns the number of bytes written.
    async fn put(&self, storage_key: &str, data: Bytes) -> StorageResult<u64>;

    /// Stream a payload to the given key without buffering it whole.
    ///
    /// Returns the number of bytes written.
    async fn put_stream(&self, storage_key: &str, reader: ByteReader) -> StorageResult<u64>;

    /// Open a chunked read of the blob at the given key.
    async fn get_stream(&self, storage_key: &str) -> StorageResult<ByteStream>;

    /// Whether a blob exists at the given key.
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Size in bytes of the stored blob.
    async fn content_length(&self, storage_key: &str) -> StorageResult<u64>;

    /// Delete a blob by its storage key. Deleting a missing key is not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Publicly reachable URL for the blob at the given key.
    fn public_url(&self, storage_key: &str) -> String;
}
