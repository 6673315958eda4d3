//! Fault-injecting blob store wrapper.

use async_trait::async_trait;
use bytes::Bytes;
use skyframe_storage::{BlobStore, ByteReader, ByteStream, StorageError, StorageResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Wraps a real store and fails writes on demand.
pub struct FaultyStore {
    inner: Arc<dyn BlobStore>,
    fail_writes: AtomicBool,
}

impl FaultyStore {
    pub fn new(inner: Arc<dyn BlobStore>) -> Self {
        Self {
            inner,
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_write(&self) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StorageError::WriteFailed("injected write failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BlobStore for FaultyStore {
    async fn put(&self, storage_key: &str, data: Bytes) -> StorageResult<u64> {
        self.check_write()?;
        self.inner.put(storage_key, data).await
    }

    async fn put_stream(&self, storage_key: &str, reader: ByteReader) -> StorageResult<u64> {
        self.check_write()?;
        self.inner.put_stream(storage_key, reader).await
    }

    async fn get_stream(&self, storage_key: &str) -> StorageResult<ByteStream> {
        self.inner.get_stream(storage_key).await
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.inner.exists(storage_key).await
    }

    async fn content_length(&self, storage_key: &str) -> StorageResult<u64> {
        self.inner.content_length(storage_key).await
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.inner.delete(storage_key).await
    }

    fn public_url(&self, storage_key: &str) -> String {
        self.inner.public_url(storage_key)
    }
}
