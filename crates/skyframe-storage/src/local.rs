use crate::traits::{BlobStore, ByteReader, ByteStream, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem blob store implementation
#[derive(Clone)]
pub struct LocalDiskStore {
    base_path: PathBuf,
    base_url: String,
}

impl LocalDiskStore {
    /// Create a new LocalDiskStore instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for blob storage (e.g., "/var/lib/skyframe/storage")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:8000/media")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalDiskStore {
            base_path,
            base_url,
        })
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Keys must stay inside the base directory, so traversal sequences and
    /// absolute paths are rejected.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty() {
            return Err(StorageError::InvalidKey(
                "Storage key is empty".to_string(),
            ));
        }

        if storage_key.contains("..") || storage_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key escapes the storage directory".to_string(),
            ));
        }

        Ok(self.base_path.join(storage_key))
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for LocalDiskStore {
    async fn put(&self, storage_key: &str, data: Bytes) -> StorageResult<u64> {
        let path = self.key_to_path(storage_key)?;
        let size = data.len() as u64;

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local blob write successful"
        );

        Ok(size)
    }

    async fn put_stream(&self, storage_key: &str, mut reader: ByteReader) -> StorageResult<u64> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&path).await?;

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let bytes_copied = tokio::io::copy(&mut reader, &mut file).await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to write stream to file {}: {}",
                path.display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local blob stream write successful"
        );

        Ok(bytes_copied)
    }

    async fn get_stream(&self, storage_key: &str) -> StorageResult<ByteStream> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        let file = fs::File::open(&path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;

        let reader = tokio_util::io::ReaderStream::new(file);

        let stream = reader.map(|result| {
            result.map_err(|e| StorageError::ReadFailed(format!("Failed to read chunk: {}", e)))
        });

        let key = storage_key.to_string();
        let path_display = path.display().to_string();
        let logged_stream = stream.map(move |item| {
            if item.is_err() {
                tracing::error!(
                    path = %path_display,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local blob stream read error"
                );
            }
            item
        });

        Ok(Box::pin(logged_stream))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn content_length(&self, storage_key: &str) -> StorageResult<u64> {
        let path = self.key_to_path(storage_key)?;
        let meta = fs::metadata(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(storage_key.to_string())
            } else {
                StorageError::BackendError(e.to_string())
            }
        })?;
        Ok(meta.len())
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local blob delete successful"
        );

        Ok(())
    }

    fn public_url(&self, storage_key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), storage_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tempfile::tempdir;

    async fn collect(mut stream: ByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_put_then_stream_roundtrip() {
        let dir = tempdir().unwrap();
        let store = LocalDiskStore::new(dir.path(), "http://localhost:8000/media".to_string())
            .await
            .unwrap();

        let data = b"test video bytes".to_vec();
        let written = store
            .put("uploads/2026/01/02/abc_test.mp4", Bytes::from(data.clone()))
            .await
            .unwrap();
        assert_eq!(written, data.len() as u64);

        let stream = store
            .get_stream("uploads/2026/01/02/abc_test.mp4")
            .await
            .unwrap();
        assert_eq!(collect(stream).await, data);
    }

    #[tokio::test]
    async fn test_put_stream_roundtrip() {
        let dir = tempdir().unwrap();
        let store = LocalDiskStore::new(dir.path(), "http://localhost:8000/media".to_string())
            .await
            .unwrap();

        let data = b"streamed payload".to_vec();
        let reader = Box::pin(std::io::Cursor::new(data.clone())) as ByteReader;

        let written = store.put_stream("uploads/a/b.mp4", reader).await.unwrap();
        assert_eq!(written, data.len() as u64);

        let stream = store.get_stream("uploads/a/b.mp4").await.unwrap();
        assert_eq!(collect(stream).await, data);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let store = LocalDiskStore::new(dir.path(), "http://localhost:8000/media".to_string())
            .await
            .unwrap();

        let result = store.get_stream("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = store.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = store.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = store.put("", Bytes::from_static(b"x")).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_delete_nonexistent_is_ok() {
        let dir = tempdir().unwrap();
        let store = LocalDiskStore::new(dir.path(), "http://localhost:8000/media".to_string())
            .await
            .unwrap();

        assert!(store.delete("nonexistent/file.mp4").await.is_ok());
    }

    #[tokio::test]
    async fn test_exists_and_content_length() {
        let dir = tempdir().unwrap();
        let store = LocalDiskStore::new(dir.path(), "http://localhost:8000/media".to_string())
            .await
            .unwrap();

        store
            .put("outputs/x.mp4", Bytes::from_static(b"12345"))
            .await
            .unwrap();

        assert!(store.exists("outputs/x.mp4").await.unwrap());
        assert!(!store.exists("outputs/y.mp4").await.unwrap());

        assert_eq!(store.content_length("outputs/x.mp4").await.unwrap(), 5);
        assert!(matches!(
            store.content_length("outputs/y.mp4").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_public_url_trims_trailing_slash() {
        let dir = tempdir().unwrap();
        let store = LocalDiskStore::new(dir.path(), "http://localhost:8000/media/".to_string())
            .await
            .unwrap();

        assert_eq!(
            store.public_url("uploads/a.mp4"),
            "http://localhost:8000/media/uploads/a.mp4"
        );
    }
}
