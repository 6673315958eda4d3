//! Upload lifecycle operations: reserve, write bytes, complete.
//!
//! Keeps handler logic thin and allows unit testing without HTTP. Status
//! transitions go through the repository's guarded updates so a concurrent
//! request can never move an upload out of a terminal state.

use chrono::Utc;
use skyframe_core::models::{InitUploadRequest, Upload, UploadStatus};
use skyframe_core::AppError;
use skyframe_db::UploadRepository;
use skyframe_storage::{source_key, BlobStore, ByteReader};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct UploadService {
    repository: UploadRepository,
    storage: Arc<dyn BlobStore>,
    max_upload_size_bytes: u64,
    allowed_content_types: Vec<String>,
    allowed_extensions: Vec<String>,
}

impl UploadService {
    pub fn new(
        repository: UploadRepository,
        storage: Arc<dyn BlobStore>,
        max_upload_size_bytes: u64,
        allowed_content_types: Vec<String>,
        allowed_extensions: Vec<String>,
    ) -> Self {
        Self {
            repository,
            storage,
            max_upload_size_bytes,
            allowed_content_types,
            allowed_extensions,
        }
    }

    /// Validate declared metadata and reserve an upload slot.
    pub async fn reserve(&self, request: InitUploadRequest) -> Result<Upload, AppError> {
        request.validate()?;
        self.validate_file_meta(&request.filename, &request.content_type, request.size_bytes)?;

        let upload = Upload::reserve(request.filename, request.content_type, request.size_bytes);
        self.repository.create(&upload).await?;

        tracing::info!(
            upload_id = %upload.id,
            filename = %upload.filename,
            size_bytes = upload.size_bytes,
            "Upload slot reserved"
        );
        Ok(upload)
    }

    /// Stream the request body into the blob store under the upload's source key.
    ///
    /// Returns the number of bytes written. A storage failure marks the upload
    /// failed, which is terminal; the client must reserve a new slot.
    pub async fn write_bytes(&self, id: Uuid, reader: ByteReader) -> Result<u64, AppError> {
        let record = self
            .repository
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Upload {} not found", id)))?;

        if record.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Upload {} is {}, no further writes accepted",
                id,
                record.status.as_str()
            )));
        }

        if !self.repository.mark_uploading(id, Utc::now()).await? {
            // Lost a race against a terminal transition.
            return Err(AppError::Conflict(format!(
                "Upload {} is no longer accepting writes",
                id
            )));
        }

        let key = source_key(record.id, &record.filename, record.created_at);
        match self.storage.put_stream(&key, reader).await {
            Ok(bytes_written) => {
                tracing::info!(
                    upload_id = %id,
                    storage_key = %key,
                    bytes_written,
                    "Upload bytes written"
                );
                Ok(bytes_written)
            }
            Err(e) => {
                tracing::error!(upload_id = %id, error = %e, "Upload write failed");
                if let Err(mark_err) = self.repository.mark_failed(id, Utc::now()).await {
                    tracing::error!(upload_id = %id, error = %mark_err, "Failed to mark upload failed");
                }
                Err(AppError::Storage(e.to_string()))
            }
        }
    }

    /// Verify the stored bytes and mark the upload complete.
    ///
    /// A missing blob marks the upload failed. A size mismatch is reported as
    /// a validation error but leaves the status unchanged, so the client can
    /// re-send the bytes and complete again.
    pub async fn complete(&self, id: Uuid) -> Result<Upload, AppError> {
        let record = self
            .repository
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Upload {} not found", id)))?;

        if record.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Upload {} is already {}",
                id,
                record.status.as_str()
            )));
        }

        let key = source_key(record.id, &record.filename, record.created_at);

        if !self.storage.exists(&key).await.map_err(storage_error)? {
            if let Err(mark_err) = self.repository.mark_failed(id, Utc::now()).await {
                tracing::error!(upload_id = %id, error = %mark_err, "Failed to mark upload failed");
            }
            return Err(AppError::Validation(
                "File not found in storage".to_string(),
            ));
        }

        let stored_size = self.storage.content_length(&key).await.map_err(storage_error)?;
        if stored_size != record.size_bytes as u64 {
            return Err(AppError::Validation(format!(
                "Stored size {} does not match declared size {}",
                stored_size, record.size_bytes
            )));
        }

        if !self.repository.mark_complete(id, &key, Utc::now()).await? {
            return Err(AppError::Conflict(format!(
                "Upload {} can no longer be completed",
                id
            )));
        }

        tracing::info!(upload_id = %id, storage_key = %key, "Upload complete");
        self.reload(id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Upload, AppError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Upload {} not found", id)))
    }

    pub async fn list(
        &self,
        status: Option<UploadStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Upload>, AppError> {
        let limit = limit.clamp(1, 100);
        let offset = offset.max(0);
        self.repository.list(status, limit, offset).await
    }

    fn validate_file_meta(
        &self,
        filename: &str,
        content_type: &str,
        size_bytes: i64,
    ) -> Result<(), AppError> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        if !self.allowed_extensions.contains(&extension) {
            return Err(AppError::Validation(format!(
                "Unsupported format '{}'. Allowed: {}",
                extension,
                self.allowed_extensions.join(", ")
            )));
        }

        if !self
            .allowed_content_types
            .contains(&content_type.to_lowercase())
        {
            return Err(AppError::Validation(format!(
                "Unsupported content type '{}'. Allowed: {}",
                content_type,
                self.allowed_content_types.join(", ")
            )));
        }

        if size_bytes as u64 > self.max_upload_size_bytes {
            return Err(AppError::Validation(format!(
                "File too large. Max {}MB",
                self.max_upload_size_bytes / (1024 * 1024)
            )));
        }

        Ok(())
    }

    async fn reload(&self, id: Uuid) -> Result<Upload, AppError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Upload {} not found", id)))
    }
}

fn storage_error(e: skyframe_storage::StorageError) -> AppError {
    AppError::Storage(e.to_string())
}
