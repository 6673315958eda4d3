//! Upload endpoints: reserve a slot, send bytes, complete, inspect, download.

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use skyframe_core::models::{InitUploadRequest, Upload, UploadStatus};
use skyframe_core::AppError;
use skyframe_storage::{source_key, ByteReader};
use std::sync::Arc;
use tokio_util::io::StreamReader;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Deserialize, ToSchema, utoipa::IntoParams)]
pub struct ListUploadsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    /// Restrict to one lifecycle status
    #[serde(default)]
    pub status: Option<UploadStatus>,
}

fn default_limit() -> i64 {
    50
}

/// One page of uploads, newest first
#[derive(Debug, Serialize, ToSchema)]
pub struct ListUploadsResponse {
    pub uploads: Vec<Upload>,
    pub total: usize,
}

#[utoipa::path(
    post,
    path = "/api/uploads/init",
    tag = "uploads",
    request_body = InitUploadRequest,
    responses(
        (status = 201, description = "Upload slot reserved", body = Upload),
        (status = 400, description = "Invalid metadata", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn init_upload(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<InitUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let upload = state.uploads.reserve(request).await?;
    Ok((StatusCode::CREATED, Json(upload)))
}

#[utoipa::path(
    put,
    path = "/api/uploads/{id}/file",
    tag = "uploads",
    params(
        ("id" = Uuid, Path, description = "Upload ID")
    ),
    request_body(content = Vec<u8>, description = "Raw video bytes", content_type = "application/octet-stream"),
    responses(
        (status = 204, description = "Bytes written"),
        (status = 404, description = "Upload not found", body = ErrorResponse),
        (status = 409, description = "Upload already completed or failed", body = ErrorResponse),
        (status = 500, description = "Storage write failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, body), fields(upload_id = %id, operation = "upload_file"))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    body: Body,
) -> Result<impl IntoResponse, HttpAppError> {
    let stream = body.into_data_stream().map_err(std::io::Error::other);
    let reader: ByteReader = Box::pin(StreamReader::new(stream));

    state.uploads.write_bytes(id, reader).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/uploads/{id}/complete",
    tag = "uploads",
    params(
        ("id" = Uuid, Path, description = "Upload ID")
    ),
    responses(
        (status = 200, description = "Upload marked complete", body = Upload),
        (status = 400, description = "Stored bytes missing or size mismatch", body = ErrorResponse),
        (status = 404, description = "Upload not found", body = ErrorResponse),
        (status = 409, description = "Upload already terminal", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(upload_id = %id, operation = "complete_upload"))]
pub async fn complete_upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let upload = state.uploads.complete(id).await?;
    Ok(Json(upload))
}

#[utoipa::path(
    get,
    path = "/api/uploads/{id}",
    tag = "uploads",
    params(
        ("id" = Uuid, Path, description = "Upload ID")
    ),
    responses(
        (status = 200, description = "Upload found", body = Upload),
        (status = 404, description = "Upload not found", body = ErrorResponse)
    )
)]
pub async fn get_upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let upload = state.uploads.get(id).await?;
    Ok(Json(upload))
}

#[utoipa::path(
    get,
    path = "/api/uploads",
    tag = "uploads",
    params(
        ListUploadsQuery
    ),
    responses(
        (status = 200, description = "Uploads listed", body = ListUploadsResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_uploads(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListUploadsQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let uploads = state
        .uploads
        .list(query.status, query.limit, query.offset)
        .await?;
    let total = uploads.len();
    Ok(Json(ListUploadsResponse { uploads, total }))
}

#[utoipa::path(
    get,
    path = "/api/uploads/{id}/download",
    tag = "uploads",
    params(
        ("id" = Uuid, Path, description = "Upload ID")
    ),
    responses(
        (status = 200, description = "Original video bytes", content_type = "application/octet-stream"),
        (status = 404, description = "Upload not found", body = ErrorResponse),
        (status = 409, description = "Upload is not complete", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn download_original(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let upload = state.uploads.get(id).await?;

    if upload.status != UploadStatus::Complete {
        return Err(AppError::Conflict(format!(
            "Upload is not complete (status: {})",
            upload.status.as_str()
        ))
        .into());
    }

    // Complete uploads always carry a storage key; fall back to the derived
    // key so an inconsistent row still reports NotFound from storage.
    let storage_key = upload
        .storage_key
        .clone()
        .unwrap_or_else(|| source_key(upload.id, &upload.filename, upload.created_at));

    tracing::debug!(upload_id = %id, storage_key = %storage_key, "Proxying file from storage");

    let stream = state.storage.get_stream(&storage_key).await?;
    let body_stream = stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, upload.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", upload.filename),
        )
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from_stream(body_stream))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            AppError::Internal(e.to_string())
        })?;

    Ok(response)
}
