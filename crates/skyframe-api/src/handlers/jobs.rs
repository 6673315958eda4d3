//! Enhancement job endpoints: create, poll status, download result.

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use serde::Serialize;
use skyframe_core::models::{CreateJobRequest, Job, JobStatus};
use skyframe_core::AppError;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Jobs attached to one upload, newest first
#[derive(Debug, Serialize, ToSchema)]
pub struct ListJobsResponse {
    pub jobs: Vec<Job>,
}

#[utoipa::path(
    post,
    path = "/api/jobs/create",
    tag = "jobs",
    request_body = CreateJobRequest,
    responses(
        (status = 201, description = "Job created, submission runs in the background", body = Job),
        (status = 400, description = "Upload not complete, unknown model, or provider not configured", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(upload_id = %request.upload_id, operation = "create_job"))]
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreateJobRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let job = state.jobs.create(request).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    tag = "jobs",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Current job state, refreshed from the provider when in flight", body = Job),
        (status = 404, description = "Job not found", body = ErrorResponse)
    )
)]
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let job = state.jobs.refresh(id).await?;
    Ok(Json(job))
}

#[utoipa::path(
    get,
    path = "/api/uploads/{id}/jobs",
    tag = "jobs",
    params(
        ("id" = Uuid, Path, description = "Upload ID")
    ),
    responses(
        (status = 200, description = "Jobs for the upload, empty for an unknown upload", body = ListJobsResponse)
    )
)]
pub async fn list_jobs_for_upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let jobs = state.jobs.list_for_upload(id).await?;
    Ok(Json(ListJobsResponse { jobs }))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}/download",
    tag = "jobs",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Enhanced video bytes", content_type = "video/mp4"),
        (status = 404, description = "Job or result not found", body = ErrorResponse),
        (status = 409, description = "Job is not completed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn download_enhanced(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let job = state.jobs.get(id).await?;

    if job.status != JobStatus::Completed {
        return Err(AppError::Conflict(format!(
            "Job is not completed (status: {})",
            job.status.as_str()
        ))
        .into());
    }

    let result_key = job
        .result_key
        .clone()
        .ok_or_else(|| AppError::NotFound(format!("No output file for job {}", id)))?;

    // Download name derives from the source upload when it still exists.
    let filename = match state.uploads.get(job.upload_id).await {
        Ok(upload) => format!("enhanced_{}", upload.filename),
        Err(_) => "enhanced_video.mp4".to_string(),
    };

    tracing::debug!(job_id = %id, result_key = %result_key, "Proxying result from storage");

    let stream = state.storage.get_stream(&result_key).await?;
    let body_stream = stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from_stream(body_stream))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            AppError::Internal(e.to_string())
        })?;

    Ok(response)
}
