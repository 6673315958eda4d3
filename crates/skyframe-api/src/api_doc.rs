//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use skyframe_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SkyFrame API",
        version = "0.2.0",
        description = "Video upload and AI enhancement API. Upload a source video in three steps (init, send bytes, complete), then create enhancement jobs that run on an external inference provider. Job status is refreshed on read; finished results are stored locally and downloadable."
    ),
    paths(
        // Uploads
        handlers::uploads::init_upload,
        handlers::uploads::upload_file,
        handlers::uploads::complete_upload,
        handlers::uploads::get_upload,
        handlers::uploads::list_uploads,
        handlers::uploads::download_original,
        // Jobs
        handlers::jobs::create_job,
        handlers::jobs::get_job,
        handlers::jobs::list_jobs_for_upload,
        handlers::jobs::download_enhanced,
        // Models
        handlers::models::list_models,
    ),
    components(
        schemas(
            // Core models
            models::Upload,
            models::UploadStatus,
            models::InitUploadRequest,
            models::Job,
            models::JobStatus,
            models::CreateJobRequest,
            // Handler payloads
            handlers::uploads::ListUploadsResponse,
            handlers::jobs::ListJobsResponse,
            handlers::models::ModelInfo,
            handlers::models::ListModelsResponse,
            // Error
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "uploads", description = "Source video upload lifecycle: reserve, send bytes, complete, download"),
        (name = "jobs", description = "AI enhancement jobs: create, poll status, download result"),
        (name = "models", description = "Enhancement model catalogue")
    )
)]
pub struct ApiDoc;
