//! Service and repository wiring.

use anyhow::{Context, Result};
use skyframe_core::Config;
use skyframe_db::{JobRepository, UploadRepository};
use skyframe_enhance::{EnhanceProvider, ReplicateClient};
use skyframe_storage::BlobStore;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::services::{JobService, UploadService};
use crate::state::AppState;

/// Build repositories, the provider client, and the domain services.
pub fn initialize_services(
    config: &Config,
    pool: SqlitePool,
    storage: Arc<dyn BlobStore>,
) -> Result<Arc<AppState>> {
    let upload_repository = UploadRepository::new(pool.clone());
    let job_repository = JobRepository::new(pool.clone());

    let provider: Arc<dyn EnhanceProvider> = Arc::new(
        ReplicateClient::new(
            config.replicate_api_token.clone(),
            config.replicate_api_base.clone(),
            config.scale_factor,
            config.provider_timeout(),
            config.result_fetch_timeout(),
        )
        .context("Failed to build Replicate client")?,
    );

    if config.ai_enabled() {
        tracing::info!("Enhancement provider configured");
    } else {
        tracing::warn!(
            "REPLICATE_API_TOKEN not set: uploads work, job creation will be rejected"
        );
    }

    let uploads = UploadService::new(
        upload_repository.clone(),
        storage.clone(),
        config.max_upload_size_bytes(),
        config.allowed_content_types.clone(),
        config.allowed_extensions.clone(),
    );
    let jobs = JobService::new(
        job_repository,
        upload_repository,
        storage.clone(),
        provider,
        config.default_model.clone(),
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        pool,
        storage,
        uploads,
        jobs,
    }))
}
