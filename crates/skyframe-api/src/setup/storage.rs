//! Storage setup and initialization

use anyhow::{Context, Result};
use skyframe_core::Config;
use skyframe_storage::{BlobStore, LocalDiskStore};
use std::sync::Arc;

/// Setup the local blob store under the configured path.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn BlobStore>> {
    tracing::info!(path = %config.storage_path, "Initializing blob storage...");
    let store = LocalDiskStore::new(&config.storage_path, config.storage_base_url.clone())
        .await
        .context("Failed to initialize blob storage")?;
    tracing::info!("Blob storage initialized successfully");
    Ok(Arc::new(store))
}
