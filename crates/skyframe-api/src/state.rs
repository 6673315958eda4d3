//! Application state shared by all handlers.

use skyframe_core::Config;
use skyframe_storage::BlobStore;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::services::{JobService, UploadService};

/// Shared state: configuration, database pool, blob store, and the two domain
/// services. Handlers extract it as `State<Arc<AppState>>`; the blob store is
/// exposed directly for the download paths, which stream straight from it.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pool: SqlitePool,
    pub storage: Arc<dyn BlobStore>,
    pub uploads: UploadService,
    pub jobs: JobService,
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
