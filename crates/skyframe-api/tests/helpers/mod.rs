//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p skyframe-api --test uploads_test` or
//! `cargo test -p skyframe-api`. Uses a per-test SQLite file and temp-dir
//! storage, so tests are isolated and need no external services.

pub mod flows;
pub mod provider;
pub mod storage;

use axum_test::TestServer;
use skyframe_api::constants;
use skyframe_api::services::{JobService, UploadService};
use skyframe_api::setup::routes;
use skyframe_api::state::AppState;
use skyframe_core::Config;
use skyframe_db::{JobRepository, UploadRepository};
use skyframe_enhance::EnhanceProvider;
use skyframe_storage::{BlobStore, LocalDiskStore};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;

use provider::MockProvider;
use storage::FaultyStore;

/// API path prefix for tests (e.g. `/api`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server, pool, and the programmable fakes.
pub struct TestApp {
    pub server: TestServer,
    pub pool: SqlitePool,
    pub provider: Arc<MockProvider>,
    pub storage: Arc<FaultyStore>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn upload_repository(&self) -> UploadRepository {
        UploadRepository::new(self.pool.clone())
    }

    pub fn job_repository(&self) -> JobRepository {
        JobRepository::new(self.pool.clone())
    }
}

/// Setup test app with an isolated database, local storage, and a mock provider.
pub async fn setup_test_app() -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

    let db_path = temp_dir.path().join("skyframe-test.db");
    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("Failed to open test database");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let storage_path = temp_dir.path().join("storage");
    let local = LocalDiskStore::new(storage_path, "http://localhost:8000/media".to_string())
        .await
        .expect("Failed to create local storage");
    let faulty = Arc::new(FaultyStore::new(Arc::new(local)));
    let storage: Arc<dyn BlobStore> = faulty.clone();

    let provider = Arc::new(MockProvider::new());
    let provider_dyn: Arc<dyn EnhanceProvider> = provider.clone();

    let config = create_test_config(&db_path.display().to_string());

    let upload_repository = UploadRepository::new(pool.clone());
    let job_repository = JobRepository::new(pool.clone());

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
        provider_dyn,
        config.default_model.clone(),
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        pool: pool.clone(),
        storage,
        uploads,
        jobs,
    });

    let app = routes::setup_routes(&config, state).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        pool,
        provider,
        storage: faulty,
        _temp_dir: temp_dir,
    }
}

fn create_test_config(db_path: &str) -> Config {
    Config {
        port: 8000,
        environment: "test".to_string(),
        cors_origins: vec!["*".to_string()],
        database_url: format!("sqlite://{}", db_path),
        database_max_connections: 5,
        storage_path: "unused-in-tests".to_string(),
        storage_base_url: "http://localhost:8000/media".to_string(),
        max_upload_size_mb: 10,
        allowed_content_types: vec!["video/mp4".to_string(), "video/quicktime".to_string()],
        allowed_extensions: vec!["mp4".to_string(), "mov".to_string()],
        replicate_api_token: "test-token".to_string(),
        replicate_api_base: "http://localhost:1/unused".to_string(),
        default_model: "upscale".to_string(),
        scale_factor: 2,
        provider_timeout_secs: 5,
        result_fetch_timeout_secs: 5,
    }
}
