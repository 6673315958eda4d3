//! Route configuration and setup

use crate::constants::{API_PREFIX, SERVICE_NAME};
use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use skyframe_core::Config;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    let app = public_routes(state.clone())
        .merge(api_routes(state))
        .nest(
            "/docs",
            utoipa_rapidoc::RapiDoc::new("/api/openapi.json")
                .path("/docs")
                .into(),
        )
        .layer(RequestBodyLimitLayer::new(
            config.max_upload_size_bytes() as usize
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Result<Vec<HeaderValue>, _> =
            config.cors_origins.iter().map(|o| o.parse()).collect();

        CorsLayer::new()
            .allow_origin(origins.unwrap_or_default())
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}

/// Public routes (health and API documentation)
fn public_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/health",
            get({
                let state = state.clone();
                move || {
                    let state = state.clone();
                    async { health_check(state).await }
                }
            }),
        )
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::ApiDoc::openapi()) }),
        )
}

/// JSON API routes
fn api_routes(state: Arc<AppState>) -> Router {
    upload_routes(state.clone())
        .merge(job_routes(state.clone()))
        .merge(model_routes(state))
}

/// Upload routes
fn upload_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            &format!("{}/uploads/init", API_PREFIX),
            post(handlers::uploads::init_upload),
        )
        .route(
            &format!("{}/uploads", API_PREFIX),
            get(handlers::uploads::list_uploads),
        )
        .route(
            &format!("{}/uploads/{{id}}", API_PREFIX),
            get(handlers::uploads::get_upload),
        )
        .route(
            &format!("{}/uploads/{{id}}/file", API_PREFIX),
            put(handlers::uploads::upload_file),
        )
        .route(
            &format!("{}/uploads/{{id}}/complete", API_PREFIX),
            post(handlers::uploads::complete_upload),
        )
        .route(
            &format!("{}/uploads/{{id}}/download", API_PREFIX),
            get(handlers::uploads::download_original),
        )
        .with_state(state)
}

/// Enhancement job routes
fn job_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            &format!("{}/jobs/create", API_PREFIX),
            post(handlers::jobs::create_job),
        )
        .route(
            &format!("{}/jobs/{{id}}", API_PREFIX),
            get(handlers::jobs::get_job),
        )
        .route(
            &format!("{}/jobs/{{id}}/download", API_PREFIX),
            get(handlers::jobs::download_enhanced),
        )
        .route(
            &format!("{}/uploads/{{id}}/jobs", API_PREFIX),
            get(handlers::jobs::list_jobs_for_upload),
        )
        .with_state(state)
}

/// Model catalogue routes
fn model_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            &format!("{}/models", API_PREFIX),
            get(handlers::models::list_models),
        )
        .with_state(state)
}

#[derive(serde::Serialize)]
struct HealthCheckResponse {
    status: String,
    service: String,
    version: String,
    ai_enabled: bool,
    database: String,
}

async fn health_check(state: Arc<AppState>) -> impl IntoResponse {
    const TIMEOUT: Duration = Duration::from_secs(5);

    let mut response = HealthCheckResponse {
        status: "ok".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        ai_enabled: state.config.ai_enabled(),
        database: "unknown".to_string(),
    };

    let mut overall_healthy = true;

    // Check database using the pool directly with timeout
    match tokio::time::timeout(TIMEOUT, sqlx::query("SELECT 1").execute(&state.pool)).await {
        Ok(Ok(_)) => {
            response.database = "healthy".to_string();
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Database health check failed");
            response.database = format!("unhealthy: {}", e);
            overall_healthy = false;
        }
        Err(_) => {
            tracing::error!("Database health check timed out");
            response.database = "timeout".to_string();
            overall_healthy = false;
        }
    }

    let status_code = if overall_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
