//! Model catalogue endpoint.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use skyframe_enhance::MODELS;
use std::sync::Arc;
use utoipa::ToSchema;

/// One catalogue entry
#[derive(Debug, Serialize, ToSchema)]
pub struct ModelInfo {
    /// Stable key used in job creation requests
    pub key: String,
    /// Provider-side model identifier
    pub name: String,
    pub description: String,
    /// False until the provider credential is configured
    pub available: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListModelsResponse {
    pub models: Vec<ModelInfo>,
    #[serde(rename = "default")]
    pub default_model: String,
}

#[utoipa::path(
    get,
    path = "/api/models",
    tag = "models",
    responses(
        (status = 200, description = "Available enhancement models", body = ListModelsResponse)
    )
)]
pub async fn list_models(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let available = state.config.ai_enabled();
    let models = MODELS
        .iter()
        .map(|m| ModelInfo {
            key: m.key.to_string(),
            name: m.slug.to_string(),
            description: m.description.to_string(),
            available,
        })
        .collect();

    Ok(Json(ListModelsResponse {
        models,
        default_model: state.config.default_model.clone(),
    }))
}
