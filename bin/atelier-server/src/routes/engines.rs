//! Model and style metadata endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::schemas::engines::AllModelsResponse;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(all_models, all_styles), components(schemas(AllModelsResponse)))]
pub struct EnginesApi;

/// Routes nested under `/v1/engines`.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/all-models", get(all_models))
        .route("/styles", get(all_styles))
}

/// Refresh and return all base-model and LoRA filenames.
#[utoipa::path(
    get,
    path = "/v1/engines/all-models",
    tag = "engines",
    responses(
        (status = 200, description = "Model filenames", body = AllModelsResponse),
    )
)]
pub async fn all_models(State(state): State<Arc<AppState>>) -> Json<AllModelsResponse> {
    Json(state.catalog.refresh().await.into())
}

/// Return all known style names.
#[utoipa::path(
    get,
    path = "/v1/engines/styles",
    tag = "engines",
    responses(
        (status = 200, description = "Style names", body = [String]),
    )
)]
pub async fn all_styles(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.catalog.styles().await)
}
