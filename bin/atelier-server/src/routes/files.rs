//! Output/input image serving.
//!
//! Thin delegation to the blob stores: handlers decide the allowlist and
//! content type, the blob layer handles path safety and the filesystem.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

use crate::blob::{BlobError, BlobStore};
use crate::error::ServerError;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_output, get_input))]
pub struct FilesApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/outputs/{namespace}/{file_name}", get(get_output))
        .route("/inputs/{file_name}", get(get_input))
}

/// Content type for the served image formats; `None` for anything else.
fn image_content_type(file_name: &str) -> Option<&'static str> {
    let ext = std::path::Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn blob_to_server(file_name: &str, e: BlobError) -> ServerError {
    match e {
        // Invalid paths are reported as missing rather than described.
        BlobError::NotFound(_) | BlobError::InvalidPath(_) => {
            ServerError::NotFound(format!("file {file_name} not found"))
        }
        BlobError::Io(e) => ServerError::Internal(e.to_string()),
    }
}

/// Serve one generated image (`GET /outputs/{namespace}/{file_name}`).
///
/// Only the generated-image formats are served; any other extension is a
/// 404, not a 400.
#[utoipa::path(
    get,
    path = "/outputs/{namespace}/{file_name}",
    tag = "files",
    params(
        ("namespace" = String, Path, description = "Output grouping, e.g. a date"),
        ("file_name" = String, Path, description = "Image file name"),
    ),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "Unknown file or disallowed extension"),
    )
)]
pub async fn get_output(
    State(state): State<Arc<AppState>>,
    Path((namespace, file_name)): Path<(String, String)>,
) -> Result<Response, ServerError> {
    let Some(content_type) = image_content_type(&file_name) else {
        return Err(ServerError::NotFound(format!("file {file_name} not found")));
    };
    let rel_path = format!("{namespace}/{file_name}");
    let bytes = state
        .outputs
        .read(&rel_path)
        .await
        .map_err(|e| blob_to_server(&file_name, e))?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

/// Serve one uploaded input file (`GET /inputs/{file_name}`).
#[utoipa::path(
    get,
    path = "/inputs/{file_name}",
    tag = "files",
    params(
        ("file_name" = String, Path, description = "Input file name"),
    ),
    responses(
        (status = 200, description = "File bytes"),
        (status = 404, description = "Unknown file"),
    )
)]
pub async fn get_input(
    State(state): State<Arc<AppState>>,
    Path(file_name): Path<String>,
) -> Result<Response, ServerError> {
    let bytes = state
        .inputs
        .read(&file_name)
        .await
        .map_err(|e| blob_to_server(&file_name, e))?;
    let content_type = image_content_type(&file_name).unwrap_or("application/octet-stream");
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn content_type_covers_served_formats() {
        assert_eq!(image_content_type("a.png"), Some("image/png"));
        assert_eq!(image_content_type("a.jpg"), Some("image/jpeg"));
        assert_eq!(image_content_type("a.JPEG"), Some("image/jpeg"));
        assert_eq!(image_content_type("a.webp"), Some("image/webp"));
    }

    #[test]
    fn content_type_rejects_everything_else() {
        assert_eq!(image_content_type("a.gif"), None);
        assert_eq!(image_content_type("a.png.exe"), None);
        assert_eq!(image_content_type("no-extension"), None);
    }
}
