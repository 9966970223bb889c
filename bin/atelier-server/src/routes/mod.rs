//! Axum router construction.
//!
//! [`build`] assembles the complete application router, including:
//! - Middleware layers (CORS, per-request trace-ID injection)
//! - Optional Swagger UI / OpenAPI spec endpoint (disable with `ATELIER_ENABLE_SWAGGER=false`)
//! - Health / heartbeat route
//! - Task query/delete, file serving, and engine metadata routes
//!   (optionally protected by bearer token)

pub mod doc;
mod engines;
mod files;
mod health;
mod tasks;

use axum::{
    middleware::{self},
    Router,
};

use crate::middleware::{auth, cors, trace};
use crate::state::AppState;
use std::sync::Arc;
use tower::ServiceBuilder;
use utoipa_swagger_ui::SwaggerUi;

// ── Router builder ────────────────────────────────────────────────────────────

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    // Everything except the heartbeat sits behind the optional bearer gate.
    let api_router = Router::new()
        .merge(tasks::router())
        .merge(files::router())
        .nest("/v1/engines", engines::router())
        .layer(middleware::from_fn(auth::check_api_auth));

    let mut app = Router::new().merge(health::router()).merge(api_router);

    // ── Swagger UI ────────────────────────────────────────────────────────────
    // Enabled by default; disable with ATELIER_ENABLE_SWAGGER=false in
    // production to avoid exposing the API structure to potential attackers.
    if state.config.enable_swagger {
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc::get_docs()));
    }

    app
        // Outermost layers execute first on the way in.
        .layer(ServiceBuilder::new().layer(cors::cors_layer(state.clone())))
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}
