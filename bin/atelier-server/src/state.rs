//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::blob::FsBlobStore;
use crate::catalog::ModelCatalog;
use crate::config::Config;
use crate::query::TaskIndex;

/// State shared across all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Unified task query/delete façade (store + queue + outputs).
    pub index: Arc<TaskIndex>,
    /// Model/LoRA/style metadata scanner.
    pub catalog: Arc<ModelCatalog>,
    /// Generated-image blob root.
    pub outputs: Arc<FsBlobStore>,
    /// Uploaded-input blob root.
    pub inputs: Arc<FsBlobStore>,
}
