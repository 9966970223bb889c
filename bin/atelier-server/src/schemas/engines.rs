use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::CatalogSnapshot;

/// Response body of `GET /v1/engines/all-models`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AllModelsResponse {
    pub model_filenames: Vec<String>,
    pub lora_filenames: Vec<String>,
}

impl From<CatalogSnapshot> for AllModelsResponse {
    fn from(snapshot: CatalogSnapshot) -> Self {
        AllModelsResponse {
            model_filenames: snapshot.model_filenames,
            lora_filenames: snapshot.lora_filenames,
        }
    }
}
