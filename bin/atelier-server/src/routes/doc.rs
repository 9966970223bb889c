use crate::routes::{engines, files, health, tasks};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(info(
    title = "atelier-server",
    description = "atelier-server API",
    version = "0.1.0",
    contact(name = "atelier", url = "https://github.com/atelier-host/atelier")
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(tasks::TasksApi::openapi());
    root.merge(files::FilesApi::openapi());
    root.merge(engines::EnginesApi::openapi());
    root
}
