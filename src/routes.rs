use crate::{SharedData, api, logging};
use axum::Router;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

/// Name of the page served for any path that doesn't match a file in the frontend bundle
const INDEX_PAGE: &str = "index.html";

/// Builds the full application router: the task API, its documentation and the frontend
/// bundle served from `frontend_dir`
pub fn build_router(shared_data: Arc<SharedData>, frontend_dir: &Path) -> Router {
    let frontend = ServeDir::new(frontend_dir).fallback(ServeFile::new(frontend_dir.join(INDEX_PAGE)));

    let router = Router::new()
        .nest("/api/tasks", api::task::task_routes())
        .merge(api::swagger_main::build_documentation())
        .fallback_service(frontend)
        .layer(CorsLayer::permissive())
        .with_state(shared_data);

    logging::attach_tracing_http(router)
}
