//! Router configuration for the HTTP API.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, put},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::dto::HealthResponse;
use super::handlers::{
    add_file_tag, create_folder, create_tag, delete_file, delete_folder, delete_metadata,
    download_file, get_file, get_folder, list_file_tags, list_folder_files, list_folders,
    list_metadata, list_tags, remove_file_tag, set_metadata, update_file, update_folder,
    upload_files, AppState,
};
use super::middleware::create_cors_layer;

/// Create the main router.
pub fn create_router(
    app_state: Arc<AppState>,
    cors_origins: &[String],
    max_upload_bytes: usize,
) -> Router {
    let folder_routes = Router::new()
        .route("/", get(list_folders).post(create_folder))
        .route(
            "/:id",
            get(get_folder).patch(update_folder).delete(delete_folder),
        )
        .route("/:id/files", get(list_folder_files).post(upload_files));

    let file_routes = Router::new()
        .route("/:id", get(get_file).patch(update_file).delete(delete_file))
        .route("/:id/download", get(download_file))
        .route("/:id/tags", get(list_file_tags).post(add_file_tag))
        .route("/:id/tags/:tag_id", delete(remove_file_tag))
        .route("/:id/metadata", get(list_metadata))
        .route("/:id/metadata/:key", put(set_metadata).delete(delete_metadata));

    let tag_routes = Router::new().route("/", get(list_tags).post(create_tag));

    let api_routes = Router::new()
        .nest("/folders", folder_routes)
        .nest("/files", file_routes)
        .nest("/tags", tag_routes);

    Router::new()
        .nest("/api", api_routes)
        .merge(create_health_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(app_state)
}

/// Create the health check and banner routes.
pub fn create_health_router<S: Clone + Send + Sync + 'static>() -> Router<S> {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health_check))
}

async fn banner() -> &'static str {
    "ByteBucket"
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
