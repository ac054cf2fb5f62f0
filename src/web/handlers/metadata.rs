//! File metadata handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::file::FileMetadataRepository;
use crate::web::dto::{ApiResponse, MetadataEntryResponse, SetMetadataRequest};
use crate::web::error::ApiError;
use crate::web::handlers::file::load_file;
use crate::web::handlers::AppState;

/// GET /api/files/:id/metadata - List metadata entries ordered by key.
pub async fn list_metadata(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<MetadataEntryResponse>>>, ApiError> {
    load_file(&state, file_id).await?;

    let entries = FileMetadataRepository::new(state.db.pool())
        .list(file_id)
        .await?;
    Ok(Json(ApiResponse::new(
        entries.into_iter().map(MetadataEntryResponse::from).collect(),
    )))
}

/// PUT /api/files/:id/metadata/:key - Set a metadata value.
pub async fn set_metadata(
    State(state): State<Arc<AppState>>,
    Path((file_id, key)): Path<(i64, String)>,
    Json(req): Json<SetMetadataRequest>,
) -> Result<Json<ApiResponse<MetadataEntryResponse>>, ApiError> {
    FileMetadataRepository::new(state.db.pool())
        .set(file_id, &key, &req.value)
        .await?;

    Ok(Json(ApiResponse::new(MetadataEntryResponse {
        key,
        value: req.value,
    })))
}

/// DELETE /api/files/:id/metadata/:key - Remove a metadata entry.
pub async fn delete_metadata(
    State(state): State<Arc<AppState>>,
    Path((file_id, key)): Path<(i64, String)>,
) -> Result<StatusCode, ApiError> {
    FileMetadataRepository::new(state.db.pool())
        .remove(file_id, &key)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
