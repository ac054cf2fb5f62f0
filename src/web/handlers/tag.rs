//! Tag handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::file::TagRepository;
use crate::web::dto::{AddFileTagRequest, ApiResponse, CreateTagRequest, TagResponse};
use crate::web::error::ApiError;
use crate::web::handlers::file::load_file;
use crate::web::handlers::AppState;

/// GET /api/tags - List all tags.
pub async fn list_tags(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<TagResponse>>>, ApiError> {
    let tags = TagRepository::new(state.db.pool()).list().await?;
    Ok(Json(ApiResponse::new(
        tags.into_iter().map(TagResponse::from).collect(),
    )))
}

/// POST /api/tags - Create a tag.
pub async fn create_tag(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTagRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TagResponse>>), ApiError> {
    let tag = TagRepository::new(state.db.pool()).create(&req.name).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(tag.into()))))
}

/// GET /api/files/:id/tags - List the tags of a file.
pub async fn list_file_tags(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<TagResponse>>>, ApiError> {
    load_file(&state, file_id).await?;

    let tags = TagRepository::new(state.db.pool())
        .list_for_file(file_id)
        .await?;
    Ok(Json(ApiResponse::new(
        tags.into_iter().map(TagResponse::from).collect(),
    )))
}

/// POST /api/files/:id/tags - Attach a tag by ID, or by name (creating it).
pub async fn add_file_tag(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<i64>,
    Json(req): Json<AddFileTagRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TagResponse>>), ApiError> {
    // Checked up front so a name lookup never creates a tag for a missing file
    load_file(&state, file_id).await?;
    let repo = TagRepository::new(state.db.pool());

    let tag = match (req.tag_id, req.name) {
        (Some(tag_id), _) => repo
            .get_by_id(tag_id)
            .await?
            .ok_or_else(|| ApiError::unprocessable(format!("Tag {tag_id} doesn't exist")))?,
        (None, Some(name)) => repo.get_or_create(&name).await?,
        (None, None) => return Err(ApiError::bad_request("Either tag_id or name is required")),
    };

    repo.add_to_file(file_id, tag.id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(tag.into()))))
}

/// DELETE /api/files/:id/tags/:tag_id - Detach a tag from a file.
pub async fn remove_file_tag(
    State(state): State<Arc<AppState>>,
    Path((file_id, tag_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    TagRepository::new(state.db.pool())
        .remove_from_file(file_id, tag_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
