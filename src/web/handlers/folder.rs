//! Folder handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::file::{FileRepository, FolderRepository};
use crate::web::dto::{
    ApiResponse, CreateFolderRequest, FileResponse, FolderDetailResponse, FolderListQuery,
    FolderResponse, UpdateFolderRequest,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

fn folder_not_found(id: i64) -> ApiError {
    ApiError::not_found(format!("Folder {id} doesn't exist"))
}

/// GET /api/folders - List the children of a folder, or the root folders.
pub async fn list_folders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FolderListQuery>,
) -> Result<Json<ApiResponse<Vec<FolderResponse>>>, ApiError> {
    let repo = FolderRepository::new(state.db.pool());

    if let Some(parent_id) = query.parent_id {
        if repo.get_by_id(parent_id).await?.is_none() {
            return Err(folder_not_found(parent_id));
        }
    }

    let folders = repo.list_children(query.parent_id).await?;
    Ok(Json(ApiResponse::new(
        folders.into_iter().map(FolderResponse::from).collect(),
    )))
}

/// POST /api/folders - Create a folder.
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FolderResponse>>), ApiError> {
    let folder = FolderRepository::new(state.db.pool())
        .create(&req.name, req.parent_id)
        .await?;

    tracing::info!(folder_id = folder.id, "Created folder {}", folder.name);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(FolderResponse::from(folder))),
    ))
}

/// GET /api/folders/:id - Get a folder with its path and file count.
pub async fn get_folder(
    State(state): State<Arc<AppState>>,
    Path(folder_id): Path<i64>,
) -> Result<Json<ApiResponse<FolderDetailResponse>>, ApiError> {
    let repo = FolderRepository::new(state.db.pool());
    let folder = repo
        .get_by_id(folder_id)
        .await?
        .ok_or_else(|| folder_not_found(folder_id))?;

    let path = repo.get_path(folder_id).await?;
    let file_count = FileRepository::new(state.db.pool())
        .count_by_folder(folder_id)
        .await?;

    Ok(Json(ApiResponse::new(FolderDetailResponse {
        folder: folder.into(),
        path: path.into_iter().map(FolderResponse::from).collect(),
        file_count,
    })))
}

/// PATCH /api/folders/:id - Rename and/or move a folder.
pub async fn update_folder(
    State(state): State<Arc<AppState>>,
    Path(folder_id): Path<i64>,
    Json(req): Json<UpdateFolderRequest>,
) -> Result<Json<ApiResponse<FolderResponse>>, ApiError> {
    let repo = FolderRepository::new(state.db.pool());

    repo.update(folder_id, req.name.as_deref(), req.parent_id).await?;

    let folder = repo
        .get_by_id(folder_id)
        .await?
        .ok_or_else(|| folder_not_found(folder_id))?;
    Ok(Json(ApiResponse::new(folder.into())))
}

/// DELETE /api/folders/:id - Delete a folder subtree and its blobs.
pub async fn delete_folder(
    State(state): State<Arc<AppState>>,
    Path(folder_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.service().delete_folder(folder_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/folders/:id/files - List the files directly in a folder.
pub async fn list_folder_files(
    State(state): State<Arc<AppState>>,
    Path(folder_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>, ApiError> {
    if FolderRepository::new(state.db.pool())
        .get_by_id(folder_id)
        .await?
        .is_none()
    {
        return Err(folder_not_found(folder_id));
    }

    let files = FileRepository::new(state.db.pool())
        .list_by_folder(folder_id)
        .await?;
    Ok(Json(ApiResponse::new(
        files.into_iter().map(FileResponse::from).collect(),
    )))
}
