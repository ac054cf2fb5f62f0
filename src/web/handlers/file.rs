//! File handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
    Json,
};

use crate::file::{FileMetadataRepository, FileRecord, FileRepository, TagRepository};
use crate::web::dto::{
    ApiResponse, FileDetailResponse, FileResponse, TagResponse, UpdateFileRequest,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

pub(crate) fn file_not_found(id: i64) -> ApiError {
    ApiError::not_found(format!("File {id} doesn't exist"))
}

pub(crate) async fn load_file(state: &AppState, file_id: i64) -> Result<FileRecord, ApiError> {
    FileRepository::new(state.db.pool())
        .get_by_id(file_id)
        .await?
        .ok_or_else(|| file_not_found(file_id))
}

/// Build a Content-Disposition value for a download.
///
/// Control characters are dropped from the plain `filename` parameter, and
/// names that need it get an RFC 5987 `filename*` parameter as well.
fn content_disposition_header(filename: &str) -> String {
    let needs_encoding = !filename.is_ascii()
        || filename
            .chars()
            .any(|c| c.is_control() || c == '"' || c == '\\');

    if !needs_encoding {
        return format!("attachment; filename=\"{filename}\"");
    }

    let fallback: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() => c,
            _ => '_',
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

/// POST /api/folders/:id/files - Upload files from a multipart body.
///
/// Every file part is stored; a `tags` field of comma-separated names tags
/// all of them.
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    Path(folder_id): Path<i64>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse<Vec<FileResponse>>>), ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::bad_request("Missing Content-Type header"))?;

    let files = state
        .service()
        .upload_multipart(folder_id, content_type, &body)
        .await?;

    if files.is_empty() {
        return Err(ApiError::bad_request("No file provided"));
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            files.into_iter().map(FileResponse::from).collect(),
        )),
    ))
}

/// GET /api/files/:id - Get a file with its tags and metadata.
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<i64>,
) -> Result<Json<ApiResponse<FileDetailResponse>>, ApiError> {
    let file = load_file(&state, file_id).await?;

    let tags = TagRepository::new(state.db.pool())
        .list_for_file(file_id)
        .await?;
    let metadata: BTreeMap<String, String> = FileMetadataRepository::new(state.db.pool())
        .list(file_id)
        .await?
        .into_iter()
        .map(|e| (e.key, e.value))
        .collect();

    Ok(Json(ApiResponse::new(FileDetailResponse {
        file: file.into(),
        tags: tags.into_iter().map(TagResponse::from).collect(),
        metadata,
    })))
}

/// PATCH /api/files/:id - Rename and/or move a file.
pub async fn update_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<i64>,
    Json(req): Json<UpdateFileRequest>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    FileRepository::new(state.db.pool())
        .update(file_id, req.name.as_deref(), req.folder_id)
        .await?;

    let file = load_file(&state, file_id).await?;
    Ok(Json(ApiResponse::new(file.into())))
}

/// DELETE /api/files/:id - Delete a file and its blob.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.service().delete_file(file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/files/:id/download - Download file content.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<i64>,
) -> Result<Response<Body>, ApiError> {
    let download = state.service().download(file_id).await?;

    Response::builder()
        .header(header::CONTENT_TYPE, &download.file.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&download.file.name),
        )
        .header(header::CONTENT_LENGTH, download.content.len())
        .body(Body::from(download.content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}
