//! Response DTOs for the HTTP API.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::datetime::normalize_timestamp;
use crate::file::{FileMetadataEntry, FileRecord, Folder, Tag};

/// Standard API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Folder in responses.
#[derive(Debug, Clone, Serialize)]
pub struct FolderResponse {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
}

impl From<Folder> for FolderResponse {
    fn from(folder: Folder) -> Self {
        Self {
            id: folder.id,
            name: folder.name,
            parent_id: folder.parent_id,
        }
    }
}

/// Folder with its location and contents summary.
#[derive(Debug, Serialize)]
pub struct FolderDetailResponse {
    #[serde(flatten)]
    pub folder: FolderResponse,
    /// Folders from the root down to and including this one.
    pub path: Vec<FolderResponse>,
    /// Number of files directly in the folder.
    pub file_count: i64,
}

/// File in responses.
#[derive(Debug, Clone, Serialize)]
pub struct FileResponse {
    pub id: i64,
    pub name: String,
    pub folder_id: i64,
    pub size: i64,
    pub content_type: String,
    /// `YYYY-MM-DD HH:MM:SS` UTC, or null if the stored value is malformed.
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<FileRecord> for FileResponse {
    fn from(file: FileRecord) -> Self {
        Self {
            created_at: normalize_timestamp(&file.created_at),
            updated_at: normalize_timestamp(&file.updated_at),
            id: file.id,
            name: file.name,
            folder_id: file.folder_id,
            size: file.size,
            content_type: file.content_type,
        }
    }
}

/// File with its tags and metadata.
#[derive(Debug, Serialize)]
pub struct FileDetailResponse {
    #[serde(flatten)]
    pub file: FileResponse,
    pub tags: Vec<TagResponse>,
    pub metadata: BTreeMap<String, String>,
}

/// Tag in responses.
#[derive(Debug, Clone, Serialize)]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
}

impl From<Tag> for TagResponse {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
        }
    }
}

/// Metadata entry in responses.
#[derive(Debug, Clone, Serialize)]
pub struct MetadataEntryResponse {
    pub key: String,
    pub value: String,
}

impl From<FileMetadataEntry> for MetadataEntryResponse {
    fn from(entry: FileMetadataEntry) -> Self {
        Self {
            key: entry.key,
            value: entry.value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_shape() {
        let json = serde_json::to_value(ApiResponse::new(TagResponse {
            id: 1,
            name: "work".to_string(),
        }))
        .unwrap();
        assert_eq!(json["data"]["name"], "work");
    }

    #[test]
    fn test_file_response_timestamps() {
        let record = FileRecord {
            id: 1,
            name: "a.txt".to_string(),
            folder_id: 2,
            created_at: "2024-01-15 10:30:00".to_string(),
            updated_at: "garbage".to_string(),
            size: 3,
            content_type: "text/plain".to_string(),
            storage_key: "k".to_string(),
        };

        let response = FileResponse::from(record);
        assert_eq!(response.created_at.as_deref(), Some("2024-01-15 10:30:00"));
        assert_eq!(response.updated_at, None);
    }

    #[test]
    fn test_folder_detail_flattens() {
        let detail = FolderDetailResponse {
            folder: FolderResponse {
                id: 3,
                name: "c".to_string(),
                parent_id: Some(2),
            },
            path: Vec::new(),
            file_count: 0,
        };

        let json = serde_json::to_value(detail).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["parent_id"], 2);
        assert_eq!(json["file_count"], 0);
    }
}
