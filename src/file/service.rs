//! Bucket service for ByteBucket.
//!
//! This module composes the blob store and the metadata repositories:
//! - Upload: blob first, then the file row, then tags
//! - Download: file row, then blob
//! - Deletion: blobs first, then rows

use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::ErrorKind;
use crate::multipart::{self, MultipartError};
use crate::{BucketError, Result};

use super::folder::FolderRepository;
use super::record::{FileRecord, FileRepository, NewFile};
use super::storage::BlobStore;
use super::tag::TagRepository;

/// Name of the form field carrying comma-separated tag names.
pub const TAGS_FIELD: &str = "tags";

/// Request data for file upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Folder ID to upload to.
    pub folder_id: i64,
    /// Original filename.
    pub filename: String,
    /// Declared content type.
    pub content_type: String,
    /// File content.
    pub content: Vec<u8>,
    /// Tag names to attach, created on demand.
    pub tags: Vec<String>,
}

impl UploadRequest {
    /// Create a new upload request.
    pub fn new(
        folder_id: i64,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        Self {
            folder_id,
            filename: filename.into(),
            content_type: content_type.into(),
            content,
            tags: Vec::new(),
        }
    }

    /// Set the tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Result of a file download.
#[derive(Debug)]
pub struct DownloadResult {
    /// File record.
    pub file: FileRecord,
    /// File content.
    pub content: Vec<u8>,
}

/// Service tying file records to their blobs.
pub struct BucketService<'a> {
    db: &'a Database,
    storage: &'a BlobStore,
}

impl<'a> BucketService<'a> {
    /// Create a new BucketService.
    pub fn new(db: &'a Database, storage: &'a BlobStore) -> Self {
        Self { db, storage }
    }

    /// Upload a file.
    ///
    /// If the file row cannot be created (or tagging fails) the blob is
    /// removed again, so a failed upload leaves nothing behind.
    pub async fn upload(&self, request: &UploadRequest) -> Result<FileRecord> {
        if request.filename.is_empty() {
            return Err(BucketError::NotNullConstraint(
                "File name cannot be empty".to_string(),
            ));
        }

        let storage_key =
            self.storage
                .put(&request.filename, &request.content, &request.content_type)?;

        let new_file = NewFile::new(
            &request.filename,
            request.folder_id,
            request.content.len() as i64,
            &request.content_type,
            &storage_key,
        );

        let files = FileRepository::new(self.db.pool());
        let file = match files.create(&new_file).await {
            Ok(file) => file,
            Err(e) => {
                self.discard_blob(&storage_key);
                return Err(e);
            }
        };

        if let Err(e) = self.apply_tags(file.id, &request.tags).await {
            if let Err(cleanup) = files.delete(file.id).await {
                warn!(file_id = file.id, "Failed to roll back file row: {}", cleanup);
            }
            self.discard_blob(&storage_key);
            return Err(e);
        }

        info!(
            file_id = file.id,
            folder_id = file.folder_id,
            size = file.size,
            "Uploaded file {}",
            file.name
        );
        Ok(file)
    }

    /// Upload every file part of a multipart body.
    ///
    /// The `tags` field, if present, applies to all uploaded files. Parts are
    /// uploaded in order; on failure the files uploaded before it are kept.
    pub async fn upload_multipart(
        &self,
        folder_id: i64,
        content_type_header: &str,
        body: &[u8],
    ) -> Result<Vec<FileRecord>> {
        let boundary =
            multipart::extract_boundary(content_type_header).ok_or(MultipartError::MissingBoundary)?;
        let data = multipart::decode(body, &boundary)?;

        let tags = data.field(TAGS_FIELD).map(parse_tag_list).unwrap_or_default();
        debug!(
            folder_id,
            parts = data.files.len(),
            "Decoded multipart upload"
        );

        let mut uploaded = Vec::with_capacity(data.files.len());
        for part in data.files {
            let request = UploadRequest::new(folder_id, part.filename, part.content_type, part.content)
                .with_tags(tags.iter().cloned());
            uploaded.push(self.upload(&request).await?);
        }
        Ok(uploaded)
    }

    /// Download a file.
    pub async fn download(&self, file_id: i64) -> Result<DownloadResult> {
        let file = FileRepository::new(self.db.pool())
            .get_by_id(file_id)
            .await?
            .ok_or_else(|| file_not_found(file_id))?;

        let content = self.storage.get(&file.storage_key)?;
        Ok(DownloadResult { file, content })
    }

    /// Delete a file: its blob first, then its row (tags and metadata cascade).
    pub async fn delete_file(&self, file_id: i64) -> Result<()> {
        let files = FileRepository::new(self.db.pool());
        let file = files
            .get_by_id(file_id)
            .await?
            .ok_or_else(|| file_not_found(file_id))?;

        self.delete_blob(&file.storage_key)?;
        files.delete(file_id).await?;

        info!(file_id, "Deleted file {}", file.name);
        Ok(())
    }

    /// Delete a folder subtree: every blob in it, then the folder itself.
    pub async fn delete_folder(&self, folder_id: i64) -> Result<()> {
        let folders = FolderRepository::new(self.db.pool());
        if folders.get_by_id(folder_id).await?.is_none() {
            return Err(BucketError::NoRowsAffected(format!(
                "Folder {folder_id} doesn't exist"
            )));
        }

        let keys = folders.list_subtree_file_storage_keys(folder_id).await?;
        for key in &keys {
            self.delete_blob(key)?;
        }
        folders.delete(folder_id).await?;

        info!(folder_id, blobs = keys.len(), "Deleted folder subtree");
        Ok(())
    }

    async fn apply_tags(&self, file_id: i64, names: &[String]) -> Result<()> {
        let tags = TagRepository::new(self.db.pool());
        let mut seen = Vec::new();

        for name in names {
            let tag = tags.get_or_create(name).await?;
            if seen.contains(&tag.id) {
                continue;
            }
            tags.add_to_file(file_id, tag.id).await?;
            seen.push(tag.id);
        }
        Ok(())
    }

    /// Delete a blob, tolerating one that is already gone.
    fn delete_blob(&self, key: &str) -> Result<()> {
        match self.storage.delete(key) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NoRowsAffected => {
                warn!("Blob {} was already missing", key);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn discard_blob(&self, key: &str) {
        if let Err(e) = self.storage.delete(key) {
            warn!("Failed to discard blob {}: {}", key, e);
        }
    }
}

/// Split a comma-separated tag list, trimming names and dropping empty ones.
pub fn parse_tag_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn file_not_found(id: i64) -> BucketError {
    BucketError::NoRowsAffected(format!("File {id} doesn't exist"))
}
