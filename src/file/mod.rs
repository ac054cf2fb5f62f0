//! File management module for ByteBucket.
//!
//! This module provides the storage core:
//! - Hierarchical folders with cascade delete and cycle-safe moves
//! - File records, tags and per-file metadata
//! - Key-addressed blob storage with sidecar descriptors
//! - The service that keeps records and blobs in step

mod folder;
mod metadata;
mod record;
mod service;
pub mod storage;
mod tag;

pub use folder::{Folder, FolderRepository};
pub use metadata::{FileMetadataEntry, FileMetadataRepository};
pub use record::{FileRecord, FileRepository, NewFile};
pub use service::{parse_tag_list, BucketService, DownloadResult, UploadRequest, TAGS_FIELD};
pub use storage::{BlobDescriptor, BlobStore};
pub use tag::{Tag, TagRepository};

/// Maximum folder depth walked when checking ancestry or building paths.
pub const MAX_FOLDER_DEPTH: usize = 1000;
