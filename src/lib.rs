//! ByteBucket - personal file bucket backend
//!
//! Hierarchical folders and files with tags and per-file metadata, backed by
//! SQLite and a local blob store, served over HTTP.

pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod multipart;
pub mod web;

pub use config::Config;
pub use db::Database;
pub use error::{BucketError, ErrorKind, Result};
pub use file::{
    BlobDescriptor, BlobStore, BucketService, FileMetadataEntry, FileMetadataRepository,
    FileRecord, FileRepository, Folder, FolderRepository, NewFile, Tag, TagRepository,
    UploadRequest,
};
pub use multipart::{MultipartData, MultipartError, MultipartField, MultipartFile};
