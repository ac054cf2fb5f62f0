//! Blob storage for ByteBucket.
//!
//! Payloads live flat under the storage root, each next to a sidecar
//! descriptor:
//! ```text
//! {root}/
//! ├── 18d2f6a01b3_4f9c0e...        payload bytes
//! ├── 18d2f6a01b3_4f9c0e....meta   original_filename=..., content_type=..., ...
//! └── ...
//! ```
//! Blobs know nothing about folders or file names; the metadata store binds
//! them to files through the storage key.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::datetime::format_timestamp;
use crate::{BucketError, Result};

/// Extension of the sidecar descriptor file.
const SIDECAR_EXTENSION: &str = "meta";

/// Longest key accepted from callers.
const MAX_KEY_LENGTH: usize = 128;

/// Descriptor stored alongside each payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobDescriptor {
    pub original_filename: String,
    pub content_type: String,
    pub size: u64,
    pub uploaded_at: String,
}

impl BlobDescriptor {
    fn to_sidecar(&self) -> String {
        format!(
            "original_filename={}\ncontent_type={}\nsize={}\nuploaded_at={}\n",
            single_line(&self.original_filename),
            single_line(&self.content_type),
            self.size,
            self.uploaded_at
        )
    }

    fn from_sidecar(text: &str) -> Option<Self> {
        let mut original_filename = None;
        let mut content_type = None;
        let mut size = None;
        let mut uploaded_at = None;

        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key {
                "original_filename" => original_filename = Some(value.to_string()),
                "content_type" => content_type = Some(value.to_string()),
                "size" => size = value.parse().ok(),
                "uploaded_at" => uploaded_at = Some(value.to_string()),
                _ => {}
            }
        }

        Some(Self {
            original_filename: original_filename?,
            content_type: content_type?,
            size: size?,
            uploaded_at: uploaded_at?,
        })
    }
}

/// Key-addressed blob storage on the local filesystem.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Create a BlobStore rooted at the given directory.
    ///
    /// Nothing is touched on disk until [`initialize`](Self::initialize) or
    /// the first [`put`](Self::put).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage root if it doesn't exist. Safe to call repeatedly.
    pub fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Store a payload and return its new storage key.
    ///
    /// The payload is written to a temporary file and renamed into place, and
    /// the sidecar is written the same way. On failure nothing is left behind.
    pub fn put(&self, original_name: &str, content: &[u8], content_type: &str) -> Result<String> {
        self.initialize()?;

        let key = generate_key();
        let descriptor = BlobDescriptor {
            original_filename: original_name.to_string(),
            content_type: content_type.to_string(),
            size: content.len() as u64,
            uploaded_at: format_timestamp(&Utc::now()),
        };

        let payload_path = self.payload_path(&key);
        self.write_atomically(&key, &payload_path, content)?;

        let sidecar_path = self.sidecar_path(&key);
        if let Err(e) = self.write_atomically(&key, &sidecar_path, descriptor.to_sidecar().as_bytes())
        {
            let _ = fs::remove_file(&payload_path);
            return Err(e);
        }

        debug!("Stored blob {} ({} bytes)", key, content.len());
        Ok(key)
    }

    /// Check whether a payload exists for the key.
    pub fn exists(&self, key: &str) -> bool {
        is_valid_key(key) && self.payload_path(key).is_file()
    }

    /// Get the on-disk payload path, if the payload exists.
    pub fn path(&self, key: &str) -> Option<PathBuf> {
        if self.exists(key) {
            Some(self.payload_path(key))
        } else {
            None
        }
    }

    /// Read a payload.
    pub fn get(&self, key: &str) -> Result<Vec<u8>> {
        if !is_valid_key(key) {
            return Err(blob_not_found(key));
        }

        match fs::read(self.payload_path(key)) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(blob_not_found(key)),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the sidecar descriptor of a blob.
    pub fn descriptor(&self, key: &str) -> Result<BlobDescriptor> {
        if !is_valid_key(key) {
            return Err(blob_not_found(key));
        }

        let text = match fs::read_to_string(self.sidecar_path(key)) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(blob_not_found(key)),
            Err(e) => return Err(e.into()),
        };

        BlobDescriptor::from_sidecar(&text)
            .ok_or_else(|| BucketError::Database(format!("Malformed descriptor for blob {key}")))
    }

    /// Delete a payload and its sidecar.
    pub fn delete(&self, key: &str) -> Result<()> {
        if !is_valid_key(key) {
            return Err(blob_not_found(key));
        }

        match fs::remove_file(self.payload_path(key)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(blob_not_found(key)),
            Err(e) => return Err(e.into()),
        }

        match fs::remove_file(self.sidecar_path(key)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Blob {} had no descriptor", key);
            }
            Err(e) => return Err(e.into()),
        }

        debug!("Deleted blob {}", key);
        Ok(())
    }

    fn payload_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn sidecar_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{SIDECAR_EXTENSION}"))
    }

    fn write_atomically(&self, key: &str, target: &Path, content: &[u8]) -> Result<()> {
        let temp_path = self.root.join(format!(
            ".{key}.{}.tmp",
            Uuid::new_v4().simple()
        ));

        let result = (|| -> io::Result<()> {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content)?;
            file.sync_all()?;
            fs::rename(&temp_path, target)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Generate a storage key: creation time in milliseconds (hex), then 128
/// random bits.
fn generate_key() -> String {
    let millis = Utc::now().timestamp_millis().max(0);
    format!("{:x}_{}", millis, Uuid::new_v4().simple())
}

/// Keys may only contain the characters generated keys are made of.
fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_KEY_LENGTH
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

fn blob_not_found(key: &str) -> BucketError {
    BucketError::NoRowsAffected(format!("Blob {key} doesn't exist"))
}
