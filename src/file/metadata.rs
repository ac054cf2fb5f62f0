//! Per-file key/value metadata.

use sqlx::SqlitePool;

use crate::error::ConstraintMessages;
use crate::{BucketError, Result};

const METADATA_CONSTRAINTS: ConstraintMessages = ConstraintMessages {
    foreign_key: "File doesn't exist",
    unique: "Metadata key already exists for this file",
    not_null: "Metadata key cannot be empty",
};

/// A single metadata entry of a file.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FileMetadataEntry {
    pub key: String,
    pub value: String,
}

/// Repository for file metadata. Writes are upserts keyed by `(file, key)`.
pub struct FileMetadataRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileMetadataRepository<'a> {
    /// Create a new FileMetadataRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Set a metadata value, overwriting any previous value for the key.
    pub async fn set(&self, file_id: i64, key: &str, value: &str) -> Result<()> {
        if key.is_empty() {
            return Err(BucketError::NotNullConstraint(
                METADATA_CONSTRAINTS.not_null.to_string(),
            ));
        }

        sqlx::query(
            "INSERT INTO file_metadata (file_id, key, value) VALUES (?, ?, ?)
             ON CONFLICT(file_id, key) DO UPDATE SET value = excluded.value",
        )
        .bind(file_id)
        .bind(key)
        .bind(value)
        .execute(self.pool)
        .await
        .map_err(|e| BucketError::from_sqlx(e, &METADATA_CONSTRAINTS))?;

        Ok(())
    }

    /// Get a metadata value.
    pub async fn get(&self, file_id: i64, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar("SELECT value FROM file_metadata WHERE file_id = ? AND key = ?")
            .bind(file_id)
            .bind(key)
            .fetch_optional(self.pool)
            .await?;
        Ok(value)
    }

    /// List all entries of a file ordered by key. Unknown files have none.
    pub async fn list(&self, file_id: i64) -> Result<Vec<FileMetadataEntry>> {
        let entries = sqlx::query_as::<_, FileMetadataEntry>(
            "SELECT key, value FROM file_metadata WHERE file_id = ? ORDER BY key",
        )
        .bind(file_id)
        .fetch_all(self.pool)
        .await?;
        Ok(entries)
    }

    /// Remove a metadata entry.
    pub async fn remove(&self, file_id: i64, key: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM file_metadata WHERE file_id = ? AND key = ?")
            .bind(file_id)
            .bind(key)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(BucketError::NoRowsAffected("Metadata not found".to_string()));
        }
        Ok(())
    }
}
