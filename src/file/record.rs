//! File records and repository for ByteBucket.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::datetime::{now_timestamp, parse_timestamp};
use crate::db::begin_write;
use crate::error::ConstraintMessages;
use crate::{BucketError, Result};

const FILE_CONSTRAINTS: ConstraintMessages = ConstraintMessages {
    foreign_key: "Parent folder doesn't exist",
    unique: "A file with this storage ID already exists",
    not_null: "File name cannot be empty",
};

const SELECT_FILE: &str = "SELECT id, name, folder_id, created_at, updated_at, size, content_type, storage_id FROM files";

/// Metadata row describing a stored file.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FileRecord {
    /// Unique file ID.
    pub id: i64,
    /// File name shown to users.
    pub name: String,
    /// Owning folder.
    pub folder_id: i64,
    /// Creation time (`YYYY-MM-DD HH:MM:SS`, UTC).
    pub created_at: String,
    /// Last modification time (`YYYY-MM-DD HH:MM:SS`, UTC).
    pub updated_at: String,
    /// Size in bytes.
    pub size: i64,
    /// Declared MIME type.
    pub content_type: String,
    /// Key of the payload in the blob store.
    #[sqlx(rename = "storage_id")]
    pub storage_key: String,
}

impl FileRecord {
    /// Get the created_at as DateTime<Utc>, if well formed.
    pub fn created_at_datetime(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }

    /// Get the updated_at as DateTime<Utc>, if well formed.
    pub fn updated_at_datetime(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.updated_at)
    }
}

/// Data for creating a new file record.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub name: String,
    pub folder_id: i64,
    pub size: i64,
    pub content_type: String,
    pub storage_key: String,
}

impl NewFile {
    /// Create a new NewFile.
    pub fn new(
        name: impl Into<String>,
        folder_id: i64,
        size: i64,
        content_type: impl Into<String>,
        storage_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            folder_id,
            size,
            content_type: content_type.into(),
            storage_key: storage_key.into(),
        }
    }
}

/// Repository for file record operations.
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new file record. Both timestamps are set to now.
    pub async fn create(&self, file: &NewFile) -> Result<FileRecord> {
        validate_name(&file.name)?;
        let now = now_timestamp();

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO files (name, folder_id, created_at, updated_at, size, content_type, storage_id)
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&file.name)
        .bind(file.folder_id)
        .bind(&now)
        .bind(&now)
        .bind(file.size)
        .bind(&file.content_type)
        .bind(&file.storage_key)
        .fetch_one(self.pool)
        .await
        .map_err(|e| BucketError::from_sqlx(e, &FILE_CONSTRAINTS))?;

        debug!(file_id = id, folder_id = file.folder_id, "Created file record");
        Ok(FileRecord {
            id,
            name: file.name.clone(),
            folder_id: file.folder_id,
            created_at: now.clone(),
            updated_at: now,
            size: file.size,
            content_type: file.content_type.clone(),
            storage_key: file.storage_key.clone(),
        })
    }

    /// Get a file by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<FileRecord>> {
        let file = sqlx::query_as::<_, FileRecord>(&format!("{SELECT_FILE} WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(file)
    }

    /// Get a file by its blob storage key.
    pub async fn get_by_storage_key(&self, storage_key: &str) -> Result<Option<FileRecord>> {
        let file = sqlx::query_as::<_, FileRecord>(&format!("{SELECT_FILE} WHERE storage_id = ?"))
            .bind(storage_key)
            .fetch_optional(self.pool)
            .await?;
        Ok(file)
    }

    /// List files in a folder ordered by name.
    pub async fn list_by_folder(&self, folder_id: i64) -> Result<Vec<FileRecord>> {
        let files = sqlx::query_as::<_, FileRecord>(&format!(
            "{SELECT_FILE} WHERE folder_id = ? ORDER BY name, id"
        ))
        .bind(folder_id)
        .fetch_all(self.pool)
        .await?;
        Ok(files)
    }

    /// Count files directly inside a folder.
    pub async fn count_by_folder(&self, folder_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE folder_id = ?")
            .bind(folder_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Refresh only the updated_at timestamp.
    pub async fn touch(&self, id: i64) -> Result<()> {
        let result = sqlx::query("UPDATE files SET updated_at = ? WHERE id = ?")
            .bind(now_timestamp())
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(file_not_found(id));
        }
        Ok(())
    }

    /// Rename a file. The name must be free within its folder.
    pub async fn rename(&self, id: i64, new_name: &str) -> Result<()> {
        self.update(id, Some(new_name), None).await
    }

    /// Move a file into another folder. Its name must be free there.
    pub async fn move_to(&self, id: i64, folder_id: i64) -> Result<()> {
        self.update(id, None, Some(folder_id)).await
    }

    /// Rename and/or move a file as one change, refreshing updated_at.
    ///
    /// The resulting name must be free in the resulting folder. Either both
    /// parts apply or neither does.
    pub async fn update(
        &self,
        id: i64,
        new_name: Option<&str>,
        new_folder_id: Option<i64>,
    ) -> Result<()> {
        if let Some(name) = new_name {
            validate_name(name)?;
        }

        let mut tx = begin_write(self.pool).await?;

        let (name, folder_id): (String, i64) =
            sqlx::query_as("SELECT name, folder_id FROM files WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| file_not_found(id))?;

        let name = new_name.map(str::to_string).unwrap_or(name);
        let folder_id = new_folder_id.unwrap_or(folder_id);
        ensure_name_free(&mut tx, folder_id, &name, id).await?;

        sqlx::query("UPDATE files SET name = ?, folder_id = ?, updated_at = ? WHERE id = ?")
            .bind(&name)
            .bind(folder_id)
            .bind(now_timestamp())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| BucketError::from_sqlx(e, &FILE_CONSTRAINTS))?;

        tx.commit().await?;
        debug!(file_id = id, folder_id, "Updated file");
        Ok(())
    }

    /// Delete a file record, cascading its tag associations and metadata.
    ///
    /// The blob referenced by the record must be removed by the caller first.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(file_not_found(id));
        }
        Ok(())
    }
}

async fn ensure_name_free(
    conn: &mut SqliteConnection,
    folder_id: i64,
    name: &str,
    except_id: i64,
) -> Result<()> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM files WHERE folder_id = ? AND name = ? AND id <> ?)",
    )
    .bind(folder_id)
    .bind(name)
    .bind(except_id)
    .fetch_one(conn)
    .await?;

    if taken {
        return Err(BucketError::UniqueConstraint(
            "A file with this name already exists in the target folder".to_string(),
        ));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(BucketError::NotNullConstraint(
            FILE_CONSTRAINTS.not_null.to_string(),
        ));
    }
    Ok(())
}

fn file_not_found(id: i64) -> BucketError {
    BucketError::NoRowsAffected(format!("File {id} doesn't exist"))
}
