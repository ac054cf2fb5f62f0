//! Tags and file-tag associations.

use sqlx::SqlitePool;

use crate::error::ConstraintMessages;
use crate::{BucketError, Result};

const TAG_CONSTRAINTS: ConstraintMessages = ConstraintMessages {
    foreign_key: "Tag doesn't exist",
    unique: "A tag with this name already exists",
    not_null: "Tag name cannot be empty",
};

const FILE_TAG_CONSTRAINTS: ConstraintMessages = ConstraintMessages {
    foreign_key: "File or tag doesn't exist",
    unique: "File already has this tag",
    not_null: "File tag requires both a file and a tag",
};

/// A tag. Names are unique and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Repository for tags and their association with files.
pub struct TagRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TagRepository<'a> {
    /// Create a new TagRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a tag.
    pub async fn create(&self, name: &str) -> Result<Tag> {
        validate_name(name)?;

        let id: i64 = sqlx::query_scalar("INSERT INTO tags (name) VALUES (?) RETURNING id")
            .bind(name)
            .fetch_one(self.pool)
            .await
            .map_err(|e| BucketError::from_sqlx(e, &TAG_CONSTRAINTS))?;

        Ok(Tag {
            id,
            name: name.to_string(),
        })
    }

    /// Return the tag with this name, creating it if needed.
    pub async fn get_or_create(&self, name: &str) -> Result<Tag> {
        validate_name(name)?;

        sqlx::query("INSERT INTO tags (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
            .bind(name)
            .execute(self.pool)
            .await
            .map_err(|e| BucketError::from_sqlx(e, &TAG_CONSTRAINTS))?;

        self.get_by_name(name)
            .await?
            .ok_or_else(|| BucketError::Database(format!("tag '{name}' vanished after insert")))
    }

    /// Get a tag by name (exact, case-sensitive match).
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE name = ?")
            .bind(name)
            .fetch_optional(self.pool)
            .await?;
        Ok(tag)
    }

    /// Get a tag by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(tag)
    }

    /// List all tags ordered by name.
    pub async fn list(&self) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags ORDER BY name")
            .fetch_all(self.pool)
            .await?;
        Ok(tags)
    }

    /// Attach a tag to a file.
    pub async fn add_to_file(&self, file_id: i64, tag_id: i64) -> Result<()> {
        sqlx::query("INSERT INTO file_tags (file_id, tag_id) VALUES (?, ?)")
            .bind(file_id)
            .bind(tag_id)
            .execute(self.pool)
            .await
            .map_err(|e| BucketError::from_sqlx(e, &FILE_TAG_CONSTRAINTS))?;
        Ok(())
    }

    /// Detach a tag from a file.
    pub async fn remove_from_file(&self, file_id: i64, tag_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM file_tags WHERE file_id = ? AND tag_id = ?")
            .bind(file_id)
            .bind(tag_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(BucketError::NoRowsAffected(
                "File tag association not found".to_string(),
            ));
        }
        Ok(())
    }

    /// List the tags of a file alphabetically. Unknown files have no tags.
    pub async fn list_for_file(&self, file_id: i64) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            "SELECT t.id, t.name FROM tags t
             JOIN file_tags ft ON ft.tag_id = t.id
             WHERE ft.file_id = ?
             ORDER BY t.name",
        )
        .bind(file_id)
        .fetch_all(self.pool)
        .await?;
        Ok(tags)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(BucketError::NotNullConstraint(
            TAG_CONSTRAINTS.not_null.to_string(),
        ));
    }
    Ok(())
}
