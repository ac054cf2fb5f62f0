//! Folder types and repository for ByteBucket.

use std::collections::{HashSet, VecDeque};

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::db::begin_write;
use crate::error::ConstraintMessages;
use crate::{BucketError, Result};

use super::MAX_FOLDER_DEPTH;

const FOLDER_CONSTRAINTS: ConstraintMessages = ConstraintMessages {
    foreign_key: "Parent folder doesn't exist",
    unique: "A folder with this name already exists in the parent directory",
    not_null: "Folder name cannot be empty",
};

/// A folder in the bucket.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Folder {
    /// Unique folder ID.
    pub id: i64,
    /// Folder name.
    pub name: String,
    /// Parent folder ID (None for root folders).
    pub parent_id: Option<i64>,
}

/// Repository for folder operations.
pub struct FolderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FolderRepository<'a> {
    /// Create a new FolderRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new folder.
    ///
    /// Fails if the folder would sit deeper than [`MAX_FOLDER_DEPTH`].
    pub async fn create(&self, name: &str, parent_id: Option<i64>) -> Result<Folder> {
        validate_name(name)?;

        let mut tx = begin_write(self.pool).await?;

        if let Some(parent) = parent_id {
            if depth_of(&mut tx, parent).await? + 1 > MAX_FOLDER_DEPTH {
                return Err(depth_limit_reached());
            }
        }

        let id: i64 =
            sqlx::query_scalar("INSERT INTO folders (name, parent_id) VALUES (?, ?) RETURNING id")
                .bind(name)
                .bind(parent_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| BucketError::from_sqlx(e, &FOLDER_CONSTRAINTS))?;

        tx.commit().await?;
        debug!(folder_id = id, ?parent_id, "Created folder");
        Ok(Folder {
            id,
            name: name.to_string(),
            parent_id,
        })
    }

    /// Get a folder by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Folder>> {
        let folder =
            sqlx::query_as::<_, Folder>("SELECT id, name, parent_id FROM folders WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(folder)
    }

    /// List the children of a folder ordered by name.
    ///
    /// `None` lists the root level.
    pub async fn list_children(&self, parent_id: Option<i64>) -> Result<Vec<Folder>> {
        let folders = sqlx::query_as::<_, Folder>(
            "SELECT id, name, parent_id FROM folders WHERE parent_id IS ? ORDER BY name, id",
        )
        .bind(parent_id)
        .fetch_all(self.pool)
        .await?;

        Ok(folders)
    }

    /// Rename a folder.
    pub async fn rename(&self, id: i64, new_name: &str) -> Result<()> {
        self.update(id, Some(new_name), None).await
    }

    /// Move a folder under a new parent (`None` moves it to the root level).
    ///
    /// Fails if the new parent is the folder itself or one of its descendants,
    /// or if the moved subtree would reach deeper than [`MAX_FOLDER_DEPTH`].
    pub async fn move_to(&self, id: i64, new_parent_id: Option<i64>) -> Result<()> {
        self.update(id, None, Some(new_parent_id)).await
    }

    /// Rename and/or move a folder as one change.
    ///
    /// `new_parent_id` is `None` to keep the current parent and `Some(None)`
    /// to move to the root level. Either both parts apply or neither does.
    pub async fn update(
        &self,
        id: i64,
        new_name: Option<&str>,
        new_parent_id: Option<Option<i64>>,
    ) -> Result<()> {
        if let Some(name) = new_name {
            validate_name(name)?;
        }

        let mut tx = begin_write(self.pool).await?;

        if parent_of(&mut tx, id).await?.is_none() {
            return Err(folder_not_found(id));
        }
        if let Some(target) = new_parent_id {
            check_new_parent(&mut tx, id, target).await?;
        }

        sqlx::query(
            "UPDATE folders
             SET name = COALESCE(?, name),
                 parent_id = CASE WHEN ? THEN ? ELSE parent_id END
             WHERE id = ?",
        )
        .bind(new_name)
        .bind(new_parent_id.is_some())
        .bind(new_parent_id.flatten())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| BucketError::from_sqlx(e, &FOLDER_CONSTRAINTS))?;

        tx.commit().await?;
        debug!(folder_id = id, ?new_name, ?new_parent_id, "Updated folder");
        Ok(())
    }

    /// Delete a folder together with every descendant folder and every file in
    /// the subtree.
    ///
    /// Folders are removed deepest first inside one transaction, so each
    /// statement only cascades to the files of a single folder.
    /// Blobs referenced by those files are not touched; see
    /// [`BucketService::delete_folder`](super::BucketService::delete_folder).
    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = begin_write(self.pool).await?;

        let subtree = subtree_levels(&mut tx, id).await?;
        if subtree.is_empty() {
            return Err(folder_not_found(id));
        }

        for (folder_id, _) in subtree.iter().rev() {
            sqlx::query("DELETE FROM folders WHERE id = ?")
                .bind(*folder_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!(folder_id = id, folders = subtree.len(), "Deleted folder subtree");
        Ok(())
    }

    /// Get the path from the root to a folder.
    pub async fn get_path(&self, id: i64) -> Result<Vec<Folder>> {
        let mut path = Vec::new();
        let mut current_id = Some(id);

        while let Some(folder_id) = current_id {
            if path.len() > MAX_FOLDER_DEPTH {
                return Err(depth_exceeded());
            }
            match self.get_by_id(folder_id).await? {
                Some(folder) => {
                    current_id = folder.parent_id;
                    path.push(folder);
                }
                None => break,
            }
        }

        path.reverse();
        Ok(path)
    }

    /// Collect the storage keys of every file in a folder's subtree.
    ///
    /// The folder itself is included. Returns an empty list for an unknown folder.
    pub async fn list_subtree_file_storage_keys(&self, id: i64) -> Result<Vec<String>> {
        let mut conn = self.pool.acquire().await?;
        let subtree = subtree_levels(&mut conn, id).await?;

        let mut keys = Vec::new();
        for (folder_id, _) in subtree {
            let mut batch: Vec<String> =
                sqlx::query_scalar("SELECT storage_id FROM files WHERE folder_id = ? ORDER BY id")
                    .bind(folder_id)
                    .fetch_all(&mut *conn)
                    .await?;
            keys.append(&mut batch);
        }

        Ok(keys)
    }
}

/// Look up the parent of a folder.
///
/// Outer `None` means the folder doesn't exist; `Some(None)` is a root folder.
async fn parent_of(conn: &mut SqliteConnection, id: i64) -> Result<Option<Option<i64>>> {
    let parent = sqlx::query_scalar::<_, Option<i64>>("SELECT parent_id FROM folders WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(parent)
}

/// Check whether `ancestor` appears on the ancestor chain of `folder` (or is `folder`).
async fn is_ancestor_or_self(conn: &mut SqliteConnection, ancestor: i64, folder: i64) -> Result<bool> {
    let mut current = Some(folder);
    let mut steps = 0;

    while let Some(id) = current {
        if id == ancestor {
            return Ok(true);
        }
        steps += 1;
        if steps > MAX_FOLDER_DEPTH {
            return Err(depth_exceeded());
        }
        current = parent_of(conn, id).await?.flatten();
    }

    Ok(false)
}

/// Number of folders on the chain from the root down to `id`, inclusive.
///
/// Counting stops once it passes [`MAX_FOLDER_DEPTH`].
async fn depth_of(conn: &mut SqliteConnection, id: i64) -> Result<usize> {
    let mut depth = 0;
    let mut current = Some(id);

    while let Some(folder_id) = current {
        depth += 1;
        if depth > MAX_FOLDER_DEPTH {
            break;
        }
        current = parent_of(conn, folder_id).await?.flatten();
    }

    Ok(depth)
}

/// Reject a new parent that would create a cycle or break the depth bound.
async fn check_new_parent(conn: &mut SqliteConnection, id: i64, target: Option<i64>) -> Result<()> {
    let parent_depth = match target {
        Some(target) if target == id => {
            return Err(BucketError::ForeignKeyConstraint(
                "Cannot move a folder into itself".to_string(),
            ));
        }
        Some(target) => {
            if is_ancestor_or_self(conn, id, target).await? {
                return Err(BucketError::ForeignKeyConstraint(
                    "Cannot move a folder into one of its descendants".to_string(),
                ));
            }
            depth_of(conn, target).await?
        }
        None => 0,
    };

    let height = subtree_levels(conn, id)
        .await?
        .iter()
        .map(|(_, level)| level + 1)
        .max()
        .unwrap_or(1);

    if parent_depth + height > MAX_FOLDER_DEPTH {
        return Err(depth_limit_reached());
    }
    Ok(())
}

/// Breadth-first list of the folders in a subtree with their level below
/// `root` (0 for `root` itself). Empty for an unknown folder.
async fn subtree_levels(conn: &mut SqliteConnection, root: i64) -> Result<Vec<(i64, usize)>> {
    if parent_of(conn, root).await?.is_none() {
        return Ok(Vec::new());
    }

    let mut subtree = Vec::new();
    let mut seen = HashSet::from([root]);
    let mut queue = VecDeque::from([(root, 0usize)]);

    while let Some((id, level)) = queue.pop_front() {
        subtree.push((id, level));

        let children: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM folders WHERE parent_id = ? ORDER BY id")
                .bind(id)
                .fetch_all(&mut *conn)
                .await?;
        for child in children {
            if seen.insert(child) {
                queue.push_back((child, level + 1));
            }
        }
    }

    Ok(subtree)
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(BucketError::NotNullConstraint(
            FOLDER_CONSTRAINTS.not_null.to_string(),
        ));
    }
    Ok(())
}

fn folder_not_found(id: i64) -> BucketError {
    BucketError::NoRowsAffected(format!("Folder {id} doesn't exist"))
}

fn depth_limit_reached() -> BucketError {
    BucketError::ForeignKeyConstraint(format!(
        "Folder hierarchy would exceed the maximum depth of {MAX_FOLDER_DEPTH}"
    ))
}

fn depth_exceeded() -> BucketError {
    BucketError::Database(format!(
        "Folder hierarchy exceeds the maximum depth of {MAX_FOLDER_DEPTH}"
    ))
}
