//! Request DTOs for the HTTP API.

use serde::{Deserialize, Deserializer};

/// Query for listing folders.
#[derive(Debug, Default, Deserialize)]
pub struct FolderListQuery {
    /// Parent folder; omitted for root folders.
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// Folder creation request.
#[derive(Debug, Deserialize)]
pub struct CreateFolderRequest {
    /// Folder name.
    pub name: String,
    /// Parent folder (optional).
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// Folder update request. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateFolderRequest {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New parent: a folder ID, or `null` to move to the root level.
    #[serde(default, deserialize_with = "present")]
    pub parent_id: Option<Option<i64>>,
}

/// File update request. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateFileRequest {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// Destination folder.
    #[serde(default)]
    pub folder_id: Option<i64>,
}

/// Tag creation request.
#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    /// Tag name.
    pub name: String,
}

/// Request to attach a tag to a file, by ID or by name.
///
/// A name that doesn't exist yet creates the tag.
#[derive(Debug, Default, Deserialize)]
pub struct AddFileTagRequest {
    #[serde(default)]
    pub tag_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Metadata write request.
#[derive(Debug, Deserialize)]
pub struct SetMetadataRequest {
    /// Value to store.
    pub value: String,
}

/// Distinguish an explicit `null` from an absent field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_folder_parent_states() {
        let absent: UpdateFolderRequest = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert_eq!(absent.parent_id, None);
        assert_eq!(absent.name.as_deref(), Some("x"));

        let root: UpdateFolderRequest = serde_json::from_str(r#"{"parent_id":null}"#).unwrap();
        assert_eq!(root.parent_id, Some(None));

        let moved: UpdateFolderRequest = serde_json::from_str(r#"{"parent_id":7}"#).unwrap();
        assert_eq!(moved.parent_id, Some(Some(7)));
    }

    #[test]
    fn test_create_folder_defaults() {
        let req: CreateFolderRequest = serde_json::from_str(r#"{"name":"Docs"}"#).unwrap();
        assert_eq!(req.name, "Docs");
        assert!(req.parent_id.is_none());
    }

    #[test]
    fn test_add_file_tag_by_name() {
        let req: AddFileTagRequest = serde_json::from_str(r#"{"name":"work"}"#).unwrap();
        assert!(req.tag_id.is_none());
        assert_eq!(req.name.as_deref(), Some("work"));
    }
}
