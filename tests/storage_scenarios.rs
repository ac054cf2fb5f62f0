//! End-to-end scenarios against the storage core, without HTTP.

use bytebucket::multipart;
use bytebucket::{
    BlobStore, BucketService, Database, ErrorKind, FileRepository, FolderRepository, NewFile,
    TagRepository, UploadRequest,
};
use tempfile::TempDir;

#[tokio::test]
async fn test_delete_folder_cascades_to_files() {
    let db = Database::open_in_memory().await.unwrap();
    let folders = FolderRepository::new(db.pool());
    let files = FileRepository::new(db.pool());

    let root = folders.create("Root", None).await.unwrap();
    let child = folders.create("Child", Some(root.id)).await.unwrap();
    let file = files
        .create(&NewFile::new("a.txt", child.id, 10, "text/plain", "k1"))
        .await
        .unwrap();
    assert_eq!((root.id, child.id, file.id), (1, 2, 1));

    folders.delete(root.id).await.unwrap();

    assert!(files.get_by_id(file.id).await.unwrap().is_none());
    assert!(folders.get_by_id(child.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_tag_rejected() {
    let db = Database::open_in_memory().await.unwrap();
    let tags = TagRepository::new(db.pool());

    tags.create("x").await.unwrap();
    let err = tags.create("x").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UniqueConstraint);
}

#[test]
fn test_blob_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let store = BlobStore::new(temp_dir.path());
    store.initialize().unwrap();

    let bytes = b"file body\x00with nul";
    let key = store.put("a.txt", bytes, "text/plain").unwrap();
    assert_eq!(store.get(&key).unwrap(), bytes);

    store.delete(&key).unwrap();
    assert!(!store.exists(&key));
}

#[tokio::test]
async fn test_multipart_upload_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let store = BlobStore::new(temp_dir.path().join("blobs"));
    let db = Database::open_in_memory().await.unwrap();
    let folder = FolderRepository::new(db.pool())
        .create("Inbox", None)
        .await
        .unwrap();

    let payload = b"\x00\x00PK\x03\x04\r\n--\x00";
    let mut body = Vec::new();
    body.extend_from_slice(b"--b0undary\r\nContent-Disposition: form-data; name=\"doc\"; filename=\"x.zip\"\r\nContent-Type: application/zip\r\n\r\n");
    body.extend_from_slice(payload);
    body.extend_from_slice(b"\r\n--b0undary--\r\n");

    let decoded = multipart::decode(&body, "b0undary").unwrap();
    let part = decoded.file("doc").unwrap();

    let service = BucketService::new(&db, &store);
    let file = service
        .upload(&UploadRequest::new(
            folder.id,
            part.filename.clone(),
            part.content_type.clone(),
            part.content.clone(),
        ))
        .await
        .unwrap();

    let descriptor = store.descriptor(&file.storage_key).unwrap();
    assert_eq!(descriptor.original_filename, "x.zip");
    assert_eq!(descriptor.content_type, "application/zip");
    assert_eq!(descriptor.size, payload.len() as u64);

    assert_eq!(service.download(file.id).await.unwrap().content, payload);
}
