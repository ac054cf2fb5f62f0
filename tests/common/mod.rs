//! Shared helpers for HTTP API integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use bytebucket::web::handlers::AppState;
use bytebucket::web::router::create_router;
use bytebucket::{BlobStore, Database};
use serde_json::{json, Value};
use tempfile::TempDir;

pub const BOUNDARY: &str = "----ByteBucketTestBoundary";

/// A test server over an in-memory database and a temporary blob root.
pub struct TestApp {
    pub server: TestServer,
    pub db: Arc<Database>,
    pub storage: BlobStore,
    _temp_dir: TempDir,
}

/// Create a test server.
pub async fn create_test_app() -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = BlobStore::new(temp_dir.path().join("blobs"));
    storage.initialize().expect("Failed to initialize blob store");

    let db = Arc::new(
        Database::open_in_memory()
            .await
            .expect("Failed to create test database"),
    );

    let app_state = Arc::new(AppState::new(db.clone(), storage.clone()));
    let router = create_router(app_state, &[], 10 * 1024 * 1024);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        db,
        storage,
        _temp_dir: temp_dir,
    }
}

/// A part of a multipart body.
pub enum Part<'a> {
    Field(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: Option<&'a str>,
        content: &'a [u8],
    },
}

/// Build a multipart/form-data body delimited by [`BOUNDARY`].
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Field(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                content,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n"
                    )
                    .as_bytes(),
                );
                if let Some(ct) = content_type {
                    body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
                }
                body.extend_from_slice(b"\r\n");
                body.extend_from_slice(content);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Content-Type header value for [`multipart_body`].
pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// Create a folder over the API and return its ID.
pub async fn create_folder(server: &TestServer, name: &str, parent_id: Option<i64>) -> i64 {
    let response = server
        .post("/api/folders")
        .json(&json!({ "name": name, "parent_id": parent_id }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["data"]["id"].as_i64().unwrap()
}

/// Upload a single file over the API and return the file JSON.
pub async fn upload_file(
    server: &TestServer,
    folder_id: i64,
    filename: &str,
    content: &[u8],
) -> Value {
    let body = multipart_body(&[Part::File {
        name: "file",
        filename,
        content_type: Some("text/plain"),
        content,
    }]);

    let response = server
        .post(&format!("/api/folders/{folder_id}/files"))
        .content_type(&multipart_content_type())
        .bytes(body.into())
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["data"][0].clone()
}
