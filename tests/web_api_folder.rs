//! Web API Folder Tests
//!
//! Integration tests for folder endpoints.

mod common;

use axum::http::StatusCode;
use common::{create_folder, create_test_app, upload_file};
use serde_json::{json, Value};

#[tokio::test]
async fn test_health_and_banner() {
    let app = create_test_app().await;

    let response = app.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "status": "ok" }));

    let response = app.server.get("/").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "ByteBucket");
}

#[tokio::test]
async fn test_create_and_list_folders() {
    let app = create_test_app().await;

    let root = create_folder(&app.server, "Documents", None).await;
    create_folder(&app.server, "Archive", None).await;
    create_folder(&app.server, "2024", Some(root)).await;

    let response = app.server.get("/api/folders").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let names: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Archive", "Documents"]);

    let response = app
        .server
        .get("/api/folders")
        .add_query_param("parent_id", root)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"][0]["name"], "2024");
    assert_eq!(body["data"][0]["parent_id"], root);
}

#[tokio::test]
async fn test_list_children_of_missing_folder() {
    let app = create_test_app().await;

    let response = app
        .server
        .get("/api/folders")
        .add_query_param("parent_id", 9999)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_folder_errors() {
    let app = create_test_app().await;
    create_folder(&app.server, "Docs", None).await;

    let response = app
        .server
        .post("/api/folders")
        .json(&json!({ "name": "Docs" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "CONFLICT");
    assert_eq!(
        body["error"]["message"],
        "A folder with this name already exists in the parent directory"
    );

    let response = app
        .server
        .post("/api/folders")
        .json(&json!({ "name": "" }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .server
        .post("/api/folders")
        .json(&json!({ "name": "Orphan", "parent_id": 9999 }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Parent folder doesn't exist");
}

#[tokio::test]
async fn test_get_folder_details() {
    let app = create_test_app().await;
    let root = create_folder(&app.server, "Root", None).await;
    let child = create_folder(&app.server, "Child", Some(root)).await;
    upload_file(&app.server, child, "a.txt", b"hello").await;

    let response = app.server.get(&format!("/api/folders/{child}")).await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["data"]["name"], "Child");
    assert_eq!(body["data"]["file_count"], 1);
    let path: Vec<_> = body["data"]["path"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(path, vec!["Root", "Child"]);

    let response = app.server.get("/api/folders/9999").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rename_and_move_folder() {
    let app = create_test_app().await;
    let a = create_folder(&app.server, "A", None).await;
    let b = create_folder(&app.server, "B", None).await;

    let response = app
        .server
        .patch(&format!("/api/folders/{b}"))
        .json(&json!({ "name": "B2", "parent_id": a }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["name"], "B2");
    assert_eq!(body["data"]["parent_id"], a);

    // Explicit null moves back to the root level
    let response = app
        .server
        .patch(&format!("/api/folders/{b}"))
        .json(&json!({ "parent_id": null }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["parent_id"], Value::Null);
}

#[tokio::test]
async fn test_move_folder_into_descendant_rejected() {
    let app = create_test_app().await;
    let a = create_folder(&app.server, "A", None).await;
    let b = create_folder(&app.server, "B", Some(a)).await;
    let c = create_folder(&app.server, "C", Some(b)).await;

    let response = app
        .server
        .patch(&format!("/api/folders/{a}"))
        .json(&json!({ "parent_id": c }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .server
        .patch(&format!("/api/folders/{a}"))
        .json(&json!({ "parent_id": a }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    // Nothing moved
    let response = app.server.get(&format!("/api/folders/{a}")).await;
    assert_eq!(response.json::<Value>()["data"]["parent_id"], Value::Null);
}

#[tokio::test]
async fn test_failed_update_leaves_folder_in_place() {
    let app = create_test_app().await;
    let a = create_folder(&app.server, "A", None).await;
    let b = create_folder(&app.server, "B", None).await;
    let x = create_folder(&app.server, "X", Some(a)).await;
    create_folder(&app.server, "Taken", Some(b)).await;

    let response = app
        .server
        .patch(&format!("/api/folders/{x}"))
        .json(&json!({ "parent_id": b, "name": "Taken" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let body: Value = app.server.get(&format!("/api/folders/{x}")).await.json();
    assert_eq!(body["data"]["parent_id"], a);
    assert_eq!(body["data"]["name"], "X");

    let response = app
        .server
        .patch(&format!("/api/folders/{x}"))
        .json(&json!({ "parent_id": b, "name": "Free" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["parent_id"], b);
    assert_eq!(body["data"]["name"], "Free");
}

#[tokio::test]
async fn test_delete_folder_removes_subtree_and_blobs() {
    let app = create_test_app().await;
    let root = create_folder(&app.server, "Root", None).await;
    let child = create_folder(&app.server, "Child", Some(root)).await;
    let file = upload_file(&app.server, child, "a.txt", b"hello").await;
    let file_id = file["id"].as_i64().unwrap();

    let response = app.server.delete(&format!("/api/folders/{root}")).await;
    response.assert_status(StatusCode::NO_CONTENT);

    app.server
        .get(&format!("/api/folders/{root}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .get(&format!("/api/folders/{child}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .get(&format!("/api/files/{file_id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let blobs = std::fs::read_dir(app.storage.root()).unwrap().count();
    assert_eq!(blobs, 0);

    app.server
        .delete(&format!("/api/folders/{root}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_folder_files() {
    let app = create_test_app().await;
    let folder = create_folder(&app.server, "Docs", None).await;
    upload_file(&app.server, folder, "b.txt", b"b").await;
    upload_file(&app.server, folder, "a.txt", b"a").await;

    let response = app.server.get(&format!("/api/folders/{folder}/files")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    let names: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["a.txt", "b.txt"]);

    app.server
        .get("/api/folders/9999/files")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
