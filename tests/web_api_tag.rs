//! Web API Tag Tests
//!
//! Integration tests for tag and file-tag endpoints.

mod common;

use axum::http::StatusCode;
use common::{create_folder, create_test_app, upload_file};
use serde_json::{json, Value};

#[tokio::test]
async fn test_create_and_list_tags() {
    let app = create_test_app().await;

    for name in ["video", "Audio", "audio"] {
        app.server
            .post("/api/tags")
            .json(&json!({ "name": name }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let response = app.server.get("/api/tags").await;
    response.assert_status_ok();
    let names: Vec<_> = response.json::<Value>()["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Audio", "audio", "video"]);
}

#[tokio::test]
async fn test_duplicate_and_empty_tag() {
    let app = create_test_app().await;

    app.server
        .post("/api/tags")
        .json(&json!({ "name": "x" }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app.server.post("/api/tags").json(&json!({ "name": "x" })).await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(
        response.json::<Value>()["error"]["message"],
        "A tag with this name already exists"
    );

    let response = app.server.post("/api/tags").json(&json!({ "name": "" })).await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_file_tag_lifecycle() {
    let app = create_test_app().await;
    let folder = create_folder(&app.server, "Docs", None).await;
    let file = upload_file(&app.server, folder, "a.txt", b"a").await;
    let file_id = file["id"].as_i64().unwrap();

    let response = app.server.post("/api/tags").json(&json!({ "name": "keep" })).await;
    let tag_id = response.json::<Value>()["data"]["id"].as_i64().unwrap();

    app.server
        .post(&format!("/api/files/{file_id}/tags"))
        .json(&json!({ "tag_id": tag_id }))
        .await
        .assert_status(StatusCode::CREATED);

    // Attaching twice conflicts
    app.server
        .post(&format!("/api/files/{file_id}/tags"))
        .json(&json!({ "tag_id": tag_id }))
        .await
        .assert_status(StatusCode::CONFLICT);

    // By name creates the tag on demand
    let response = app
        .server
        .post(&format!("/api/files/{file_id}/tags"))
        .json(&json!({ "name": "fresh" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["data"]["name"], "fresh");

    app.server
        .post(&format!("/api/files/{file_id}/tags"))
        .json(&json!({}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .post(&format!("/api/files/{file_id}/tags"))
        .json(&json!({ "tag_id": 9999 }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    app.server
        .delete(&format!("/api/files/{file_id}/tags/{tag_id}"))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let response = app
        .server
        .delete(&format!("/api/files/{file_id}/tags/{tag_id}"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(
        response.json::<Value>()["error"]["message"],
        "File tag association not found"
    );

    let response = app.server.get(&format!("/api/files/{file_id}/tags")).await;
    let names: Vec<_> = response.json::<Value>()["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["fresh"]);
}

#[tokio::test]
async fn test_tag_missing_file() {
    let app = create_test_app().await;

    app.server
        .get("/api/files/9999/tags")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .post("/api/files/9999/tags")
        .json(&json!({ "name": "orphan" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // The failed attach must not leave the tag behind
    let tags: Value = app.server.get("/api/tags").await.json();
    assert!(tags["data"].as_array().unwrap().is_empty());
}
