mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use bytes::Bytes;
use helpers::{setup_test_app, setup_test_app_with, upload_path};
use serde_json::{json, Value};
use tessera_core::models::{FileDescriptor, Resource, ResourceStatus, ResourceType};

#[tokio::test]
async fn test_uri_upload_completes() {
    let app = setup_test_app().await;
    let resource = app.create_resource(ResourceType::Video).await;
    let token = app.issue_token(resource.id).await;

    let response = app
        .client()
        .post(&upload_path(resource.id, &token))
        .json(&json!({"uri": "https://cdn.example.com/video.mp4"}))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["resource"]["status"], "normal");
    assert_eq!(
        body["resource"]["content"]["files"][0]["downloadUri"],
        "https://cdn.example.com/video.mp4"
    );
    assert!(response.maybe_header("X-Request-ID").is_some());

    let stored = app.stored(resource.id).await;
    assert_eq!(stored.status, ResourceStatus::Normal);
    assert_eq!(stored.file_count(), 1);
}

#[tokio::test]
async fn test_file_upload_is_accepted() {
    let app = setup_test_app().await;
    let resource = app.create_resource(ResourceType::Audio).await;
    let token = app.issue_token(resource.id).await;

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"ID3 fake audio".to_vec())
            .file_name("track.mp3")
            .mime_type("audio/mpeg"),
    );

    let response = app
        .client()
        .post(&upload_path(resource.id, &token))
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 202);
    let body: Value = response.json();
    assert_eq!(body["resource"]["status"], "awaiting_processing");

    let stored = app.stored(resource.id).await;
    let file = &stored.content.as_ref().unwrap().files[0];
    assert_eq!(file.mime, "audio/mpeg");
    assert_eq!(file.bytes, Some(14));
    let key = file.internal_uri.as_deref().unwrap();
    assert!(app.state.storage.exists(key).await.unwrap());
}

#[tokio::test]
async fn test_form_and_text_bodies_resolve_uri() {
    let app = setup_test_app().await;

    let resource = app.create_resource(ResourceType::Video).await;
    let token = app.issue_token(resource.id).await;
    let response = app
        .client()
        .post(&upload_path(resource.id, &token))
        .form(&[("uri", "https://cdn.example.com/a.mp4")])
        .await;
    assert_eq!(response.status_code(), 200);

    let resource = app.create_resource(ResourceType::Video).await;
    let token = app.issue_token(resource.id).await;
    let response = app
        .client()
        .post(&upload_path(resource.id, &token))
        .text("youtube://dQw4w9WgXcQ")
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(
        body["resource"]["content"]["files"][0]["mime"],
        "video/x-youtube"
    );
}

#[tokio::test]
async fn test_remote_files_manifest() {
    let app = setup_test_app().await;
    let resource = app.create_resource(ResourceType::Video).await;
    let token = app.issue_token(resource.id).await;

    let response = app
        .client()
        .post(&upload_path(resource.id, &token))
        .json(&json!({
            "remoteFiles": [
                {
                    "downloadUri": "https://cdn.example.com/1080.mp4",
                    "mime": "video/mp4",
                    "mimeType": "video/mp4",
                    "representation": "transcoding",
                    "quality": 2,
                    "bytes": 9600,
                    "attributes": {"duration": 300, "frameSize": {"width": 1920, "height": 1080}}
                },
                {
                    "downloadUri": "https://cdn.example.com/poster.png",
                    "mime": "image/png",
                    "mimeType": "image/png",
                    "representation": "thumbnail",
                    "quality": 1,
                    "bytes": 100,
                    "attributes": {"frameSize": {"width": 640, "height": 360}}
                }
            ]
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    let stored = app.stored(resource.id).await;
    let files = &stored.content.as_ref().unwrap().files;
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].representation, "transcoding");
    assert_eq!(files[1].representation, "thumbnail");
}

#[tokio::test]
async fn test_remote_files_with_bad_attributes_rejected() {
    let app = setup_test_app().await;
    let resource = app.create_resource(ResourceType::Video).await;
    let token = app.issue_token(resource.id).await;

    let response = app
        .client()
        .post(&upload_path(resource.id, &token))
        .json(&json!({
            "remoteFiles": [{
                "downloadUri": "https://cdn.example.com/a.mp4",
                "mime": "video/mp4",
                "mimeType": "video/mp4",
                "attributes": {"duration": -5}
            }]
        }))
        .await;

    assert_eq!(response.status_code(), 422);
    let body: Value = response.json();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("remoteFiles[0].attributes.duration"));
    assert_eq!(app.stored(resource.id).await.file_count(), 0);
}

#[tokio::test]
async fn test_token_is_single_use() {
    let app = setup_test_app().await;
    let resource = app.create_resource(ResourceType::Video).await;
    let token = app.issue_token(resource.id).await;
    let path = upload_path(resource.id, &token);

    let first = app
        .client()
        .post(&path)
        .json(&json!({"uri": "https://cdn.example.com/a.mp4"}))
        .await;
    assert_eq!(first.status_code(), 200);

    let second = app
        .client()
        .post(&path)
        .json(&json!({"uri": "https://cdn.example.com/b.mp4"}))
        .await;
    assert_eq!(second.status_code(), 401);
    let body: Value = second.json();
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_malformed_body_burns_token() {
    let app = setup_test_app().await;
    let resource = app.create_resource(ResourceType::Video).await;
    let token = app.issue_token(resource.id).await;
    let path = upload_path(resource.id, &token);

    let first = app
        .client()
        .post(&path)
        .bytes(Bytes::from_static(b"{not json"))
        .content_type("application/json")
        .await;
    assert_eq!(first.status_code(), 400);
    let body: Value = first.json();
    assert_eq!(body["code"], "BAD_REQUEST");

    let second = app
        .client()
        .post(&path)
        .json(&json!({"uri": "https://cdn.example.com/a.mp4"}))
        .await;
    assert_eq!(second.status_code(), 401);
    assert_eq!(app.stored(resource.id).await.file_count(), 0);
}

#[tokio::test]
async fn test_invalid_file_leaves_no_blob_behind() {
    let app = setup_test_app().await;
    let resource = app.create_resource(ResourceType::Video).await;
    let token = app.issue_token(resource.id).await;

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"not really a video".to_vec())
            .file_name("clip.bin")
            .mime_type(format!("video/{}", "x".repeat(300))),
    );

    let response = app
        .client()
        .post(&upload_path(resource.id, &token))
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert_eq!(body["code"], "RESOURCE_VALIDATION_FAILED");
    assert_eq!(app.stored(resource.id).await.file_count(), 0);
    assert_eq!(app.stored_blob_count(), 0);
}

#[tokio::test]
async fn test_wrong_token_rejected() {
    let app = setup_test_app().await;
    let resource = app.create_resource(ResourceType::Video).await;
    app.issue_token(resource.id).await;

    let response = app
        .client()
        .post(&upload_path(resource.id, "ut_wrong"))
        .json(&json!({"uri": "https://cdn.example.com/a.mp4"}))
        .await;

    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_collection_and_sequence_rejected() {
    let app = setup_test_app().await;

    let collection = app.create_resource(ResourceType::Collection).await;
    let token = app.issue_token(collection.id).await;
    let response = app
        .client()
        .post(&upload_path(collection.id, &token))
        .json(&json!({"uri": "https://cdn.example.com/a.mp4"}))
        .await;
    assert_eq!(response.status_code(), 400);

    let mut sequence = Resource::new(ResourceType::Image, "pages");
    sequence.sequence = Some(true);
    let sequence = app.insert(sequence).await;
    let token = app.issue_token(sequence.id).await;
    let response = app
        .client()
        .post(&upload_path(sequence.id, &token))
        .json(&json!({"uri": "https://cdn.example.com/a.png"}))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_unknown_or_malformed_id_not_found() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(&upload_path(uuid::Uuid::new_v4(), "ut_x"))
        .json(&json!({"uri": "https://cdn.example.com/a.mp4"}))
        .await;
    assert_eq!(response.status_code(), 404);

    let response = app
        .client()
        .post(&upload_path("not-a-uuid", "ut_x"))
        .json(&json!({"uri": "https://cdn.example.com/a.mp4"}))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_deleted_resource_is_gone() {
    let app = setup_test_app().await;
    let mut resource = Resource::new(ResourceType::Video, "old");
    resource.status = ResourceStatus::Deleted;
    let resource = app.insert(resource).await;
    let token = app.issue_token(resource.id).await;

    let response = app
        .client()
        .post(&upload_path(resource.id, &token))
        .json(&json!({"uri": "https://cdn.example.com/a.mp4"}))
        .await;

    assert_eq!(response.status_code(), 410);
    let body: Value = response.json();
    assert_eq!(body["resource"]["id"], resource.id.to_string());

    let response = app
        .client()
        .post(&upload_path(resource.id, &token))
        .bytes(Bytes::from_static(b"{not json"))
        .content_type("application/json")
        .await;
    assert_eq!(response.status_code(), 410);
}

#[tokio::test]
async fn test_unresolvable_body_is_unprocessable() {
    let app = setup_test_app().await;
    let resource = app.create_resource(ResourceType::Video).await;

    let token = app.issue_token(resource.id).await;
    let response = app
        .client()
        .post(&upload_path(resource.id, &token))
        .json(&json!({"something": "else"}))
        .await;
    assert_eq!(response.status_code(), 422);

    let token = app.issue_token(resource.id).await;
    let response = app.client().post(&upload_path(resource.id, &token)).await;
    assert_eq!(response.status_code(), 422);
}

#[tokio::test]
async fn test_replace_false_appends() {
    let app = setup_test_app().await;
    let mut resource = Resource::new(ResourceType::Video, "clip");
    resource
        .content_mut()
        .files
        .push(FileDescriptor::original("https://cdn.example.com/old.mp4", "video/mp4"));
    resource.status = ResourceStatus::Normal;
    let resource = app.insert(resource).await;

    let token = app.issue_token(resource.id).await;
    let response = app
        .client()
        .post(&upload_path(resource.id, &token))
        .add_query_param("replace", "false")
        .json(&json!({"uri": "https://cdn.example.com/new.mp4"}))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(app.stored(resource.id).await.file_count(), 2);

    let token = app.issue_token(resource.id).await;
    let response = app
        .client()
        .post(&upload_path(resource.id, &token))
        .json(&json!({"uri": "https://cdn.example.com/newest.mp4"}))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(app.stored(resource.id).await.file_count(), 1);
}

#[tokio::test]
async fn test_processing_resource_locked() {
    let app = setup_test_app().await;
    let mut resource = Resource::new(ResourceType::Video, "busy");
    resource.status = ResourceStatus::Processing;
    let resource = app.insert(resource).await;
    let token = app.issue_token(resource.id).await;

    let response = app
        .client()
        .post(&upload_path(resource.id, &token))
        .json(&json!({"uri": "https://cdn.example.com/a.mp4"}))
        .await;

    assert_eq!(response.status_code(), 423);
    let body: Value = response.json();
    assert_eq!(body["code"], "RESOURCE_LOCKED");
}

#[tokio::test]
async fn test_body_over_limit_rejected() {
    let app = setup_test_app_with(|config| config.max_upload_size_bytes = 1024).await;
    let resource = app.create_resource(ResourceType::Data).await;
    let token = app.issue_token(resource.id).await;

    let response = app
        .client()
        .post(&upload_path(resource.id, &token))
        .text("x".repeat(4096))
        .await;

    assert_eq!(response.status_code(), 413);
}
