//! E2E tests for video CRUD and engagement tracking

mod common;

use common::TestServer;
use serde_json::json;

#[tokio::test]
async fn test_upload_video_and_fetch() {
    let server = TestServer::new().await;
    let token = server.register_user("uploader", "Uploader").await;

    let response = server
        .client
        .post(server.url("/api/videos"))
        .bearer_auth(&token)
        .json(&json!({
            "title": "  First clip  ",
            "description": "a test clip",
            "category": "Nature",
            "videoUrl": "https://cdn.example.com/clip.mp4",
            "duration": 42,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["title"], json!("First clip"));
    assert_eq!(body["data"]["category"], json!("nature"));
    assert_eq!(body["data"]["uploaderName"], json!("Uploader"));
    assert_eq!(body["data"]["viewCount"], json!(0));
    let video_id = body["data"]["videoId"].as_str().unwrap().to_string();

    // Upload bumps the profile counter
    let response = server
        .client
        .get(server.url("/api/auth/profile"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["totalUploads"], json!(1));

    // Anonymous fetch works and reports isSaved false
    let response = server
        .client
        .get(server.url(&format!("/api/videos/{}", video_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["isSaved"], json!(false));
}

#[tokio::test]
async fn test_upload_rejects_missing_fields_and_bad_category() {
    let server = TestServer::new().await;
    let token = server.register_user("uploader", "Uploader").await;

    let response = server
        .client
        .post(server.url("/api/videos"))
        .bearer_auth(&token)
        .json(&json!({ "category": "art", "videoUrl": "https://cdn.example.com/v.mp4" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = server
        .client
        .post(server.url("/api/videos"))
        .bearer_auth(&token)
        .json(&json!({
            "title": "t",
            "category": "music",
            "videoUrl": "https://cdn.example.com/v.mp4",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Invalid category")
    );
}

#[tokio::test]
async fn test_update_video_owner_only() {
    let server = TestServer::new().await;
    let owner = server.register_user("owner", "Owner").await;
    let intruder = server.register_user("intruder", "Intruder").await;
    let video_id = server.upload_video(&owner, "Original", "art").await;

    let response = server
        .client
        .put(server.url(&format!("/api/videos/{}", video_id)))
        .bearer_auth(&intruder)
        .json(&json!({ "title": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // Rejected update left the video unchanged
    let response = server
        .client
        .get(server.url(&format!("/api/videos/{}", video_id)))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["title"], json!("Original"));

    let response = server
        .client
        .put(server.url(&format!("/api/videos/{}", video_id)))
        .bearer_auth(&owner)
        .json(&json!({ "title": "Renamed", "category": "science" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["title"], json!("Renamed"));
    assert_eq!(body["data"]["category"], json!("science"));
}

#[tokio::test]
async fn test_delete_video_owner_only_and_counter() {
    let server = TestServer::new().await;
    let owner = server.register_user("owner", "Owner").await;
    let intruder = server.register_user("intruder", "Intruder").await;
    let video_id = server.upload_video(&owner, "Doomed", "other").await;

    let response = server
        .client
        .delete(server.url(&format!("/api/videos/{}", video_id)))
        .bearer_auth(&intruder)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = server
        .client
        .delete(server.url(&format!("/api/videos/{}", video_id)))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = server
        .client
        .get(server.url(&format!("/api/videos/{}", video_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = server
        .client
        .get(server.url("/api/auth/profile"))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["totalUploads"], json!(0));
}

#[tokio::test]
async fn test_engagement_tracking() {
    let server = TestServer::new().await;
    let owner = server.register_user("owner", "Owner").await;
    let viewer = server.register_user("viewer", "Viewer").await;
    let video_id = server.upload_video(&owner, "Clip", "skills").await;

    // Views count without authentication
    for _ in 0..2 {
        let response = server
            .client
            .post(server.url(&format!("/api/videos/{}/view", video_id)))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    let response = server
        .client
        .post(server.url(&format!("/api/videos/{}/complete", video_id)))
        .bearer_auth(&viewer)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = server
        .client
        .post(server.url(&format!("/api/videos/{}/skip", video_id)))
        .bearer_auth(&viewer)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Completion and skip require auth
    let response = server
        .client
        .post(server.url(&format!("/api/videos/{}/complete", video_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = server
        .client
        .get(server.url(&format!("/api/videos/{}", video_id)))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["viewCount"], json!(2));
    assert_eq!(body["data"]["completionCount"], json!(1));
    assert_eq!(body["data"]["skipCount"], json!(1));

    // Unknown video id
    let response = server
        .client
        .post(server.url("/api/videos/01UNKNOWNVIDEOIDXXXXXXXXXX/view"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}
