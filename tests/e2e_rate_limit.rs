//! E2E tests for per-client rate limiting

mod common;

use common::TestServer;
use serde_json::json;

#[tokio::test]
async fn test_auth_routes_use_the_stricter_limiter() {
    let server = TestServer::with_rate_limits(1000, 3).await;
    let token = server.create_test_token("limited");

    for _ in 0..3 {
        let response = server
            .client
            .get(server.url("/api/auth/profile"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        // 404 until registered; the limiter admitted the request either way
        assert_ne!(response.status(), 429);
    }

    let response = server
        .client
        .get(server.url("/api/auth/profile"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 429);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
    assert_eq!(
        body["error"]["message"],
        json!("Too many authentication attempts, please try again later")
    );

    // The general budget is untouched by auth traffic
    let response = server
        .client
        .get(server.url("/api/videos/feed"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_general_limit_rejects_with_envelope() {
    let server = TestServer::with_rate_limits(2, 1000).await;

    for _ in 0..2 {
        let response = server
            .client
            .get(server.url("/api/videos/feed"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    let response = server
        .client
        .get(server.url("/api/videos/feed"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 429);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["error"]["message"],
        json!("Too many requests, please try again later")
    );
}

#[tokio::test]
async fn test_forwarded_clients_are_limited_independently() {
    let server = TestServer::with_rate_limits(2, 1000).await;

    for _ in 0..2 {
        let response = server
            .client
            .get(server.url("/api/videos/feed"))
            .header("X-Forwarded-For", "203.0.113.7")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    let response = server
        .client
        .get(server.url("/api/videos/feed"))
        .header("X-Forwarded-For", "203.0.113.7")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 429);

    // A different forwarded address has its own window
    let response = server
        .client
        .get(server.url("/api/videos/feed"))
        .header("X-Forwarded-For", "203.0.113.8")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}
