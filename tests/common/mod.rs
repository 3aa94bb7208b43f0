//! Common test utilities for E2E tests

use chrono::{Duration, Utc};
use stillfeed::auth::{Identity, create_token};
use stillfeed::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

const TEST_TOKEN_SECRET: &str = "test-secret-key-32-bytes-long!!!";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // Generous limits so the limiter runs on every request without
        // tripping across a suite sharing one client address.
        Self::with_rate_limits(100_000, 100_000).await
    }

    /// Create a test server with specific per-window request limits
    pub async fn with_rate_limits(max_requests: u32, auth_max_requests: u32) -> Self {
        stillfeed::metrics::init_metrics();

        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                body_limit_bytes: 1_048_576,
            },
            database: config::DatabaseConfig {
                path: db_path.clone(),
            },
            auth: config::AuthConfig {
                token_secret: TEST_TOKEN_SECRET.to_string(),
                token_max_age: 3600,
            },
            feed: config::FeedConfig {
                default_limit: 20,
                max_limit: 50,
            },
            rate_limit: config::RateLimitConfig {
                enabled: true,
                window_seconds: 60,
                max_requests,
                auth_window_seconds: 900,
                auth_max_requests,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state
        let state = AppState::new(config.clone()).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build router
        let app = stillfeed::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
            )
            .await
            .unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Mint a bearer token for a test identity
    pub fn create_test_token(&self, uid: &str) -> String {
        let identity = Identity {
            uid: uid.to_string(),
            email: format!("{}@example.com", uid),
            email_verified: true,
            issued_at: Utc::now(),
            expires_at: Utc::now() + Duration::hours(1),
        };

        create_token(&identity, TEST_TOKEN_SECRET).expect("Failed to create test token")
    }

    /// Mint an already-expired bearer token
    pub fn create_expired_token(&self, uid: &str) -> String {
        let identity = Identity {
            uid: uid.to_string(),
            email: format!("{}@example.com", uid),
            email_verified: true,
            issued_at: Utc::now() - Duration::hours(2),
            expires_at: Utc::now() - Duration::hours(1),
        };

        create_token(&identity, TEST_TOKEN_SECRET).expect("Failed to create test token")
    }

    /// Register a profile for `uid` through the API
    pub async fn register_user(&self, uid: &str, display_name: &str) -> String {
        let token = self.create_test_token(uid);
        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "displayName": display_name }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201, "registering {} failed", uid);
        token
    }

    /// Upload a video through the API, returning its id
    pub async fn upload_video(&self, token: &str, title: &str, category: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/videos"))
            .bearer_auth(token)
            .json(&serde_json::json!({
                "title": title,
                "category": category,
                "videoUrl": "https://cdn.example.com/clip.mp4",
                "duration": 30,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201, "uploading '{}' failed", title);

        let body: serde_json::Value = response.json().await.unwrap();
        body["data"]["videoId"].as_str().unwrap().to_string()
    }

    /// Seed a follow edge directly in the store
    pub async fn seed_follow(&self, follower: &str, followee: &str) {
        self.state
            .store
            .insert_follow(&stillfeed::data::Follow {
                follower_id: follower.to_string(),
                followee_id: followee.to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }
}
