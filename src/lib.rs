//! StillFeed - short-form video feed backend
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                       │
//! │  - Auth/profile, video, feed, and saved-list endpoints      │
//! │  - Uniform {success, data?, error?} envelope                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                           │
//! │  - Feed assembly (batched fan-out + in-memory merge)        │
//! │  - Video CRUD, counters, bookmark cascade                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                             │
//! │  - Document-store adapter over SQLite (sqlx)                │
//! │  - Limited op set: point ops, ordered scans, in-set ≤ 10    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers and response envelope
//! - `service`: feed assembly and business logic
//! - `data`: store adapter and models
//! - `auth`: identity-provider token verification and extractors
//! - `config`: configuration management
//! - `error`: error types
//! - `metrics`: Prometheus instruments
//! - `rate_limit`: per-client request limiters

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod rate_limit;
pub mod service;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// Cloned per request; both members are cheap `Arc` handles.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Document-store adapter (SQLite connection pool)
    pub store: Arc<data::Store>,

    /// Per-client request limiters
    pub rate_limits: Arc<rate_limit::RateLimits>,
}

impl AppState {
    /// Initialize application state
    ///
    /// Connects the store and runs migrations.
    ///
    /// # Errors
    /// Returns error if the database cannot be opened or migrated
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let store = data::Store::connect(&config.database.path).await?;
        let rate_limits = rate_limit::RateLimits::from_config(&config.rate_limit);

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(store),
            rate_limits: Arc::new(rate_limits),
        })
    }
}

/// Build the Axum router with all routes.
///
/// Shared by the binary and integration tests to keep route composition
/// consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{
        compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
        trace::TraceLayer,
    };

    let body_limit = state.config.server.body_limit_bytes;

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .route("/metrics", axum::routing::get(api::export_metrics))
        .nest("/api/auth", api::auth_router())
        .nest("/api/videos", api::videos_router())
        .nest("/api/users", api::users_router())
        .fallback(route_not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            enforce_rate_limit,
        ))
        .layer(axum::middleware::from_fn(track_http_request))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Admit or reject the request against the per-client limiters.
///
/// Auth routes use the stricter limiter. Clients are keyed by the first
/// `X-Forwarded-For` address when present, otherwise by the peer socket
/// address.
async fn enforce_rate_limit(
    axum::extract::State(state): axum::extract::State<AppState>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<axum::response::Response, error::AppError> {
    if state.config.rate_limit.enabled {
        let key = client_key(&request);
        let limiter = if request.uri().path().starts_with("/api/auth") {
            &state.rate_limits.auth
        } else {
            &state.rate_limits.general
        };
        limiter.check_and_increment(&key).await?;
    }

    Ok(next.run(request).await)
}

fn client_key(request: &axum::extract::Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
    {
        let forwarded = forwarded.trim();
        if !forwarded.is_empty() {
            return forwarded.to_string();
        }
    }

    request
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Count every request by method, matched route template, and status.
async fn track_http_request(
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = request.method().to_string();
    let endpoint = request
        .extensions()
        .get::<axum::extract::MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    metrics::HTTP_REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), endpoint.as_str(), response.status().as_str()])
        .inc();

    response
}

async fn health_check() -> &'static str {
    "OK"
}

/// Unknown routes still get the error envelope.
async fn route_not_found() -> error::AppError {
    error::AppError::NotFound("Route not found".to_string())
}
