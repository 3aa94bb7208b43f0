//! API layer
//!
//! HTTP handlers for:
//! - Auth/profile endpoints
//! - Video and feed endpoints
//! - User endpoints (uploads, saved videos)
//! - Metrics (Prometheus)
//!
//! Every JSON response uses the `{success, message?, data?}` envelope;
//! errors go through `AppError::into_response`.

use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub mod auth;
pub mod users;
pub mod videos;

pub use auth::auth_router;
pub use users::users_router;
pub use videos::videos_router;

use crate::config::FeedConfig;
use crate::error::AppError;
use crate::service::PageRequest;

/// Wrap payload data in the success envelope
pub fn success<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

/// Success envelope with a human-readable message alongside the data
pub fn success_with_message<T: Serialize>(message: &str, data: T) -> Json<Value> {
    Json(json!({ "success": true, "message": message, "data": data }))
}

/// Success envelope carrying only a message
pub fn message_only(message: &str) -> Json<Value> {
    Json(json!({ "success": true, "message": message }))
}

/// Render every registered metric in Prometheus text format
pub async fn export_metrics() -> Result<impl axum::response::IntoResponse, AppError> {
    use prometheus::{Encoder, TextEncoder};

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&crate::metrics::REGISTRY.gather(), &mut buffer)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("metrics encoding failed: {e}")))?;

    Ok((
        [(axum::http::header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    ))
}

/// Shared `?page=&limit=` query parameters for every feed endpoint
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    /// Validate against the configured defaults and cap.
    ///
    /// Runs before any store access; an over-cap limit never reaches the
    /// data layer.
    pub fn resolve(&self, config: &FeedConfig) -> Result<PageRequest, AppError> {
        PageRequest::resolve(self.page, self.limit, config)
    }
}
