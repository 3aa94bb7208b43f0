//! Error types for StillFeed
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// This enum represents all possible errors that can occur
/// in the application. It implements `IntoResponse` to
/// automatically convert errors to the uniform response envelope.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Authentication required or token rejected (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Acting on a resource not owned by the caller (403)
    #[error("{0}")]
    Forbidden(String),

    /// Malformed or missing input (400)
    #[error("{0}")]
    Validation(String),

    /// Field-level validation failures (400, with details)
    #[error("Validation failed")]
    ValidationDetails(Vec<String>),

    /// Duplicate create (409)
    #[error("{0}")]
    Conflict(String),

    /// Request rate limit exceeded (429)
    #[error("{0}")]
    RateLimited(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for the common "no such video" failure.
    pub fn video_not_found() -> Self {
        Self::NotFound("Video not found".to_string())
    }

    fn error_type(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::Validation(_) | Self::ValidationDetails(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::RateLimited(_) => "rate_limited",
            Self::Database(_) => "database",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to the appropriate HTTP status code and the
    /// `{success: false, error: {message, details?}}` envelope. Store and
    /// internal failures are logged with their full context but reported
    /// with a generic message.
    fn into_response(self) -> Response {
        use axum::Json;

        let error_type = self.error_type();
        let mut details: Option<Vec<String>> = None;

        let (status, error_message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::ValidationDetails(errors) => {
                details = Some(errors.clone());
                (StatusCode::BAD_REQUEST, "Validation failed".to_string())
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, msg.clone()),
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Config(msg) => {
                tracing::error!(error = %msg, "Configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        // Record error metric
        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[error_type]).inc();

        let mut error_body = serde_json::json!({ "message": error_message });
        if let Some(details) = details {
            error_body["details"] = serde_json::json!(details);
        }

        let body = Json(serde_json::json!({
            "success": false,
            "error": error_body,
        }));

        (status, body).into_response()
    }
}
