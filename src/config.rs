//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub feed: FeedConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
    /// Request body size limit in bytes
    pub body_limit_bytes: usize,
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Authentication configuration
///
/// Bearer tokens are HMAC-signed by the identity provider;
/// this service only needs the shared verification secret.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Token signing/verification secret (32+ bytes)
    pub token_secret: String,
    /// Token max age in seconds (default: 3600)
    pub token_max_age: i64,
}

/// Feed pagination configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Page size when the client does not request one (default: 20)
    pub default_limit: u32,
    /// Hard cap on client-requested page size (default: 50)
    pub max_limit: u32,
}

/// Request rate limiting configuration
///
/// The auth window/limit pair applies to `/api/auth` routes; everything
/// else falls under the general pair.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Disable to run without any limiter (default: true)
    pub enabled: bool,
    /// General window length in seconds (default: 60)
    pub window_seconds: u64,
    /// Requests allowed per client per general window (default: 100)
    pub max_requests: u32,
    /// Auth window length in seconds (default: 900)
    pub auth_window_seconds: u64,
    /// Requests allowed per client per auth window (default: 5)
    pub auth_max_requests: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (STILLFEED_*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.body_limit_bytes", 1_048_576)?
            .set_default("auth.token_max_age", 3600)?
            .set_default("feed.default_limit", 20)?
            .set_default("feed.max_limit", 50)?
            .set_default("rate_limit.enabled", true)?
            .set_default("rate_limit.window_seconds", 60)?
            .set_default("rate_limit.max_requests", 100)?
            .set_default("rate_limit.auth_window_seconds", 900)?
            .set_default("rate_limit.auth_max_requests", 5)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (STILLFEED_*)
            .add_source(
                Environment::with_prefix("STILLFEED")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        const MIN_TOKEN_SECRET_BYTES: usize = 32;

        if self.auth.token_secret.as_bytes().len() < MIN_TOKEN_SECRET_BYTES {
            return Err(crate::error::AppError::Config(format!(
                "auth.token_secret must be at least {} bytes",
                MIN_TOKEN_SECRET_BYTES
            )));
        }

        if self.auth.token_max_age <= 0 {
            return Err(crate::error::AppError::Config(
                "auth.token_max_age must be greater than 0".to_string(),
            ));
        }

        if self.feed.default_limit == 0 || self.feed.max_limit == 0 {
            return Err(crate::error::AppError::Config(
                "feed.default_limit and feed.max_limit must be greater than 0".to_string(),
            ));
        }

        if self.feed.default_limit > self.feed.max_limit {
            return Err(crate::error::AppError::Config(
                "feed.default_limit must not exceed feed.max_limit".to_string(),
            ));
        }

        if self.rate_limit.enabled {
            if self.rate_limit.window_seconds == 0 || self.rate_limit.auth_window_seconds == 0 {
                return Err(crate::error::AppError::Config(
                    "rate_limit windows must be greater than 0 seconds".to_string(),
                ));
            }
            if self.rate_limit.max_requests == 0 || self.rate_limit.auth_max_requests == 0 {
                return Err(crate::error::AppError::Config(
                    "rate_limit request limits must be greater than 0".to_string(),
                ));
            }
        }

        Ok(())
    }
}
