//! Request rate limiting
//!
//! Fixed-window counters keyed by client address. Two limiters run side
//! by side: a general one for the whole API and a stricter one for the
//! auth surface.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::config::RateLimitConfig;
use crate::error::AppError;

const MAX_TRACKED_CLIENTS: usize = 10_000;

#[derive(Debug, Clone)]
struct ClientWindow {
    count: u32,
    started_at: Instant,
}

impl ClientWindow {
    fn expired(&self, window: Duration) -> bool {
        self.started_at.elapsed() >= window
    }
}

/// Fixed-window rate limiter for one class of requests
pub struct RateLimiter {
    windows: Arc<RwLock<HashMap<String, ClientWindow>>>,
    max_requests: u32,
    window: Duration,
    rejection_message: String,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration, rejection_message: &str) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window,
            rejection_message: rejection_message.to_string(),
        }
    }

    /// Admit or reject one request from `key`.
    ///
    /// Tracked clients are capped; when the map is full, expired windows
    /// are dropped first and the oldest window is evicted as a last
    /// resort, so an address-rotating client cannot grow memory
    /// unboundedly.
    pub async fn check_and_increment(&self, key: &str) -> Result<(), AppError> {
        let mut windows = self.windows.write().await;

        if !windows.contains_key(key) && windows.len() >= MAX_TRACKED_CLIENTS {
            let window = self.window;
            windows.retain(|_, w| !w.expired(window));
            if windows.len() >= MAX_TRACKED_CLIENTS {
                if let Some(oldest) = windows
                    .iter()
                    .min_by_key(|(_, w)| w.started_at)
                    .map(|(k, _)| k.clone())
                {
                    windows.remove(&oldest);
                }
            }
        }

        let entry = windows.entry(key.to_string()).or_insert_with(|| ClientWindow {
            count: 0,
            started_at: Instant::now(),
        });

        if entry.expired(self.window) {
            entry.count = 0;
            entry.started_at = Instant::now();
        }

        if entry.count >= self.max_requests {
            return Err(AppError::RateLimited(self.rejection_message.clone()));
        }

        entry.count += 1;
        Ok(())
    }

    /// Current in-window count for a key
    pub async fn count(&self, key: &str) -> u32 {
        let windows = self.windows.read().await;
        windows
            .get(key)
            .filter(|w| !w.expired(self.window))
            .map(|w| w.count)
            .unwrap_or(0)
    }
}

/// The limiter pair wired into the router
pub struct RateLimits {
    pub general: RateLimiter,
    pub auth: RateLimiter,
}

impl RateLimits {
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            general: RateLimiter::new(
                config.max_requests,
                Duration::from_secs(config.window_seconds),
                "Too many requests, please try again later",
            ),
            auth: RateLimiter::new(
                config.auth_max_requests,
                Duration::from_secs(config.auth_window_seconds),
                "Too many authentication attempts, please try again later",
            ),
        }
    }
}
