//! Rate limiting middleware.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry::metrics;
use tracing::warn;

use crate::extractors::ClientIp;
use crate::response::ApiError;
use crate::state::AppState;

/// Token bucket rate limiter, one bucket per client key.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, TokenBucket>>,
    config: RateLimitConfig,
}

/// `max_requests` per `window_secs`, refilled continuously.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_max_requests() -> u32 {
    100
}

fn default_window_secs() -> u64 {
    15 * 60
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs.max(1))
    }

    /// Tokens regained per second.
    fn rate(&self) -> f64 {
        self.max_requests as f64 / self.window().as_secs_f64()
    }

    fn burst(&self) -> f64 {
        self.max_requests as f64
    }
}

struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(burst: f64) -> Self {
        Self {
            tokens: burst,
            last_update: Instant::now(),
        }
    }

    /// Consumes a token, or returns the wait until one is available.
    fn try_acquire(&mut self, rate: f64, burst: f64) -> Result<(), Duration> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.last_update = now;

        self.tokens = (self.tokens + elapsed * rate).min(burst);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else if rate > 0.0 {
            Err(Duration::from_secs_f64((1.0 - self.tokens) / rate))
        } else {
            Err(Duration::MAX)
        }
    }
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check if request is allowed for the given key.
    ///
    /// On rejection, returns whole seconds until the next token.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        let mut buckets = self.buckets.lock();

        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.config.burst()));

        bucket
            .try_acquire(self.config.rate(), self.config.burst())
            .map_err(|wait| {
                let window = self.config.window().as_secs_f64();
                wait.as_secs_f64().ceil().clamp(1.0, window) as u64
            })
    }

    /// Drops buckets idle for a full window; they would be full again anyway.
    pub fn cleanup_stale(&self) -> usize {
        let max_age = self.config.window();
        let mut buckets = self.buckets.lock();
        let before = buckets.len();
        let now = Instant::now();

        buckets.retain(|_, bucket| now.duration_since(bucket.last_update) < max_age);
        before - buckets.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().len()
    }
}

/// Shared rate limiter state.
pub type SharedRateLimiter = Arc<RateLimiter>;

/// Per-IP limit over every `/api` route.
pub async fn rate_limit(
    State(state): State<AppState>,
    ip: ClientIp,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Err(retry_after) = state.rate_limiter.check(ip.key()) {
        metrics().rate_limited_requests.inc();
        warn!(ip = %ip.key(), retry_after, "Rate limit exceeded");
        return Err(ApiError::rate_limited(retry_after));
    }

    Ok(next.run(request).await)
}
