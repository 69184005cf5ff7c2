//! Application state shared across handlers.

use crate::extractors::TrustProxy;
use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter, SharedRateLimiter};
use axum::extract::FromRef;
use clickhouse_client::{ContactStore, EventStore, ProjectStore};
use portfolio_core::AvailabilityGate;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Rate limiter cleanup period.
const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Store availability, written by the connection manager
    pub gate: AvailabilityGate,
    pub events: Arc<dyn EventStore>,
    pub projects: Arc<dyn ProjectStore>,
    pub contacts: Arc<dyn ContactStore>,
    pub rate_limiter: SharedRateLimiter,
    /// Bearer token for admin routes; `None` locks them
    pub admin_token: Option<Arc<str>>,
    /// Allowed CORS origin
    pub frontend_url: Arc<str>,
    /// Honor forwarded-for headers when resolving client IPs
    pub trust_proxy: TrustProxy,
}

impl FromRef<AppState> for TrustProxy {
    fn from_ref(state: &AppState) -> Self {
        state.trust_proxy
    }
}

impl AppState {
    pub fn new(
        gate: AvailabilityGate,
        events: Arc<dyn EventStore>,
        projects: Arc<dyn ProjectStore>,
        contacts: Arc<dyn ContactStore>,
    ) -> Self {
        Self {
            gate,
            events,
            projects,
            contacts,
            rate_limiter: Arc::new(RateLimiter::new(RateLimitConfig::default())),
            admin_token: None,
            frontend_url: Arc::from(DEFAULT_FRONTEND_URL),
            trust_proxy: TrustProxy::default(),
        }
    }

    /// One backend serving every store role.
    pub fn with_store<S>(gate: AvailabilityGate, store: Arc<S>) -> Self
    where
        S: EventStore + ProjectStore + ContactStore + 'static,
    {
        Self::new(gate, store.clone(), store.clone(), store)
    }

    pub fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limiter = Arc::new(RateLimiter::new(config));
        self
    }

    pub fn with_admin_token(mut self, token: Option<String>) -> Self {
        self.admin_token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(Arc::from);
        self
    }

    pub fn with_frontend_url(mut self, url: impl AsRef<str>) -> Self {
        self.frontend_url = Arc::from(url.as_ref());
        self
    }

    pub fn with_trust_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = TrustProxy(trust_proxy);
        self
    }

    /// Start the rate limiter cleanup background task.
    /// Returns a handle that can be used to cancel the task.
    pub fn start_rate_limiter_cleanup(&self) -> tokio::task::JoinHandle<()> {
        let rate_limiter = self.rate_limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                let removed = rate_limiter.cleanup_stale();
                if removed > 0 {
                    debug!(removed, "Cleaned up idle rate limit buckets");
                }
            }
        })
    }
}
