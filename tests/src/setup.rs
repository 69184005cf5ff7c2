//! Common test setup functions.

use api::{middleware::RateLimitConfig, router, AppState};
use axum::Router;
use axum_test::TestServer;
use clickhouse_client::{query::truncate_all, ClickHouseClient, ConnectionManager};
use portfolio_core::{AvailabilityGate, GateController};
use std::sync::Arc;
use std::time::Duration;

use crate::containers::TestClickHouse;
use crate::fixtures::ADMIN_TOKEN;
use crate::mocks::MemoryStore;

/// Test context with an in-memory store behind the real router.
///
/// - Uses the real Axum router with all middleware
/// - Uses MemoryStore which implements every store trait
/// - Owns the gate controller, so tests can take the store "down" and
///   back "up" without rebuilding the router
/// - Trusts forwarded-for headers unless built with `direct_with_rate_limit`,
///   since the in-process transport has no peer address
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub controller: GateController,
    pub router: Router,
}

impl TestContext {
    /// Store reachable.
    pub fn new() -> Self {
        Self::build(true, RateLimitConfig::default(), true)
    }

    /// Store unreachable since startup.
    pub fn offline() -> Self {
        Self::build(false, RateLimitConfig::default(), true)
    }

    pub fn with_rate_limit(max_requests: u32) -> Self {
        Self::build(true, limit(max_requests), true)
    }

    /// Rate limited, with clients talking to the server directly.
    pub fn direct_with_rate_limit(max_requests: u32) -> Self {
        Self::build(true, limit(max_requests), false)
    }

    fn build(available: bool, rate_limit: RateLimitConfig, trust_proxy: bool) -> Self {
        let store = Arc::new(MemoryStore::new());
        let controller = GateController::new(available);
        let state = AppState::with_store(controller.gate(), store.clone())
            .with_rate_limit(rate_limit)
            .with_trust_proxy(trust_proxy)
            .with_admin_token(Some(ADMIN_TOKEN.to_string()));

        Self {
            store,
            controller,
            router: router(state),
        }
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router.clone()).expect("Failed to create test server")
    }

    pub fn gate(&self) -> AvailabilityGate {
        self.controller.gate()
    }

    pub fn take_store_down(&self) {
        self.controller.mark_unavailable("connection refused");
    }

    pub fn bring_store_up(&self) {
        self.controller.mark_available();
    }
}

fn limit(max_requests: u32) -> RateLimitConfig {
    RateLimitConfig {
        max_requests,
        window_secs: 900,
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Real ClickHouse behind a connected connection manager.
pub struct ClickHouseContext {
    pub server: TestClickHouse,
    pub clickhouse: Arc<ClickHouseClient>,
    pub connection: Arc<ConnectionManager>,
}

impl ClickHouseContext {
    pub async fn new() -> Self {
        let server = TestClickHouse::start().await;
        let clickhouse = Arc::new(
            ClickHouseClient::new(server.config()).expect("Failed to create ClickHouse client"),
        );

        let connection = Arc::new(ConnectionManager::new(
            clickhouse.clone(),
            Duration::from_secs(1),
        ));
        connection
            .connect()
            .await
            .expect("Failed to connect to ClickHouse");

        truncate_all(&clickhouse).await.expect("Failed to truncate tables");

        Self {
            server,
            clickhouse,
            connection,
        }
    }

    pub fn router(&self) -> Router {
        let state = AppState::with_store(self.connection.gate(), self.clickhouse.clone())
            .with_admin_token(Some(ADMIN_TOKEN.to_string()));
        router(state)
    }
}
