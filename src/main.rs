//! Portfolio API server
//!
//! Serves portfolio projects, contact intake and event analytics backed by
//! ClickHouse, degrading to bundled project data while the database is
//! unreachable.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use api::{middleware::RateLimitConfig, router, AppState};
use clickhouse_client::{ClickHouseClient, ClickHouseConfig, ConnectionManager};
use telemetry::init_tracing_from_env;

/// Deployment mode. Production refuses to start without the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
enum Environment {
    Development,
    Production,
}

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    #[serde(default = "default_environment")]
    environment: Environment,

    /// Allowed CORS origin
    #[serde(default = "default_frontend_url")]
    frontend_url: String,

    /// Bearer token for admin routes; unset locks them
    #[serde(default)]
    admin_token: Option<String>,

    /// Behind a reverse proxy that sets `X-Forwarded-For`
    #[serde(default)]
    trust_proxy: bool,

    #[serde(default)]
    rate_limit: RateLimitConfig,

    #[serde(default)]
    clickhouse: ClickHouseConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_environment() -> Environment {
    Environment::Development
}

fn default_frontend_url() -> String {
    api::state::DEFAULT_FRONTEND_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            frontend_url: default_frontend_url(),
            admin_token: None,
            trust_proxy: false,
            rate_limit: RateLimitConfig::default(),
            clickhouse: ClickHouseConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting portfolio server v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    info!(
        environment = ?config.environment,
        trust_proxy = config.trust_proxy,
        clickhouse_url = %config.clickhouse.url,
        database = %config.clickhouse.database,
        "Loaded configuration"
    );
    if config.admin_token.is_none() {
        warn!("No admin token configured; admin routes will reject every request");
    }

    let clickhouse = Arc::new(
        ClickHouseClient::new(config.clickhouse.clone())
            .context("Failed to create ClickHouse client")?,
    );

    // Gate starts closed; the first successful connect opens it.
    let connection = Arc::new(ConnectionManager::new(
        clickhouse.clone(),
        Duration::from_secs(config.clickhouse.health_interval_secs.max(1)),
    ));

    if let Err(e) = connection.connect().await {
        if config.environment == Environment::Production {
            return Err(e).context("Database connection failed in production");
        }
        warn!(error = %e, "Database unavailable, serving fallback data until it reconnects");
    }

    let _monitor = connection.clone().spawn_monitor();

    let state = AppState::with_store(connection.gate(), clickhouse.clone())
        .with_rate_limit(config.rate_limit.clone())
        .with_trust_proxy(config.trust_proxy)
        .with_admin_token(config.admin_token.clone())
        .with_frontend_url(&config.frontend_url);

    let _rate_limiter_cleanup = state.start_rate_limiter_cleanup();
    info!("Started rate limiter cleanup task (every 5 minutes)");

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    // Peer addresses are the client IP unless the proxy is trusted.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("PORTFOLIO")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // The config crate's nested parsing doesn't work reliably with underscored field names
    if let Ok(url) = std::env::var("PORTFOLIO_CLICKHOUSE_URL") {
        config.clickhouse.url = url;
    }
    if let Ok(database) = std::env::var("PORTFOLIO_CLICKHOUSE_DATABASE") {
        config.clickhouse.database = database;
    }
    if let Ok(username) = std::env::var("PORTFOLIO_CLICKHOUSE_USERNAME") {
        config.clickhouse.username = Some(username);
    }
    if let Ok(password) = std::env::var("PORTFOLIO_CLICKHOUSE_PASSWORD") {
        config.clickhouse.password = Some(password);
    }
    if let Ok(token) = std::env::var("PORTFOLIO_ADMIN_TOKEN") {
        config.admin_token = Some(token);
    }
    if let Ok(environment) = std::env::var("PORTFOLIO_ENVIRONMENT") {
        config.environment = match environment.trim().to_ascii_lowercase().as_str() {
            "production" => Environment::Production,
            "development" => Environment::Development,
            other => anyhow::bail!("Unknown environment '{}'", other),
        };
    }

    Ok(config)
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
