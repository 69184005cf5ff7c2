//! ClickHouse client wrapper.

use std::future::Future;
use std::time::Duration;

use clickhouse::Client;
use portfolio_core::{Error, Result};
use tracing::info;

use crate::config::ClickHouseConfig;

/// ClickHouse client bound to the service database.
#[derive(Clone)]
pub struct ClickHouseClient {
    inner: Client,
    /// Same server, no default database; used to create the database itself.
    server: Client,
    config: ClickHouseConfig,
}

impl ClickHouseClient {
    /// Creates a new ClickHouse client. No connection is made yet.
    pub fn new(config: ClickHouseConfig) -> Result<Self> {
        config.validate_database().map_err(Error::internal)?;

        let mut server = Client::default().with_url(&config.url);
        if let Some(ref user) = config.username {
            server = server.with_user(user);
        }
        if let Some(ref pass) = config.password {
            server = server.with_password(pass);
        }
        let inner = server.clone().with_database(&config.database);

        info!(
            url = %config.url,
            database = %config.database,
            "Created ClickHouse client"
        );

        Ok(Self {
            inner,
            server,
            config,
        })
    }

    /// Returns the inner clickhouse client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    /// Client without a default database.
    pub(crate) fn server(&self) -> &Client {
        &self.server
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClickHouseConfig {
        &self.config
    }

    /// Runs a store operation bounded by `timeout_secs`.
    pub(crate) async fn bounded<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, clickhouse::error::Error>>,
    {
        let secs = self.config.timeout_secs;
        match tokio::time::timeout(Duration::from_secs(secs), fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(Error::store(format!("{}: {}", what, e))),
            Err(_) => Err(Error::Timeout(secs)),
        }
    }
}
