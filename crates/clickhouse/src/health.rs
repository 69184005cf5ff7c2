//! ClickHouse health checks.

use std::time::Duration;

use portfolio_core::{Error, Result};
use tracing::debug;

use crate::client::ClickHouseClient;

/// Pings the server, bounded by `connect_timeout_secs`.
///
/// Uses the database-less client so a missing database does not read as
/// an unreachable server.
pub async fn check_connection(client: &ClickHouseClient) -> Result<()> {
    let secs = client.config().connect_timeout_secs;
    let ping = client.server().query("SELECT 1").fetch_one::<u8>();

    match tokio::time::timeout(Duration::from_secs(secs), ping).await {
        Ok(Ok(_)) => {
            debug!("ClickHouse connection healthy");
            Ok(())
        }
        Ok(Err(e)) => Err(Error::unavailable(format!("ClickHouse ping failed: {}", e))),
        Err(_) => Err(Error::unavailable(format!(
            "ClickHouse ping timed out after {}s",
            secs
        ))),
    }
}
