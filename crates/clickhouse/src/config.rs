//! ClickHouse configuration.

use serde::{Deserialize, Serialize};

/// ClickHouse client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickHouseConfig {
    /// ClickHouse HTTP URL
    #[serde(default = "default_url")]
    pub url: String,
    /// Database name
    #[serde(default = "default_database")]
    pub database: String,
    /// Username (optional)
    #[serde(default)]
    pub username: Option<String>,
    /// Password (optional)
    #[serde(default)]
    pub password: Option<String>,
    /// Bound on connection establishment and health pings
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Bound on every other store operation
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Interval between background health pings
    #[serde(default = "default_health_interval_secs")]
    pub health_interval_secs: u64,
}

fn default_url() -> String {
    "http://localhost:8123".to_string()
}

fn default_database() -> String {
    "portfolio".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_timeout_secs() -> u64 {
    45
}

fn default_health_interval_secs() -> u64 {
    10
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            database: default_database(),
            username: None,
            password: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: default_timeout_secs(),
            health_interval_secs: default_health_interval_secs(),
        }
    }
}

impl ClickHouseConfig {
    /// Rejects names that cannot be spliced into DDL unquoted.
    pub fn validate_database(&self) -> Result<(), String> {
        let valid = !self.database.is_empty()
            && self
                .database
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid {
            Ok(())
        } else {
            Err(format!("invalid ClickHouse database name '{}'", self.database))
        }
    }
}
