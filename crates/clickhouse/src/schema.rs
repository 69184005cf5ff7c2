//! ClickHouse table schemas.
//!
//! - `events`: append-only analytics log, `data` kept as a JSON string
//! - `projects`: ReplacingMergeTree keyed by id; deletes are tombstones
//! - `project_counters`: SummingMergeTree of view/click deltas
//! - `contacts`: append-only contact messages

use tracing::debug;

use crate::client::ClickHouseClient;
use portfolio_core::Result;

/// Analytics events. Never updated or deleted by the service.
pub const CREATE_EVENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id String,
    type LowCardinality(String),
    data String,
    session_id String,
    ip_address String,
    user_agent String,
    referrer String,
    created_at DateTime64(3, 'UTC')
)
ENGINE = MergeTree()
PARTITION BY toYYYYMM(created_at)
ORDER BY (type, created_at, id)
SETTINGS index_granularity = 8192
"#;

/// Project content. The latest `updated_at` version of a row wins.
pub const CREATE_PROJECTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id String,
    title String,
    description String,
    technologies Array(String),
    github_url String,
    live_url String,
    image_url String,
    featured UInt8,
    sort_order Int32,
    status LowCardinality(String),
    deleted UInt8,
    created_at DateTime64(3, 'UTC'),
    updated_at DateTime64(3, 'UTC')
)
ENGINE = ReplacingMergeTree(updated_at)
ORDER BY id
"#;

/// View and click counters. Each increment is a delta row; reads sum them.
pub const CREATE_PROJECT_COUNTERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS project_counters (
    project_id String,
    views UInt64,
    github_clicks UInt64,
    live_clicks UInt64
)
ENGINE = SummingMergeTree()
ORDER BY project_id
"#;

/// Contact form messages.
pub const CREATE_CONTACTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS contacts (
    id String,
    name String,
    email String,
    message String,
    status LowCardinality(String),
    ip_address String,
    created_at DateTime64(3, 'UTC')
)
ENGINE = MergeTree()
PARTITION BY toYYYYMM(created_at)
ORDER BY (created_at, id)
"#;

/// SQL for creating the database. The name must already be validated.
pub fn create_database_sql(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {}", database)
}

/// All table creation statements, in dependency order.
pub fn all_tables() -> [&'static str; 4] {
    [
        CREATE_EVENTS_TABLE,
        CREATE_PROJECTS_TABLE,
        CREATE_PROJECT_COUNTERS_TABLE,
        CREATE_CONTACTS_TABLE,
    ]
}

/// Creates the database and all tables if they don't exist.
///
/// Idempotent; re-run on every reconnect.
pub async fn init_schema(client: &ClickHouseClient) -> Result<()> {
    let database = create_database_sql(&client.config().database);
    client
        .bounded("create database", client.server().query(&database).execute())
        .await?;

    for ddl in all_tables() {
        client
            .bounded("schema init", client.inner().query(ddl).execute())
            .await?;
    }

    debug!(database = %client.config().database, "ClickHouse schema initialized");
    Ok(())
}

/// Table names, for test cleanup.
pub const TABLES: [&str; 4] = ["events", "projects", "project_counters", "contacts"];
