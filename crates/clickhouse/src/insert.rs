//! Row types and insert helpers for ClickHouse.

use std::time::Instant;

use chrono::{DateTime, Utc};
use clickhouse::Row;
use portfolio_core::{
    ClickCounters, ClickKind, ContactMessage, Error, EventPayload, EventRecord,
    EventType, Project, ProjectStatus, Result,
};
use serde::{Deserialize, Serialize};
use telemetry::metrics;
use tracing::debug;
use uuid::Uuid;

use crate::client::ClickHouseClient;

pub(crate) fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Row of the `events` table.
#[derive(Debug, Clone, Row, Serialize, Deserialize)]
pub struct EventRow {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    /// JSON object
    pub data: String,
    pub session_id: String,
    pub ip_address: String,
    pub user_agent: String,
    pub referrer: String,
    /// DateTime64(3) as milliseconds
    pub created_at: i64,
}

impl From<&EventRecord> for EventRow {
    fn from(event: &EventRecord) -> Self {
        Self {
            id: event.id.to_string(),
            event_type: event.event_type().as_str().to_string(),
            data: event.payload.data().to_string(),
            session_id: event.session_id.clone(),
            ip_address: event.ip_address.clone(),
            user_agent: event.user_agent.clone(),
            referrer: event.referrer.clone(),
            created_at: event.created_at.timestamp_millis(),
        }
    }
}

impl TryFrom<EventRow> for EventRecord {
    type Error = Error;

    fn try_from(row: EventRow) -> Result<Self> {
        let corrupt = |e: Error| Error::store(format!("stored event {} is malformed: {}", row.id, e));
        let event_type: EventType = row.event_type.parse().map_err(corrupt)?;
        let data: serde_json::Value = serde_json::from_str(&row.data)
            .map_err(|e| corrupt(Error::Serialization(e)))?;
        let payload = EventPayload::from_parts(event_type, data).map_err(corrupt)?;
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| Error::store(format!("stored event id '{}': {}", row.id, e)))?;

        Ok(EventRecord {
            id,
            payload,
            session_id: row.session_id,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            referrer: row.referrer,
            created_at: from_millis(row.created_at),
        })
    }
}

/// Row of the `projects` table.
#[derive(Debug, Clone, Row, Serialize, Deserialize)]
pub struct ProjectRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub github_url: String,
    pub live_url: String,
    pub image_url: String,
    pub featured: u8,
    pub sort_order: i32,
    pub status: String,
    pub deleted: u8,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ProjectRow {
    /// A new version of `project`. Counters live in `project_counters`.
    pub fn version(project: &Project, deleted: bool) -> Self {
        Self {
            id: project.id.clone(),
            title: project.title.clone(),
            description: project.description.clone(),
            technologies: project.technologies.clone(),
            github_url: project.github_url.clone(),
            live_url: project.live_url.clone(),
            image_url: project.image_url.clone(),
            featured: u8::from(project.featured),
            sort_order: project.order,
            status: project.status.as_str().to_string(),
            deleted: u8::from(deleted),
            created_at: project.created_at.timestamp_millis(),
            updated_at: project.updated_at.timestamp_millis(),
        }
    }
}

/// Delta row of the `project_counters` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Row, Serialize)]
pub struct CounterDelta {
    pub project_id: String,
    pub views: u64,
    pub github_clicks: u64,
    pub live_clicks: u64,
}

impl CounterDelta {
    pub fn view(project_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            views: 1,
            ..Default::default()
        }
    }

    pub fn click(project_id: &str, kind: ClickKind) -> Self {
        let mut delta = Self {
            project_id: project_id.to_string(),
            ..Default::default()
        };
        match kind {
            ClickKind::Github => delta.github_clicks = 1,
            ClickKind::Live => delta.live_clicks = 1,
        }
        delta
    }
}

/// Project joined with its summed counters, as read back.
#[derive(Debug, Clone, Row, Deserialize)]
pub struct ProjectViewRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub github_url: String,
    pub live_url: String,
    pub image_url: String,
    pub featured: u8,
    pub sort_order: i32,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub views: u64,
    pub github_clicks: u64,
    pub live_clicks: u64,
}

impl TryFrom<ProjectViewRow> for Project {
    type Error = Error;

    fn try_from(row: ProjectViewRow) -> Result<Self> {
        let status: ProjectStatus = row
            .status
            .parse()
            .map_err(|_| Error::store(format!("project {} has status '{}'", row.id, row.status)))?;

        Ok(Project {
            id: row.id,
            title: row.title,
            description: row.description,
            technologies: row.technologies,
            github_url: row.github_url,
            live_url: row.live_url,
            image_url: row.image_url,
            featured: row.featured != 0,
            order: row.sort_order,
            status,
            views: row.views,
            clicks: ClickCounters {
                github: row.github_clicks,
                live: row.live_clicks,
            },
            created_at: from_millis(row.created_at),
            updated_at: from_millis(row.updated_at),
        })
    }
}

/// Row of the `contacts` table.
#[derive(Debug, Clone, Row, Serialize, Deserialize)]
pub struct ContactRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub status: String,
    pub ip_address: String,
    pub created_at: i64,
}

impl From<&ContactMessage> for ContactRow {
    fn from(msg: &ContactMessage) -> Self {
        Self {
            id: msg.id.to_string(),
            name: msg.name.clone(),
            email: msg.email.clone(),
            message: msg.message.clone(),
            status: msg.status.as_str().to_string(),
            ip_address: msg.ip_address.clone(),
            created_at: msg.created_at.timestamp_millis(),
        }
    }
}

/// Writes rows to `table` in one INSERT.
async fn insert_rows<T>(client: &ClickHouseClient, table: &str, rows: &[T]) -> Result<usize>
where
    T: Row + Serialize + Send + Sync,
{
    if rows.is_empty() {
        return Ok(0);
    }

    let write = async {
        let mut insert = client.inner().insert::<T>(table)?;
        for row in rows {
            insert.write(row).await?;
        }
        insert.end().await
    };

    client.bounded(table, write).await.inspect_err(|_| {
        metrics().store_errors.inc();
    })?;
    Ok(rows.len())
}

/// Appends one analytics event.
pub async fn insert_event(client: &ClickHouseClient, event: &EventRecord) -> Result<()> {
    let start = Instant::now();
    insert_rows(client, "events", &[EventRow::from(event)]).await?;
    metrics().ingest_latency_ms.observe_since(start);

    debug!(
        event_id = %event.id,
        event_type = %event.event_type(),
        latency_ms = %start.elapsed().as_millis(),
        "Inserted event"
    );
    Ok(())
}

/// Writes a new version of a project row.
pub async fn insert_project_version(
    client: &ClickHouseClient,
    project: &Project,
    deleted: bool,
) -> Result<()> {
    insert_rows(client, "projects", &[ProjectRow::version(project, deleted)]).await?;
    Ok(())
}

/// Adds one counter delta.
pub async fn insert_counter_delta(client: &ClickHouseClient, delta: CounterDelta) -> Result<()> {
    insert_rows(client, "project_counters", &[delta]).await?;
    Ok(())
}

/// Stores a contact message.
pub async fn insert_contact(client: &ClickHouseClient, message: &ContactMessage) -> Result<()> {
    insert_rows(client, "contacts", &[ContactRow::from(message)]).await?;
    debug!(contact_id = %message.id, "Inserted contact message");
    Ok(())
}
