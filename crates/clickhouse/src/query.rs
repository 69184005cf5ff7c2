//! Read queries: event aggregation, project listing and counts.

use std::time::Instant;

use clickhouse::query::Query;
use clickhouse::Row;
use portfolio_core::{
    ContactStatus, DataKey, EventFilter, EventRecord, Project, ProjectQuery, ProjectStatus,
    RankedCount, Result,
};
use serde::Deserialize;
use telemetry::metrics;

use crate::client::ClickHouseClient;
use crate::insert::{EventRow, ProjectViewRow};

/// Event filter condition; bound by [`bind_filter`].
const EVENT_WHERE: &str =
    "(? = '' OR type = ?) AND created_at >= fromUnixTimestamp64Milli(toInt64(?), 'UTC')";

fn bind_filter(query: Query, filter: &EventFilter) -> Query {
    let event_type = filter.event_type.map(|t| t.as_str()).unwrap_or("");
    let since = filter.since.map(|s| s.timestamp_millis()).unwrap_or(0);
    query.bind(event_type).bind(event_type).bind(since)
}

/// Counts events matching the filter.
pub async fn count_events(client: &ClickHouseClient, filter: &EventFilter) -> Result<u64> {
    let sql = format!("SELECT count() FROM events WHERE {}", EVENT_WHERE);
    let query = bind_filter(client.inner().query(&sql), filter);
    timed(client.bounded("count events", query.fetch_one::<u64>())).await
}

/// Counts distinct sessions among events matching the filter.
pub async fn count_distinct_sessions(client: &ClickHouseClient, filter: &EventFilter) -> Result<u64> {
    let sql = format!("SELECT uniqExact(session_id) FROM events WHERE {}", EVENT_WHERE);
    let query = bind_filter(client.inner().query(&sql), filter);
    timed(client.bounded("count sessions", query.fetch_one::<u64>())).await
}

#[derive(Debug, Row, Deserialize)]
struct RankedRow {
    group_key: String,
    hits: u64,
}

/// Top values of a data key for its event type within the filter window.
pub async fn top_values(
    client: &ClickHouseClient,
    filter: &EventFilter,
    key: DataKey,
    limit: usize,
) -> Result<Vec<RankedCount>> {
    let scoped = filter.with_type(key.event_type());
    let sql = format!(
        "SELECT JSONExtractString(data, ?) AS group_key, count() AS hits \
         FROM events WHERE {} \
         GROUP BY group_key ORDER BY hits DESC, group_key ASC LIMIT ?",
        EVENT_WHERE
    );
    let query = bind_filter(client.inner().query(&sql).bind(key.json_field()), &scoped)
        .bind(limit as u64);

    let rows: Vec<RankedRow> = timed(client.bounded("top values", query.fetch_all())).await?;
    Ok(rows
        .into_iter()
        .map(|r| RankedCount {
            key: r.group_key,
            count: r.hits,
        })
        .collect())
}

/// Matching events, newest first.
pub async fn find_events(
    client: &ClickHouseClient,
    filter: &EventFilter,
    offset: u64,
    limit: u64,
) -> Result<Vec<EventRecord>> {
    let sql = format!(
        "SELECT ?fields FROM events WHERE {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        EVENT_WHERE
    );
    let query = bind_filter(client.inner().query(&sql), filter)
        .bind(limit)
        .bind(offset);

    let rows: Vec<EventRow> = timed(client.bounded("find events", query.fetch_all())).await?;
    rows.into_iter().map(EventRecord::try_from).collect()
}

/// Latest live version of every project joined with its summed counters.
/// The placeholder is the extra condition on the project subquery.
const PROJECT_SELECT: &str = r#"
SELECT
    p.id AS id,
    p.title AS title,
    p.description AS description,
    p.technologies AS technologies,
    p.github_url AS github_url,
    p.live_url AS live_url,
    p.image_url AS image_url,
    p.featured AS featured,
    p.sort_order AS sort_order,
    p.status AS status,
    toUnixTimestamp64Milli(p.created_at) AS created_at,
    toUnixTimestamp64Milli(p.updated_at) AS updated_at,
    c.views AS views,
    c.github_clicks AS github_clicks,
    c.live_clicks AS live_clicks
FROM (
    SELECT * FROM (SELECT * FROM projects FINAL) WHERE deleted = 0 AND {condition}
) AS p
LEFT JOIN (
    SELECT
        project_id,
        sum(views) AS views,
        sum(github_clicks) AS github_clicks,
        sum(live_clicks) AS live_clicks
    FROM project_counters
    GROUP BY project_id
) AS c ON p.id = c.project_id
"#;

fn project_sql(condition: &str, tail: &str) -> String {
    format!("{} {}", PROJECT_SELECT.replace("{condition}", condition), tail)
}

async fn fetch_projects(client: &ClickHouseClient, query: Query) -> Result<Vec<Project>> {
    let rows: Vec<ProjectViewRow> = timed(client.bounded("fetch projects", query.fetch_all())).await?;
    rows.into_iter().map(Project::try_from).collect()
}

/// Published projects per the listing rules.
pub async fn list_projects(client: &ClickHouseClient, query: &ProjectQuery) -> Result<Vec<Project>> {
    let condition = if query.featured_only {
        "status = 'published' AND featured = 1"
    } else {
        "status = 'published'"
    };
    let mut tail = String::from("ORDER BY featured DESC, sort_order ASC, created_at DESC, id ASC");
    if let Some(limit) = query.limit {
        tail.push_str(&format!(" LIMIT {}", limit));
    }

    let sql = project_sql(condition, &tail);
    fetch_projects(client, client.inner().query(&sql)).await
}

/// Any live project by id.
pub async fn get_project(client: &ClickHouseClient, id: &str) -> Result<Option<Project>> {
    let sql = project_sql("id = ?", "LIMIT 1");
    let projects = fetch_projects(client, client.inner().query(&sql).bind(id)).await?;
    Ok(projects.into_iter().next())
}

/// Counts live projects, optionally by status.
pub async fn count_projects(client: &ClickHouseClient, status: Option<ProjectStatus>) -> Result<u64> {
    let status = status.map(|s| s.as_str()).unwrap_or("");
    let query = client
        .inner()
        .query(
            "SELECT count() FROM (SELECT status, deleted FROM projects FINAL) \
             WHERE deleted = 0 AND (? = '' OR status = ?)",
        )
        .bind(status)
        .bind(status);
    timed(client.bounded("count projects", query.fetch_one::<u64>())).await
}

/// Counts contact messages, optionally by status.
pub async fn count_contacts(client: &ClickHouseClient, status: Option<ContactStatus>) -> Result<u64> {
    let status = status.map(|s| s.as_str()).unwrap_or("");
    let query = client
        .inner()
        .query("SELECT count() FROM contacts WHERE (? = '' OR status = ?)")
        .bind(status)
        .bind(status);
    timed(client.bounded("count contacts", query.fetch_one::<u64>())).await
}

/// Truncates every table (test cleanup).
pub async fn truncate_all(client: &ClickHouseClient) -> Result<()> {
    for table in crate::schema::TABLES {
        let sql = format!("TRUNCATE TABLE IF EXISTS {}", table);
        client
            .bounded("truncate", client.inner().query(&sql).execute())
            .await?;
    }
    Ok(())
}

async fn timed<T>(fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
    let start = Instant::now();
    let result = fut.await;
    metrics().query_latency_ms.observe_since(start);
    if result.is_err() {
        metrics().store_errors.inc();
    }
    result
}
