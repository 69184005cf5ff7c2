//! Store traits used by the HTTP layer.
//!
//! [`ClickHouseClient`](crate::ClickHouseClient) implements all of them;
//! tests substitute in-memory implementations.

use async_trait::async_trait;
use portfolio_core::{
    ClickKind, ContactMessage, ContactStatus, DataKey, EventFilter, EventRecord, Project,
    ProjectDraft, ProjectQuery, ProjectStatus, RankedCount, Result,
};

/// Analytics event persistence and aggregation.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends one event.
    async fn insert_event(&self, event: &EventRecord) -> Result<()>;

    /// Number of events matching `filter`.
    async fn count_events(&self, filter: &EventFilter) -> Result<u64>;

    /// Number of distinct session ids among events matching `filter`.
    async fn count_distinct_sessions(&self, filter: &EventFilter) -> Result<u64>;

    /// Top `limit` values of `key` among events of `key.event_type()` inside
    /// the filter window; count descending, value ascending on ties.
    async fn top_values(
        &self,
        filter: &EventFilter,
        key: DataKey,
        limit: usize,
    ) -> Result<Vec<RankedCount>>;

    /// Matching events, newest first.
    async fn find_events(
        &self,
        filter: &EventFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<EventRecord>>;
}

/// Project content and counters.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Published projects, filtered, sorted and limited per `query`.
    async fn list_projects(&self, query: &ProjectQuery) -> Result<Vec<Project>>;

    /// Any non-deleted project by id, regardless of status.
    async fn get_project(&self, id: &str) -> Result<Option<Project>>;

    /// Atomically adds one view.
    async fn record_view(&self, id: &str) -> Result<()>;

    /// Atomically adds one click. Returns false if the project does not exist.
    async fn record_click(&self, id: &str, kind: ClickKind) -> Result<bool>;

    async fn create_project(&self, project: &Project) -> Result<()>;

    /// Replaces editable fields. Returns `None` if the project does not exist.
    async fn update_project(&self, id: &str, draft: ProjectDraft) -> Result<Option<Project>>;

    /// Returns false if the project does not exist.
    async fn delete_project(&self, id: &str) -> Result<bool>;

    async fn count_projects(&self, status: Option<ProjectStatus>) -> Result<u64>;
}

/// Contact message persistence.
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn insert_contact(&self, message: &ContactMessage) -> Result<()>;

    async fn count_contacts(&self, status: Option<ContactStatus>) -> Result<u64>;
}

/// Reachability probe driven by the connection manager.
#[async_trait]
pub trait StoreProbe: Send + Sync {
    /// Succeeds if the store answered within the connect timeout.
    async fn ping(&self) -> Result<()>;

    /// Creates the schema if missing.
    async fn ensure_schema(&self) -> Result<()>;
}

mod clickhouse_impl {
    use super::*;
    use crate::client::ClickHouseClient;
    use crate::insert::{self, CounterDelta};
    use crate::{health, query, schema};
    use chrono::Utc;

    #[async_trait]
    impl EventStore for ClickHouseClient {
        async fn insert_event(&self, event: &EventRecord) -> Result<()> {
            insert::insert_event(self, event).await
        }

        async fn count_events(&self, filter: &EventFilter) -> Result<u64> {
            query::count_events(self, filter).await
        }

        async fn count_distinct_sessions(&self, filter: &EventFilter) -> Result<u64> {
            query::count_distinct_sessions(self, filter).await
        }

        async fn top_values(
            &self,
            filter: &EventFilter,
            key: DataKey,
            limit: usize,
        ) -> Result<Vec<RankedCount>> {
            query::top_values(self, filter, key, limit).await
        }

        async fn find_events(
            &self,
            filter: &EventFilter,
            offset: u64,
            limit: u64,
        ) -> Result<Vec<EventRecord>> {
            query::find_events(self, filter, offset, limit).await
        }
    }

    #[async_trait]
    impl ProjectStore for ClickHouseClient {
        async fn list_projects(&self, q: &ProjectQuery) -> Result<Vec<Project>> {
            query::list_projects(self, q).await
        }

        async fn get_project(&self, id: &str) -> Result<Option<Project>> {
            query::get_project(self, id).await
        }

        async fn record_view(&self, id: &str) -> Result<()> {
            insert::insert_counter_delta(self, CounterDelta::view(id)).await
        }

        async fn record_click(&self, id: &str, kind: ClickKind) -> Result<bool> {
            if query::get_project(self, id).await?.is_none() {
                return Ok(false);
            }
            insert::insert_counter_delta(self, CounterDelta::click(id, kind)).await?;
            Ok(true)
        }

        async fn create_project(&self, project: &Project) -> Result<()> {
            insert::insert_project_version(self, project, false).await
        }

        async fn update_project(&self, id: &str, draft: ProjectDraft) -> Result<Option<Project>> {
            let Some(existing) = query::get_project(self, id).await? else {
                return Ok(None);
            };
            let updated = draft.apply_to(&existing, Utc::now());
            insert::insert_project_version(self, &updated, false).await?;
            Ok(Some(updated))
        }

        async fn delete_project(&self, id: &str) -> Result<bool> {
            let Some(mut existing) = query::get_project(self, id).await? else {
                return Ok(false);
            };
            existing.updated_at = Utc::now();
            insert::insert_project_version(self, &existing, true).await?;
            Ok(true)
        }

        async fn count_projects(&self, status: Option<ProjectStatus>) -> Result<u64> {
            query::count_projects(self, status).await
        }
    }

    #[async_trait]
    impl ContactStore for ClickHouseClient {
        async fn insert_contact(&self, message: &ContactMessage) -> Result<()> {
            insert::insert_contact(self, message).await
        }

        async fn count_contacts(&self, status: Option<ContactStatus>) -> Result<u64> {
            query::count_contacts(self, status).await
        }
    }

    #[async_trait]
    impl StoreProbe for ClickHouseClient {
        async fn ping(&self) -> Result<()> {
            health::check_connection(self).await
        }

        async fn ensure_schema(&self) -> Result<()> {
            schema::init_schema(self).await
        }
    }
}
