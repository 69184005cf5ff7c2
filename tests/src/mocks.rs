//! Mock implementations for testing.

use async_trait::async_trait;
use clickhouse_client::{ContactStore, EventStore, ProjectStore, StoreProbe};
use portfolio_core::{
    rank_top, ClickKind, ContactMessage, ContactStatus, DataKey, Error, EventFilter, EventRecord,
    Project, ProjectDraft, ProjectQuery, ProjectStatus, RankedCount, Result,
};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// In-memory store implementing every store trait.
///
/// Mirrors the ClickHouse semantics closely enough for handler tests, so
/// the router runs the same code paths it does in production.
#[derive(Clone, Default)]
pub struct MemoryStore {
    events: Arc<Mutex<Vec<EventRecord>>>,
    projects: Arc<Mutex<HashMap<String, Project>>>,
    contacts: Arc<Mutex<Vec<ContactMessage>>>,
    /// Simulate store failures if set.
    should_fail: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation fails with a store error while set.
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<EventRecord> {
        self.events.lock().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }

    pub fn contacts(&self) -> Vec<ContactMessage> {
        self.contacts.lock().clone()
    }

    pub fn project(&self, id: &str) -> Option<Project> {
        self.projects.lock().get(id).cloned()
    }

    pub fn seed_project(&self, project: Project) {
        self.projects.lock().insert(project.id.clone(), project);
    }

    pub fn seed_event(&self, event: EventRecord) {
        self.events.lock().push(event);
    }

    fn check(&self) -> Result<()> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(Error::store("Mock store failure"));
        }
        Ok(())
    }

    fn matching(&self, filter: &EventFilter) -> Vec<EventRecord> {
        self.events
            .lock()
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn insert_event(&self, event: &EventRecord) -> Result<()> {
        self.check()?;
        self.events.lock().push(event.clone());
        Ok(())
    }

    async fn count_events(&self, filter: &EventFilter) -> Result<u64> {
        self.check()?;
        Ok(self.matching(filter).len() as u64)
    }

    async fn count_distinct_sessions(&self, filter: &EventFilter) -> Result<u64> {
        self.check()?;
        let mut sessions: Vec<String> = self
            .matching(filter)
            .into_iter()
            .map(|e| e.session_id)
            .collect();
        sessions.sort();
        sessions.dedup();
        Ok(sessions.len() as u64)
    }

    async fn top_values(
        &self,
        filter: &EventFilter,
        key: DataKey,
        limit: usize,
    ) -> Result<Vec<RankedCount>> {
        self.check()?;
        let mut counts: HashMap<String, u64> = HashMap::new();
        for event in self.matching(&filter.with_type(key.event_type())) {
            if let Some(value) = event.payload.group_value(key) {
                *counts.entry(value.to_string()).or_default() += 1;
            }
        }
        Ok(rank_top(counts, limit))
    }

    async fn find_events(
        &self,
        filter: &EventFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<EventRecord>> {
        self.check()?;
        let mut events = self.matching(filter);
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(events
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn list_projects(&self, query: &ProjectQuery) -> Result<Vec<Project>> {
        self.check()?;
        let projects: Vec<Project> = self.projects.lock().values().cloned().collect();
        Ok(query.apply(projects))
    }

    async fn get_project(&self, id: &str) -> Result<Option<Project>> {
        self.check()?;
        Ok(self.project(id))
    }

    async fn record_view(&self, id: &str) -> Result<()> {
        self.check()?;
        if let Some(project) = self.projects.lock().get_mut(id) {
            project.views += 1;
        }
        Ok(())
    }

    async fn record_click(&self, id: &str, kind: ClickKind) -> Result<bool> {
        self.check()?;
        match self.projects.lock().get_mut(id) {
            Some(project) => {
                project.clicks.record(kind);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_project(&self, project: &Project) -> Result<()> {
        self.check()?;
        self.seed_project(project.clone());
        Ok(())
    }

    async fn update_project(&self, id: &str, draft: ProjectDraft) -> Result<Option<Project>> {
        self.check()?;
        let mut projects = self.projects.lock();
        let Some(existing) = projects.get(id) else {
            return Ok(None);
        };
        let updated = draft.apply_to(existing, Utc::now());
        projects.insert(id.to_string(), updated.clone());
        Ok(Some(updated))
    }

    async fn delete_project(&self, id: &str) -> Result<bool> {
        self.check()?;
        Ok(self.projects.lock().remove(id).is_some())
    }

    async fn count_projects(&self, status: Option<ProjectStatus>) -> Result<u64> {
        self.check()?;
        Ok(self
            .projects
            .lock()
            .values()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .count() as u64)
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn insert_contact(&self, message: &ContactMessage) -> Result<()> {
        self.check()?;
        self.contacts.lock().push(message.clone());
        Ok(())
    }

    async fn count_contacts(&self, status: Option<ContactStatus>) -> Result<u64> {
        self.check()?;
        Ok(self
            .contacts
            .lock()
            .iter()
            .filter(|c| status.map_or(true, |s| c.status == s))
            .count() as u64)
    }
}

#[async_trait]
impl StoreProbe for MemoryStore {
    async fn ping(&self) -> Result<()> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(Error::unavailable("Mock store unreachable"));
        }
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[tokio::test]
    async fn test_failure_mode() {
        let store = MemoryStore::new();
        store.set_should_fail(true);
        assert!(store.count_events(&EventFilter::all()).await.is_err());
        assert!(store.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_update_keeps_counters() {
        let store = MemoryStore::new();
        let mut project = fixtures::project("p1", true, 0);
        project.views = 7;
        store.seed_project(project);

        let updated = store
            .update_project("p1", fixtures::project_draft("Renamed project"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Renamed project");
        assert_eq!(updated.views, 7);
    }
}
