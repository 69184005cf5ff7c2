//! Test fixtures and event generators.

use chrono::{DateTime, Duration, Utc};
use portfolio_core::{
    ClickCounters, ClickKind, EventPayload, EventRecord, PageViewData, Project, ProjectClickData,
    ProjectDraft, ProjectStatus, RequestContext, SectionViewData, TimestampData,
};
use serde_json::{json, Value};

/// Admin token configured on the test router.
pub const ADMIN_TOKEN: &str = "test-admin-token";

pub fn bearer() -> String {
    format!("Bearer {}", ADMIN_TOKEN)
}

/// `page_view` ingestion body.
pub fn page_view(page: &str) -> Value {
    json!({ "type": "page_view", "data": { "page": page } })
}

/// `section_view` ingestion body with an explicit session.
pub fn section_view(section: &str, session_id: &str) -> Value {
    json!({
        "type": "section_view",
        "data": { "section": section },
        "sessionId": session_id
    })
}

/// `project_click` ingestion body.
pub fn project_click(project_id: &str, kind: &str) -> Value {
    json!({
        "type": "project_click",
        "data": { "projectId": project_id, "type": kind }
    })
}

pub fn contact_submission() -> Value {
    json!({
        "name": "Ada Lovelace",
        "email": "Ada@Example.com",
        "message": "I would like to talk about your analytical engine."
    })
}

/// Published project.
pub fn project(id: &str, featured: bool, order: i32) -> Project {
    let now = Utc::now();
    Project {
        id: id.to_string(),
        title: format!("Project {}", id),
        description: format!("Description of project {}", id),
        technologies: vec!["Rust".to_string(), "ClickHouse".to_string()],
        github_url: format!("https://github.com/example/{}", id),
        live_url: format!("https://{}.example.com", id),
        image_url: format!("https://images.example.com/{}.png", id),
        featured,
        order,
        status: ProjectStatus::Published,
        views: 0,
        clicks: ClickCounters::default(),
        created_at: now,
        updated_at: now,
    }
}

/// Project hidden from the public site.
pub fn unpublished_project(id: &str) -> Project {
    Project {
        status: ProjectStatus::Draft,
        ..project(id, false, 0)
    }
}

/// Valid admin input.
pub fn project_draft(title: &str) -> ProjectDraft {
    ProjectDraft {
        title: title.to_string(),
        description: "A project used by the integration tests.".to_string(),
        technologies: vec!["Rust".to_string()],
        github_url: "https://github.com/example/test".to_string(),
        live_url: "https://test.example.com".to_string(),
        image_url: "https://images.example.com/test.png".to_string(),
        featured: false,
        order: 0,
        status: ProjectStatus::Published,
    }
}

pub fn project_draft_json(title: &str) -> Value {
    serde_json::to_value(project_draft(title)).unwrap()
}

fn context() -> RequestContext {
    RequestContext::new(Some("203.0.113.10"), Some("Mozilla/5.0 (Test)"), None)
}

/// Stored event with a chosen age.
pub fn stored_event(payload: EventPayload, session_id: &str, age: Duration) -> EventRecord {
    let mut record = EventRecord::new(payload, session_id, context());
    record.created_at = Utc::now() - age;
    record
}

pub fn stored_page_view(session_id: &str, age: Duration) -> EventRecord {
    stored_event(
        EventPayload::PageView(PageViewData {
            page: "/".to_string(),
        }),
        session_id,
        age,
    )
}

pub fn stored_section_view(section: &str, session_id: &str) -> EventRecord {
    stored_event(
        EventPayload::SectionView(SectionViewData {
            section: section.to_string(),
        }),
        session_id,
        Duration::minutes(5),
    )
}

pub fn stored_project_click(project_id: &str, session_id: &str) -> EventRecord {
    stored_event(
        EventPayload::ProjectClick(ProjectClickData {
            project_id: project_id.to_string(),
            kind: ClickKind::Github,
        }),
        session_id,
        Duration::minutes(5),
    )
}

pub fn stored_contact_form(session_id: &str, at: DateTime<Utc>) -> EventRecord {
    let mut record = stored_event(
        EventPayload::ContactForm(TimestampData { timestamp: at }),
        session_id,
        Duration::zero(),
    );
    record.created_at = at;
    record
}
