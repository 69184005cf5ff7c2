//! Store tests against a real ClickHouse.
//!
//! Requires Docker (or `PORTFOLIO_TEST_CLICKHOUSE_URL`):
//! `cargo test -p integration-tests --test clickhouse_store -- --ignored`

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{Duration, Utc};
use clickhouse_client::{ContactStore, EventStore, ProjectStore};
use integration_tests::{fixtures, setup::ClickHouseContext};
use portfolio_core::{
    ClickKind, ContactStatus, DataKey, EventFilter, EventType, ProjectQuery, ProjectStatus,
    RankedCount,
};
use serde_json::Value;

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_event_counts_and_breakdowns() {
    let ctx = ClickHouseContext::new().await;
    let store = &ctx.clickhouse;

    for event in [
        fixtures::stored_page_view("s1", Duration::hours(1)),
        fixtures::stored_page_view("s2", Duration::hours(2)),
        fixtures::stored_page_view("s3", Duration::days(10)),
        fixtures::stored_section_view("about", "s1"),
        fixtures::stored_section_view("about", "s2"),
        fixtures::stored_section_view("contact", "s2"),
    ] {
        store.insert_event(&event).await.unwrap();
    }

    let week = EventFilter::since(Utc::now() - Duration::days(7));
    let views = week.with_type(EventType::PageView);
    assert_eq!(store.count_events(&views).await.unwrap(), 2);
    assert_eq!(
        store
            .count_events(&EventFilter::all().with_type(EventType::PageView))
            .await
            .unwrap(),
        3
    );
    assert_eq!(store.count_distinct_sessions(&week).await.unwrap(), 2);

    let top = store.top_values(&week, DataKey::Section, 5).await.unwrap();
    assert_eq!(
        top,
        vec![
            RankedCount {
                key: "about".to_string(),
                count: 2
            },
            RankedCount {
                key: "contact".to_string(),
                count: 1
            },
        ]
    );

    let page = store
        .find_events(&EventFilter::all().with_type(EventType::PageView), 0, 2)
        .await
        .unwrap();
    let sessions: Vec<&str> = page.iter().map(|e| e.session_id.as_str()).collect();
    assert_eq!(sessions, vec!["s1", "s2"]);
    assert_eq!(page[0].ip_address, "203.0.113.10");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_project_lifecycle_and_counters() {
    let ctx = ClickHouseContext::new().await;
    let store = &ctx.clickhouse;

    let project = fixtures::project("p1", true, 1);
    store.create_project(&project).await.unwrap();
    store
        .create_project(&fixtures::unpublished_project("d1"))
        .await
        .unwrap();

    store.record_view("p1").await.unwrap();
    store.record_view("p1").await.unwrap();
    assert!(store.record_click("p1", ClickKind::Github).await.unwrap());
    assert!(!store.record_click("missing", ClickKind::Live).await.unwrap());

    let stored = store.get_project("p1").await.unwrap().unwrap();
    assert_eq!(stored.views, 2);
    assert_eq!(stored.clicks.github, 1);

    let listed = store.list_projects(&ProjectQuery::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(store.count_projects(None).await.unwrap(), 2);
    assert_eq!(
        store
            .count_projects(Some(ProjectStatus::Published))
            .await
            .unwrap(),
        1
    );

    let updated = store
        .update_project("p1", fixtures::project_draft("Renamed project"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, "Renamed project");
    assert_eq!(updated.views, 2);
    assert_eq!(updated.created_at, stored.created_at);
    assert!(store
        .update_project("missing", fixtures::project_draft("Nothing"))
        .await
        .unwrap()
        .is_none());

    assert!(store.delete_project("p1").await.unwrap());
    assert!(!store.delete_project("p1").await.unwrap());
    assert!(store.get_project("p1").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_contacts_through_router() {
    let ctx = ClickHouseContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();

    server
        .post("/api/contact/submit")
        .json(&fixtures::contact_submission())
        .await
        .assert_status_ok();

    assert_eq!(ctx.clickhouse.count_contacts(None).await.unwrap(), 1);
    assert_eq!(
        ctx.clickhouse
            .count_contacts(Some(ContactStatus::Replied))
            .await
            .unwrap(),
        0
    );

    let response = server
        .get("/api/admin/dashboard")
        .add_header("Authorization", &fixtures::bearer())
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["contacts"]["new"], 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_track_and_summary_through_router() {
    let ctx = ClickHouseContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();

    server
        .post("/api/analytics/track")
        .json(&fixtures::section_view("projects", "s1"))
        .await
        .assert_status_ok();
    server
        .post("/api/analytics/track")
        .json(&fixtures::project_click("p9", "live"))
        .await
        .assert_status_ok();

    let body: Value = server
        .get("/api/analytics/summary?period=24h")
        .add_header("Authorization", &fixtures::bearer())
        .await
        .json();
    assert_eq!(body["data"]["topPages"][0]["_id"], "projects");
    assert_eq!(body["data"]["topProjects"][0]["_id"], "p9");
    assert_eq!(body["data"]["summary"]["uniqueVisitors"], 2);
}
