//! Tracker client against the real router over TCP.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{http::StatusCode, routing::post, Router};
use integration_tests::{fixtures, setup::TestContext};
use portfolio_core::{ClickKind, EventPayload, EventType};
use tokio::net::TcpListener;
use tracker::Tracker;

/// Serves `router` on an ephemeral port and returns the API base URL.
async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().expect("No local address");

    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    format!("http://{}/api", addr)
}

#[tokio::test]
async fn test_tracker_events_reach_store_with_session() {
    let ctx = TestContext::new();
    let base_url = serve(ctx.router.clone()).await;
    let tracker = Tracker::http(base_url).unwrap();

    // Sequential flushes keep arrival order deterministic.
    assert!(tracker.track_page_view("/").success);
    tracker.flush().await;
    assert!(tracker.track_section_view("about").success);
    tracker.flush().await;
    assert!(tracker.track_resume_download().success);
    tracker.flush().await;

    let events = ctx.store.events();
    assert_eq!(events.len(), 3);
    let session = tracker.session_id();
    assert!(events.iter().all(|e| e.session_id == session));
    assert!(events.iter().all(|e| e.ip_address == "127.0.0.1"));
    assert_eq!(events[1].event_type(), EventType::SectionView);
    assert_eq!(events[2].event_type(), EventType::DownloadResume);
}

#[tokio::test]
async fn test_tracker_project_click_paths() {
    let ctx = TestContext::new();
    ctx.store.seed_project(fixtures::project("p1", true, 1));
    let base_url = serve(ctx.router.clone()).await;
    let tracker = Tracker::http(base_url).unwrap();

    assert!(tracker.track_project_click("p1", ClickKind::Live).success);
    assert!(tracker.record_project_click("p1", ClickKind::Live).success);
    tracker.flush().await;

    let events = ctx.store.events();
    assert_eq!(events.len(), 1);
    match &events[0].payload {
        EventPayload::ProjectClick(data) => {
            assert_eq!(data.project_id, "p1");
            assert_eq!(data.kind, ClickKind::Live);
        }
        other => panic!("unexpected payload {:?}", other),
    }
    assert_eq!(ctx.store.project("p1").unwrap().clicks.live, 1);
}

#[tokio::test]
async fn test_tracker_swallows_server_failures() {
    let ctx = TestContext::offline();
    let base_url = serve(ctx.router.clone()).await;
    let tracker = Tracker::http(base_url).unwrap();

    // 503 from the server is not surfaced to the caller.
    assert!(tracker.track_page_view("/").success);
    assert!(tracker.track_contact_form().success);
    tracker.flush().await;
    // Unknown project click 404s silently too.
    ctx.bring_store_up();
    assert!(tracker.record_project_click("missing", ClickKind::Github).success);
    tracker.flush().await;

    assert_eq!(ctx.store.event_count(), 0);
}

#[tokio::test]
async fn test_slow_server_does_not_delay_ack() {
    let slow = Router::new().route(
        "/api/analytics/track",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            StatusCode::OK
        }),
    );
    let base_url = serve(slow).await;
    let tracker = Tracker::http(base_url).unwrap();

    let started = Instant::now();
    assert!(tracker.track_page_view("/").success);
    assert!(started.elapsed() < Duration::from_millis(500));

    tracker.flush().await;
    assert!(started.elapsed() >= Duration::from_secs(2));
}

#[tokio::test]
async fn test_project_id_is_escaped_in_click_path() {
    let ctx = TestContext::new();
    ctx.store.seed_project(fixtures::project("a b", true, 1));
    let base_url = serve(ctx.router.clone()).await;
    let tracker = Tracker::http(base_url).unwrap();

    assert!(tracker.record_project_click("a b", ClickKind::Github).success);
    tracker.flush().await;

    assert_eq!(ctx.store.project("a b").unwrap().clicks.github, 1);
}
