//! Project listing, detail, click tracking and admin CRUD through the router.

use axum::http::StatusCode;
use integration_tests::{fixtures, setup::TestContext};
use portfolio_core::FALLBACK_MESSAGE;
use serde_json::{json, Value};

fn seeded() -> TestContext {
    let ctx = TestContext::new();
    ctx.store.seed_project(fixtures::project("p1", true, 2));
    ctx.store.seed_project(fixtures::project("p2", true, 1));
    ctx.store.seed_project(fixtures::project("p3", false, 0));
    ctx.store.seed_project(fixtures::unpublished_project("d1"));
    ctx
}

fn ids(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_list_orders_featured_first_and_hides_drafts() {
    let ctx = seeded();
    let server = ctx.server();

    let response = server.get("/api/projects").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(ids(&body), vec!["p2", "p1", "p3"]);
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn test_list_featured_and_limit() {
    let ctx = seeded();
    let server = ctx.server();

    let body: Value = server.get("/api/projects?featured=true").await.json();
    assert_eq!(ids(&body), vec!["p2", "p1"]);

    let body: Value = server.get("/api/projects?featured=true&limit=1").await.json();
    assert_eq!(ids(&body), vec!["p2"]);

    // Non-numeric limit means no limit.
    let body: Value = server.get("/api/projects?limit=abc").await.json();
    assert_eq!(ids(&body).len(), 3);
}

#[tokio::test]
async fn test_list_falls_back_while_store_down() {
    let ctx = TestContext::offline();
    let server = ctx.server();

    let response = server.get("/api/projects?featured=true").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], FALLBACK_MESSAGE);
    assert_eq!(ids(&body), vec!["default-1", "default-2"]);
}

#[tokio::test]
async fn test_list_falls_back_on_store_error() {
    let ctx = seeded();
    ctx.store.set_should_fail(true);
    let server = ctx.server();

    let body: Value = server.get("/api/projects").await.json();
    assert_eq!(body["message"], FALLBACK_MESSAGE);
    assert_eq!(ids(&body).len(), 4);
}

#[tokio::test]
async fn test_gate_transitions_apply_without_restart() {
    let ctx = seeded();
    let server = ctx.server();

    let body: Value = server.get("/api/projects").await.json();
    assert_eq!(ids(&body)[0], "p2");

    ctx.take_store_down();
    let body: Value = server.get("/api/projects").await.json();
    assert_eq!(ids(&body)[0], "default-1");
    assert_eq!(body["message"], FALLBACK_MESSAGE);

    ctx.bring_store_up();
    let body: Value = server.get("/api/projects").await.json();
    assert_eq!(ids(&body)[0], "p2");
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn test_get_counts_view() {
    let ctx = seeded();
    let server = ctx.server();

    let body: Value = server.get("/api/projects/p1").await.json();
    assert_eq!(body["data"]["id"], "p1");
    assert_eq!(body["data"]["views"], 1);

    let body: Value = server.get("/api/projects/p1").await.json();
    assert_eq!(body["data"]["views"], 2);
    assert_eq!(ctx.store.project("p1").unwrap().views, 2);
}

#[tokio::test]
async fn test_get_hides_unpublished_and_unknown() {
    let ctx = seeded();
    let server = ctx.server();

    let response = server.get("/api/projects/d1").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["message"], "Project not found");
    assert_eq!(ctx.store.project("d1").unwrap().views, 0);

    server
        .get("/api/projects/missing")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_fallback_while_store_down() {
    let ctx = TestContext::offline();
    let server = ctx.server();

    let body: Value = server.get("/api/projects/default-3").await.json();
    assert_eq!(body["data"]["title"], "Weather Analytics Dashboard");
    assert_eq!(body["message"], FALLBACK_MESSAGE);

    server
        .get("/api/projects/p1")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_store_error_is_generic_500() {
    let ctx = seeded();
    ctx.store.set_should_fail(true);
    let server = ctx.server();

    let response = server.get("/api/projects/p1").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["message"], "Failed to retrieve project");
}

#[tokio::test]
async fn test_click_increments_counter() {
    let ctx = seeded();
    let server = ctx.server();

    let response = server
        .post("/api/projects/p1/click")
        .json(&json!({ "type": "github" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Click tracked successfully");

    server
        .post("/api/projects/p1/click")
        .json(&json!({ "type": "live" }))
        .await
        .assert_status_ok();

    let clicks = ctx.store.project("p1").unwrap().clicks;
    assert_eq!(clicks.github, 1);
    assert_eq!(clicks.live, 1);
}

#[tokio::test]
async fn test_click_rejects_bad_type_even_when_store_down() {
    let ctx = seeded();
    let server = ctx.server();

    server
        .post("/api/projects/p1/click")
        .json(&json!({ "type": "demo" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .post("/api/projects/p1/click")
        .json(&json!({}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    ctx.take_store_down();
    server
        .post("/api/projects/p1/click")
        .json(&json!({ "type": "demo" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_click_unknown_project() {
    let ctx = seeded();
    let server = ctx.server();

    server
        .post("/api/projects/missing/click")
        .json(&json!({ "type": "github" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_click_skipped_while_store_down() {
    let ctx = seeded();
    ctx.take_store_down();
    let server = ctx.server();

    let response = server
        .post("/api/projects/p1/click")
        .json(&json!({ "type": "live" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Click tracking skipped (database unavailable)");
    assert_eq!(ctx.store.project("p1").unwrap().clicks.live, 0);
}

#[tokio::test]
async fn test_admin_create_update_delete() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server
        .post("/api/projects/admin/create")
        .add_header("Authorization", &fixtures::bearer())
        .json(&fixtures::project_draft_json("  Portfolio API  "))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["title"], "Portfolio API");
    assert_eq!(body["data"]["views"], 0);

    // Counters survive updates.
    server.get(&format!("/api/projects/{}", id)).await.assert_status_ok();
    let mut update = fixtures::project_draft_json("Portfolio API v2");
    update["featured"] = json!(true);
    let body: Value = server
        .put(&format!("/api/projects/admin/{}", id))
        .add_header("Authorization", &fixtures::bearer())
        .json(&update)
        .await
        .json();
    assert_eq!(body["data"]["title"], "Portfolio API v2");
    assert_eq!(body["data"]["featured"], true);
    assert_eq!(body["data"]["views"], 1);

    let response = server
        .delete(&format!("/api/projects/admin/{}", id))
        .add_header("Authorization", &fixtures::bearer())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Project deleted successfully");
    assert!(ctx.store.project(&id).is_none());
}

#[tokio::test]
async fn test_admin_missing_project_and_validation() {
    let ctx = TestContext::new();
    let server = ctx.server();

    server
        .put("/api/projects/admin/missing")
        .add_header("Authorization", &fixtures::bearer())
        .json(&fixtures::project_draft_json("Portfolio API"))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server
        .delete("/api/projects/admin/missing")
        .add_header("Authorization", &fixtures::bearer())
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let mut invalid = fixtures::project_draft_json("Portfolio API");
    invalid["githubUrl"] = json!("https://gitlab.com/example/test");
    let response = server
        .post("/api/projects/admin/create")
        .add_header("Authorization", &fixtures::bearer())
        .json(&invalid)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["errors"].as_array().is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn test_admin_writes_require_token_and_store() {
    let ctx = TestContext::new();
    let server = ctx.server();

    server
        .post("/api/projects/admin/create")
        .json(&fixtures::project_draft_json("Portfolio API"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    ctx.take_store_down();
    let response = server
        .post("/api/projects/admin/create")
        .add_header("Authorization", &fixtures::bearer())
        .json(&fixtures::project_draft_json("Portfolio API"))
        .await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["message"], "Database unavailable");
}
