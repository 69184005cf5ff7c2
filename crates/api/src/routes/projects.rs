//! Project listing, detail, click tracking and admin CRUD.
//!
//! Public reads degrade to the bundled project set while the store is
//! unavailable. Writes require the store.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use portfolio_core::{
    find_fallback, list_fallback, ClickKind, Error, Project, ProjectDraft, ProjectQuery,
    FALLBACK_MESSAGE,
};
use serde::Deserialize;
use telemetry::metrics;
use tracing::{debug, info};
use uuid::Uuid;

use crate::degrade::{require_live, Degradable, OnStoreError, Served};
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;

const NOT_FOUND: &str = "Project not found";
const CLICK_SKIPPED: &str = "Click tracking skipped (database unavailable)";

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub featured: Option<String>,
    pub limit: Option<String>,
}

/// GET /api/projects
pub async fn list_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<ApiResponse<Vec<Project>>, ApiError> {
    let query = ProjectQuery::from_params(params.featured.as_deref(), params.limit.as_deref());

    let served = Degradable::new(&state.gate, "list projects")
        .on_store_error(OnStoreError::Fallback)
        .run(state.projects.list_projects(&query), || list_fallback(&query))
        .await?;

    Ok(match served {
        Served::Live(projects) => ApiResponse::ok(projects),
        Served::Fallback(projects) => ApiResponse::ok(projects).with_message(FALLBACK_MESSAGE),
    })
}

/// GET /api/projects/:id
///
/// Live reads count a view. Drafts and archived projects are hidden.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Project>, ApiError> {
    let store = &state.projects;
    let live = async {
        let Some(mut project) = store.get_project(&id).await?.filter(Project::is_published) else {
            return Ok(None);
        };
        store.record_view(&id).await?;
        metrics().project_views.inc();
        project.views += 1;
        Ok::<_, Error>(Some(project))
    };

    let served = Degradable::new(&state.gate, "get project")
        .run(live, || find_fallback(&id))
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to retrieve project"))?;

    match served {
        Served::Live(Some(project)) => Ok(ApiResponse::ok(project)),
        Served::Fallback(Some(project)) => {
            Ok(ApiResponse::ok(project).with_message(FALLBACK_MESSAGE))
        }
        Served::Live(None) | Served::Fallback(None) => Err(ApiError::not_found(NOT_FOUND)),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ClickBody {
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClickOutcome {
    Recorded,
    UnknownProject,
    Skipped,
}

/// POST /api/projects/:id/click
///
/// Body: `{"type": "github" | "live"}`. Click counting never fails the
/// visitor because of the store.
pub async fn click_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<ApiResponse<()>, ApiError> {
    let body: ClickBody = serde_json::from_slice(&body).unwrap_or_default();
    let kind: ClickKind = body.kind.as_deref().unwrap_or_default().trim().parse()?;

    let live = async {
        let found = state.projects.record_click(&id, kind).await?;
        Ok::<_, Error>(if found {
            ClickOutcome::Recorded
        } else {
            ClickOutcome::UnknownProject
        })
    };

    let outcome = Degradable::new(&state.gate, "record click")
        .on_store_error(OnStoreError::Fallback)
        .run(live, || ClickOutcome::Skipped)
        .await?
        .into_inner();

    match outcome {
        ClickOutcome::Recorded => {
            metrics().project_clicks.inc();
            debug!(project_id = %id, kind = %kind, "Click recorded");
            Ok(ApiResponse::message("Click tracked successfully"))
        }
        ClickOutcome::UnknownProject => Err(ApiError::not_found(NOT_FOUND)),
        ClickOutcome::Skipped => {
            metrics().clicks_skipped.inc();
            Ok(ApiResponse::message(CLICK_SKIPPED))
        }
    }
}

fn parse_draft(body: &[u8]) -> Result<ProjectDraft, ApiError> {
    let draft: ProjectDraft =
        serde_json::from_slice(body).map_err(|_| ApiError::bad_request("Invalid JSON body"))?;
    Ok(draft.normalize()?)
}

/// POST /api/projects/admin/create
pub async fn create_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, ApiResponse<Project>), ApiError> {
    let draft = parse_draft(&body)?;
    require_live(&state.gate, "Database unavailable")?;

    let project = draft.into_project(Uuid::new_v4().to_string(), Utc::now());
    state
        .projects
        .create_project(&project)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to create project"))?;

    info!(project_id = %project.id, title = %project.title, "Project created");
    Ok((StatusCode::CREATED, ApiResponse::ok(project)))
}

/// PUT /api/projects/admin/:id
pub async fn update_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<ApiResponse<Project>, ApiError> {
    let draft = parse_draft(&body)?;
    require_live(&state.gate, "Database unavailable")?;

    let updated = state
        .projects
        .update_project(&id, draft)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to update project"))?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    info!(project_id = %id, "Project updated");
    Ok(ApiResponse::ok(updated))
}

/// DELETE /api/projects/admin/:id
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, ApiError> {
    require_live(&state.gate, "Database unavailable")?;

    let deleted = state
        .projects
        .delete_project(&id)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to delete project"))?;
    if !deleted {
        return Err(ApiError::not_found(NOT_FOUND));
    }

    info!(project_id = %id, "Project deleted");
    Ok(ApiResponse::message("Project deleted successfully"))
}
