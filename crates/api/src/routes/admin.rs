//! Admin token check and dashboard.

use axum::extract::State;
use portfolio_core::{
    ContactCounts, ContactStatus, DashboardCounts, EventFilter, EventType, ProjectCounts,
    ProjectStatus, VisitorCounts,
};
use serde::Serialize;
use telemetry::{metrics, MetricsSnapshot};

use crate::degrade::require_live;
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;

/// GET /api/admin/verify
///
/// Reaching the handler means the auth middleware accepted the token.
pub async fn verify_handler() -> ApiResponse<()> {
    ApiResponse::message("Token is valid")
}

/// Dashboard payload: store counts plus process metrics.
#[derive(Debug, Serialize)]
pub struct Dashboard {
    #[serde(flatten)]
    pub counts: DashboardCounts,
    pub server: MetricsSnapshot,
}

/// GET /api/admin/dashboard
pub async fn dashboard_handler(
    State(state): State<AppState>,
) -> Result<ApiResponse<Dashboard>, ApiError> {
    require_live(&state.gate, "Database unavailable")?;

    let all_views = EventFilter::all().with_type(EventType::PageView);
    let all_events = EventFilter::all();

    let (contacts_total, contacts_new, projects_total, projects_published, total_views, unique_visitors) =
        tokio::try_join!(
            state.contacts.count_contacts(None),
            state.contacts.count_contacts(Some(ContactStatus::New)),
            state.projects.count_projects(None),
            state.projects.count_projects(Some(ProjectStatus::Published)),
            state.events.count_events(&all_views),
            state.events.count_distinct_sessions(&all_events),
        )
        .map_err(|e| ApiError::from_store(e, "Failed to load dashboard"))?;

    Ok(ApiResponse::ok(Dashboard {
        counts: DashboardCounts {
            contacts: ContactCounts {
                total: contacts_total,
                new: contacts_new,
            },
            projects: ProjectCounts {
                total: projects_total,
                published: projects_published,
            },
            analytics: VisitorCounts {
                total_views,
                unique_visitors,
            },
        },
        server: metrics().snapshot(),
    }))
}
