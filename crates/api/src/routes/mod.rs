//! API routes.

pub mod admin;
pub mod analytics;
pub mod contact;
pub mod health;
pub mod projects;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use portfolio_core::{limits::MAX_BODY_BYTES, SESSION_HEADER};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::middleware::{rate_limit, require_admin};
use crate::response::ApiError;
use crate::state::AppState;

/// Creates the application router.
///
/// Everything under `/api` is rate limited per client IP. Analytics
/// reporting, dashboard and project writes also require the admin token.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/analytics/track", post(analytics::track_handler))
        .route("/projects", get(projects::list_handler))
        .route("/projects/:id", get(projects::get_handler))
        .route("/projects/:id/click", post(projects::click_handler))
        .route("/contact/submit", post(contact::submit_handler))
        .route("/health", get(health::health_handler));

    let admin = Router::new()
        .route("/analytics/summary", get(analytics::summary_handler))
        .route("/analytics/detailed", get(analytics::detailed_handler))
        .route("/admin/verify", get(admin::verify_handler))
        .route("/admin/dashboard", get(admin::dashboard_handler))
        .route("/projects/admin/create", post(projects::create_handler))
        .route(
            "/projects/admin/:id",
            put(projects::update_handler).delete(projects::delete_handler),
        )
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let api = public
        .merge(admin)
        .fallback(api_not_found)
        .layer(from_fn_with_state(state.clone(), rate_limit));

    Router::new()
        .nest("/api", api)
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.frontend_url))
        .with_state(state)
}

/// Credentialed CORS for the configured frontend origin only.
fn cors_layer(frontend_url: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::HeaderName::from_static(SESSION_HEADER),
        ])
        .allow_credentials(true);

    match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            warn!(frontend_url, "Invalid frontend URL, cross-origin requests disabled");
            cors
        }
    }
}

async fn api_not_found() -> ApiError {
    ApiError::not_found("API endpoint not found")
}
