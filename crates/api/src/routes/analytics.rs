//! Analytics ingestion and reporting.

use std::collections::HashMap;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{Query, State},
};
use chrono::Utc;
use portfolio_core::{
    limits::TOP_N, AnalyticsSummary, DataKey, DetailedAnalytics, EventFilter, EventRecord,
    EventType, PageRequest, Period, SummaryCounts, TrackRequest,
};
use serde::Deserialize;
use telemetry::metrics;
use tracing::{debug, error, info};

use crate::degrade::require_live;
use crate::extractors::{RequestMeta, SessionHeader};
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;

/// POST /api/analytics/track
///
/// Validates before the gate is consulted so malformed events get a 400
/// even while the store is down.
pub async fn track_handler(
    State(state): State<AppState>,
    RequestMeta(context): RequestMeta,
    SessionHeader(header_session): SessionHeader,
    body: Bytes,
) -> Result<ApiResponse<()>, ApiError> {
    let start = Instant::now();
    metrics().events_received.inc();

    let request: TrackRequest = serde_json::from_slice(&body).map_err(|e| {
        metrics().events_rejected.inc();
        debug!(error = %e, "Invalid analytics body");
        ApiError::bad_request("Invalid JSON body")
    })?;

    let record = request
        .into_record(header_session.as_deref(), context)
        .map_err(|e| {
            metrics().events_rejected.inc();
            debug!(error = %e, "Rejected analytics event");
            ApiError::from(e)
        })?;

    require_live(&state.gate, "Analytics storage unavailable")?;

    state.events.insert_event(&record).await.map_err(|e| {
        metrics().ingest_errors.inc();
        error!(error = %e, event_type = %record.event_type(), "Failed to store event");
        ApiError::internal("Failed to track analytics")
    })?;

    metrics().events_tracked.inc();
    info!(
        event_type = %record.event_type(),
        session_id = %record.session_id,
        latency_ms = start.elapsed().as_millis() as u64,
        "Event tracked"
    );

    Ok(ApiResponse::message("Analytics tracked successfully"))
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
    pub period: Option<String>,
}

/// GET /api/analytics/summary
pub async fn summary_handler(
    State(state): State<AppState>,
    Query(params): Query<SummaryParams>,
) -> Result<ApiResponse<AnalyticsSummary>, ApiError> {
    require_live(&state.gate, "Analytics storage unavailable")?;
    let start = Instant::now();

    let period = Period::from_token(params.period.as_deref());
    let window = EventFilter::since(period.window_start(Utc::now()));
    let views_filter = window.with_type(EventType::PageView);
    let contact_filter = window.with_type(EventType::ContactForm);
    let download_filter = window.with_type(EventType::DownloadResume);

    let events = &state.events;
    let (total_views, unique_visitors, contact_forms, resume_downloads, top_pages, top_projects) =
        tokio::try_join!(
            events.count_events(&views_filter),
            events.count_distinct_sessions(&window),
            events.count_events(&contact_filter),
            events.count_events(&download_filter),
            events.top_values(&window, DataKey::Section, TOP_N),
            events.top_values(&window, DataKey::ProjectId, TOP_N),
        )
        .map_err(|e| ApiError::from_store(e, "Failed to retrieve analytics summary"))?;

    metrics().report_latency_ms.observe_since(start);

    Ok(ApiResponse::ok(AnalyticsSummary {
        period,
        summary: SummaryCounts {
            total_views,
            unique_visitors,
            contact_forms,
            resume_downloads,
        },
        top_pages,
        top_projects,
    }))
}

/// GET /api/analytics/detailed
///
/// Query: `type`, `period`, `page`, `limit`.
pub async fn detailed_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<ApiResponse<DetailedAnalytics>, ApiError> {
    let event_type = match params.get("type").map(|t| t.trim()).filter(|t| !t.is_empty()) {
        Some(t) => Some(t.parse::<EventType>()?),
        None => None,
    };
    require_live(&state.gate, "Analytics storage unavailable")?;
    let start = Instant::now();

    let period = Period::from_token(params.get("period").map(String::as_str));
    let page = PageRequest::from_params(
        params.get("page").map(String::as_str),
        params.get("limit").map(String::as_str),
    );
    let mut filter = EventFilter::since(period.window_start(Utc::now()));
    filter.event_type = event_type;

    let (records, total) = tokio::try_join!(
        state.events.find_events(&filter, page.offset(), page.limit),
        state.events.count_events(&filter),
    )
    .map_err(|e| ApiError::from_store(e, "Failed to retrieve detailed analytics"))?;

    metrics().report_latency_ms.observe_since(start);

    Ok(ApiResponse::ok(DetailedAnalytics {
        analytics: records.iter().map(EventRecord::view).collect(),
        pagination: page.pagination(total),
    }))
}
