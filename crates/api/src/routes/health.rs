//! Health check endpoints.

use axum::{extract::State, http::StatusCode, Json};
use portfolio_core::GateStatus;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    /// "connected" or "disconnected"
    pub database: String,
}

/// GET /api/health - Process up; reports store connectivity.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = if state.gate.is_available() {
        "connected"
    } else {
        "disconnected"
    };

    Json(HealthResponse {
        status: "OK".to_string(),
        message: "Server is running".to_string(),
        database: database.to_string(),
    })
}

/// GET /health/ready - Readiness probe (store reachable).
pub async fn ready_handler(State(state): State<AppState>) -> (StatusCode, Json<GateStatus>) {
    let status = state.gate.status();
    let code = if status.available {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

/// GET /health/live - Liveness probe (service is running).
pub async fn live_handler() -> StatusCode {
    StatusCode::OK
}
