//! Admin authentication middleware.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::response::ApiError;
use crate::state::AppState;

/// Requires `Authorization: Bearer <admin token>`.
///
/// Rejects every request when no admin token is configured.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.admin_token.as_deref() else {
        warn!(path = %request.uri().path(), "Admin request rejected: no admin token configured");
        return Err(ApiError::unauthorized("Access denied"));
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    match provided {
        Some(token) if constant_time_eq(token.as_bytes(), expected.as_bytes()) => {
            Ok(next.run(request).await)
        }
        Some(_) => {
            warn!(path = %request.uri().path(), "Admin request with invalid token");
            Err(ApiError::unauthorized("Invalid token"))
        }
        None => Err(ApiError::unauthorized("Access denied. No token provided.")),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
