//! Contact form submission.

use axum::{body::Bytes, extract::State};
use portfolio_core::ContactSubmission;
use telemetry::metrics;
use tracing::{debug, error, info};

use crate::degrade::require_live;
use crate::extractors::RequestMeta;
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;

/// POST /api/contact/submit
pub async fn submit_handler(
    State(state): State<AppState>,
    RequestMeta(context): RequestMeta,
    body: Bytes,
) -> Result<ApiResponse<()>, ApiError> {
    let submission: ContactSubmission = serde_json::from_slice(&body).map_err(|e| {
        debug!(error = %e, "Invalid contact body");
        ApiError::bad_request("Invalid JSON body")
    })?;
    let message = submission.into_message(&context.ip_address)?;

    require_live(&state.gate, "Message service temporarily unavailable")?;

    state.contacts.insert_contact(&message).await.map_err(|e| {
        error!(error = %e, "Failed to store contact message");
        ApiError::internal("Failed to send message")
    })?;

    metrics().contacts_received.inc();
    info!(contact_id = %message.id, "Contact message received");
    Ok(ApiResponse::message("Message received successfully"))
}
