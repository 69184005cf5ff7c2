//! Standardized API responses.
//!
//! Every JSON endpoint answers with the same envelope:
//! `{success, data?, message?, errors?}`.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use portfolio_core::{Error, FieldError};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    /// Success without data.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            errors: None,
        }
    }

    /// Failure envelope.
    pub fn failure(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            errors: if errors.is_empty() { None } else { Some(errors) },
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Error response: status plus failure envelope.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ApiResponse<()>,
    pub retry_after: Option<u64>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiResponse::failure(message, Vec::new()),
            retry_after: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn validation(msg: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ApiResponse::failure(msg, errors),
            retry_after: None,
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, msg)
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        Self {
            retry_after: Some(retry_after),
            ..Self::new(
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests from this IP, please try again later.",
            )
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Maps a store-path error, replacing internal detail with `generic`.
    ///
    /// Client errors (validation, not found) keep their own message.
    pub fn from_store(err: Error, generic: &str) -> Self {
        match err.http_status() {
            400 | 404 | 503 => Self::from(err),
            _ => {
                error!(error = %err, "{}", generic);
                Self::internal(generic)
            }
        }
    }

    pub fn message(&self) -> &str {
        self.body.message.as_deref().unwrap_or_default()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();

        if let Some(retry_after) = self.retry_after {
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match &err {
            Error::Validation { message, errors } => Self::validation(message, errors.clone()),
            Error::InvalidEventType(_) => Self::validation("Invalid event type", err.field_errors()),
            Error::MissingField(_) => Self::validation("Missing required fields", err.field_errors()),
            Error::Serialization(_) => Self::bad_request("Invalid JSON body"),
            Error::NotFound(_) => Self::not_found(err.to_string()),
            Error::Unavailable(_) => Self::unavailable("Service temporarily unavailable"),
            Error::Store(_) | Error::Timeout(_) | Error::Internal(_) => {
                error!(error = %err, "Request failed");
                Self::internal("Internal server error")
            }
        }
    }
}
