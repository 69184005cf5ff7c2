//! Unified error types for the portfolio service.
//!
//! Error taxonomy:
//! - Validation: malformed or missing input, carries field-level detail
//! - NotFound: entity absent or not publicly visible
//! - Unavailable: the availability gate is closed
//! - Store / Timeout: the store is reachable but an operation failed

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidationErrors;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Flattens `validator` output into a stable, field-sorted list.
    pub fn from_validation(errors: &ValidationErrors) -> Vec<FieldError> {
        let mut out: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = field.to_string();
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid ({})", field, e.code));
                    FieldError::new(field.clone(), message)
                })
            })
            .collect();
        out.sort_by(|a, b| a.field.cmp(&b.field));
        out
    }
}

/// Unified error type for the portfolio service.
#[derive(Debug, Error)]
pub enum Error {
    /// Input failed validation; `errors` carries per-field detail.
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },

    #[error("invalid event type: {0}")]
    InvalidEventType(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("{0} not found")]
    NotFound(String),

    /// The persistence layer is not reachable (gate closed).
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The persistence layer is reachable but the operation failed.
    #[error("store error: {0}")]
    Store(String),

    #[error("store operation timed out after {0}s")]
    Timeout(u64),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn validation(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self::Validation {
            message: message.into(),
            errors,
        }
    }

    /// Validation error for a single field.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Validation {
            errors: vec![FieldError::new(field, message.clone())],
            message,
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::InvalidEventType(_) => 400,
            Self::MissingField(_) => 400,
            Self::Serialization(_) => 400,
            Self::NotFound(_) => 404,
            Self::Unavailable(_) => 503,
            Self::Store(_) => 500,
            Self::Timeout(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// Whether this error came from the persistence layer itself.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Timeout(_))
    }

    /// Field-level detail, if any.
    pub fn field_errors(&self) -> Vec<FieldError> {
        match self {
            Self::Validation { errors, .. } => errors.clone(),
            Self::InvalidEventType(value) => vec![FieldError::new(
                "type",
                format!("'{}' is not a recognized event type", value),
            )],
            Self::MissingField(field) => {
                vec![FieldError::new(field.clone(), format!("{} is required", field))]
            }
            _ => Vec::new(),
        }
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Self::validation("Validation failed", FieldError::from_validation(&errors))
    }
}
