//! Tracker errors.
//!
//! Never surfaced by the emitter's public tracking calls; they are logged
//! and absorbed there.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("session storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
