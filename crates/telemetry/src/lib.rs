//! Logging and in-process metrics for the portfolio service.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::*;
pub use tracing_setup::*;
