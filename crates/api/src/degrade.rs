//! Gate-aware execution of store operations.
//!
//! Handlers that have a safe answer without the store (static project data,
//! a skipped counter) run through [`Degradable`]. Handlers without one call
//! [`require_live`] and answer 503 while the gate is closed.

use std::future::Future;

use portfolio_core::{AvailabilityGate, Result};
use telemetry::metrics;
use tracing::{debug, warn};

use crate::response::ApiError;

/// What to do when the live path fails with a store error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnStoreError {
    /// Serve the fallback value.
    Fallback,
    /// Return the error to the handler.
    Propagate,
}

/// Result plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Served<T> {
    Live(T),
    Fallback(T),
}

impl<T> Served<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Served::Fallback(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Served::Live(v) | Served::Fallback(v) => v,
        }
    }
}

pub struct Degradable<'a> {
    gate: &'a AvailabilityGate,
    operation: &'static str,
    on_error: OnStoreError,
}

impl<'a> Degradable<'a> {
    pub fn new(gate: &'a AvailabilityGate, operation: &'static str) -> Self {
        Self {
            gate,
            operation,
            on_error: OnStoreError::Propagate,
        }
    }

    pub fn on_store_error(mut self, policy: OnStoreError) -> Self {
        self.on_error = policy;
        self
    }

    /// Runs `live` if the gate is open, otherwise serves `fallback`.
    ///
    /// `live` is not polled while the gate is closed.
    pub async fn run<T, L, F>(self, live: L, fallback: F) -> Result<Served<T>>
    where
        L: Future<Output = Result<T>>,
        F: FnOnce() -> T,
    {
        if !self.gate.is_available() {
            debug!(operation = self.operation, "Store unavailable, serving fallback");
            metrics().fallback_responses.inc();
            return Ok(Served::Fallback(fallback()));
        }

        match live.await {
            Ok(value) => Ok(Served::Live(value)),
            Err(e) if e.is_store_failure() && self.on_error == OnStoreError::Fallback => {
                warn!(operation = self.operation, error = %e, "Store operation failed, serving fallback");
                metrics().fallback_responses.inc();
                Ok(Served::Fallback(fallback()))
            }
            Err(e) => Err(e),
        }
    }
}

/// 503 while the gate is closed.
pub fn require_live(gate: &AvailabilityGate, message: &str) -> std::result::Result<(), ApiError> {
    if gate.is_available() {
        return Ok(());
    }
    metrics().gate_closed_rejections.inc();
    debug!(reason = ?gate.reason(), "Rejected request while store unavailable");
    Err(ApiError::unavailable(message))
}
