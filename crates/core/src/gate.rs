//! Store availability gate.
//!
//! The gate is the only process-wide mutable state in the service. It is
//! written by the connection manager through a [`GateController`] and read
//! by request handlers through cloned [`AvailabilityGate`] handles.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

#[derive(Debug)]
struct GateState {
    available: AtomicBool,
    transitions: AtomicU64,
    reason: RwLock<Option<String>>,
    changed_at: RwLock<DateTime<Utc>>,
}

/// Read-only view of the gate, injected into handlers.
#[derive(Debug, Clone)]
pub struct AvailabilityGate {
    state: Arc<GateState>,
}

impl AvailabilityGate {
    /// Whether the store was reachable at the most recent observation.
    pub fn is_available(&self) -> bool {
        self.state.available.load(Ordering::Acquire)
    }

    /// Why the gate is closed, if it is.
    pub fn reason(&self) -> Option<String> {
        self.state.reason.read().clone()
    }

    /// Number of open/closed transitions since startup.
    pub fn transitions(&self) -> u64 {
        self.state.transitions.load(Ordering::Relaxed)
    }

    pub fn status(&self) -> GateStatus {
        GateStatus {
            available: self.is_available(),
            reason: self.reason(),
            changed_at: *self.state.changed_at.read(),
            transitions: self.transitions(),
        }
    }
}

/// Write side of the gate, owned by the connection manager.
#[derive(Debug)]
pub struct GateController {
    gate: AvailabilityGate,
}

impl GateController {
    /// Creates a gate in the given initial state.
    pub fn new(available: bool) -> Self {
        let reason = (!available).then(|| "not yet connected".to_string());
        Self {
            gate: AvailabilityGate {
                state: Arc::new(GateState {
                    available: AtomicBool::new(available),
                    transitions: AtomicU64::new(0),
                    reason: RwLock::new(reason),
                    changed_at: RwLock::new(Utc::now()),
                }),
            },
        }
    }

    /// A read handle for handlers.
    pub fn gate(&self) -> AvailabilityGate {
        self.gate.clone()
    }

    /// Marks the store reachable. Returns true if this changed the state.
    pub fn mark_available(&self) -> bool {
        let state = &self.gate.state;
        *state.reason.write() = None;
        let was = state.available.swap(true, Ordering::AcqRel);
        if !was {
            self.record_transition();
        }
        !was
    }

    /// Marks the store unreachable. Returns true if this changed the state.
    pub fn mark_unavailable(&self, reason: impl Into<String>) -> bool {
        let state = &self.gate.state;
        *state.reason.write() = Some(reason.into());
        let was = state.available.swap(false, Ordering::AcqRel);
        if was {
            self.record_transition();
        }
        was
    }

    fn record_transition(&self) {
        let state = &self.gate.state;
        state.transitions.fetch_add(1, Ordering::Relaxed);
        *state.changed_at.write() = Utc::now();
    }
}

/// Serializable snapshot of the gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateStatus {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub changed_at: DateTime<Utc>,
    pub transitions: u64,
}
