//! Store connection lifecycle.
//!
//! The manager owns the [`GateController`]. It opens or closes the gate
//! at startup and then keeps it in step with a periodic health ping.
//!
//! Only the ping moves the gate. Store errors seen by request handlers
//! (`Error::Store`, `Error::Timeout`) are answered per request and leave
//! the gate open, so an outage is noticed within one `health_interval`.

use std::sync::Arc;
use std::time::Duration;

use portfolio_core::{AvailabilityGate, GateController, Result};
use telemetry::metrics;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::store::StoreProbe;

/// Outcome of one health observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// State unchanged.
    Steady,
    Reconnected,
    Disconnected,
}

pub struct ConnectionManager {
    probe: Arc<dyn StoreProbe>,
    controller: GateController,
    health_interval: Duration,
}

impl ConnectionManager {
    /// Creates a manager with the gate closed.
    pub fn new(probe: Arc<dyn StoreProbe>, health_interval: Duration) -> Self {
        metrics().store_available.set_flag(false);
        Self {
            probe,
            controller: GateController::new(false),
            health_interval,
        }
    }

    /// Read handle for request handlers.
    pub fn gate(&self) -> AvailabilityGate {
        self.controller.gate()
    }

    /// Startup connection attempt: ping, then ensure the schema.
    ///
    /// Opens the gate on success and leaves it closed on failure. Whether a
    /// failure is fatal is the caller's decision.
    pub async fn connect(&self) -> Result<()> {
        let attempt = async {
            self.probe.ping().await?;
            self.probe.ensure_schema().await
        };

        match attempt.await {
            Ok(()) => {
                self.open();
                info!("Store connected");
                Ok(())
            }
            Err(e) => {
                self.close(e.to_string());
                error!(error = %e, "Store connection failed");
                Err(e)
            }
        }
    }

    /// One health observation. Updates the gate and logs transitions.
    ///
    /// A reconnect only opens the gate once the schema is ensured again.
    pub async fn check(&self) -> Transition {
        let was_available = self.controller.gate().is_available();

        match self.probe.ping().await {
            Ok(()) if was_available => Transition::Steady,
            Ok(()) => match self.probe.ensure_schema().await {
                Ok(()) => {
                    self.open();
                    info!("Store reconnected");
                    Transition::Reconnected
                }
                Err(e) => {
                    warn!(error = %e, "Store reachable but schema init failed");
                    self.close(e.to_string());
                    Transition::Steady
                }
            },
            Err(e) => {
                self.close(e.to_string());
                if was_available {
                    warn!(error = %e, "Store disconnected");
                    Transition::Disconnected
                } else {
                    Transition::Steady
                }
            }
        }
    }

    /// Spawns the background health monitor.
    pub fn spawn_monitor(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        info!(
            interval_secs = self.health_interval.as_secs(),
            "Starting store health monitor"
        );
        tokio::spawn(async move {
            let mut ticker = interval(self.health_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; startup already probed.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                self.check().await;
            }
        })
    }

    fn open(&self) {
        if self.controller.mark_available() {
            metrics().gate_transitions.inc();
        }
        metrics().store_available.set_flag(true);
    }

    fn close(&self, reason: String) {
        if self.controller.mark_unavailable(reason) {
            metrics().gate_transitions.inc();
        }
        metrics().store_available.set_flag(false);
    }
}
