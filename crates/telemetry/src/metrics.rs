//! In-process service metrics.
//!
//! Lock-free counters, gauges and latency histograms held in a global
//! registry. A [`MetricsSnapshot`] is exposed on the admin dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Monotonic counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Point-in-time value.
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn set_flag(&self, on: bool) {
        self.set(u64::from(on));
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Latency histogram with fixed millisecond buckets.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 45s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 45000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len() - 1);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    /// Records the time elapsed since `start`.
    pub fn observe_since(&self, start: Instant) {
        self.observe(start.elapsed().as_millis() as u64);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Upper bucket bound containing the given quantile (0.0..=1.0).
    pub fn quantile_bound(&self, q: f64) -> u64 {
        let count = self.count();
        if count == 0 {
            return 0;
        }
        let target = ((count as f64) * q.clamp(0.0, 1.0)).ceil().max(1.0) as u64;
        let mut seen = 0;
        for (bound, bucket) in Self::BUCKET_BOUNDS.iter().zip(self.buckets.iter()) {
            seen += bucket.load(Ordering::Relaxed);
            if seen >= target {
                return *bound;
            }
        }
        Self::BUCKET_BOUNDS[Self::BUCKET_BOUNDS.len() - 1]
    }

    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Service metrics.
#[derive(Debug, Default)]
pub struct Metrics {
    // Ingestion
    pub events_received: Counter,
    pub events_tracked: Counter,
    pub events_rejected: Counter,
    pub ingest_errors: Counter,
    pub rate_limited_requests: Counter,

    // Degradation
    pub fallback_responses: Counter,
    pub store_errors: Counter,
    pub gate_closed_rejections: Counter,
    pub gate_transitions: Counter,

    // Content
    pub project_views: Counter,
    pub project_clicks: Counter,
    pub clicks_skipped: Counter,
    pub contacts_received: Counter,

    // Latency
    pub ingest_latency_ms: Histogram,
    pub query_latency_ms: Histogram,
    pub report_latency_ms: Histogram,

    // Gauges
    pub store_available: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            events_received: self.events_received.get(),
            events_tracked: self.events_tracked.get(),
            events_rejected: self.events_rejected.get(),
            ingest_errors: self.ingest_errors.get(),
            rate_limited_requests: self.rate_limited_requests.get(),
            fallback_responses: self.fallback_responses.get(),
            store_errors: self.store_errors.get(),
            gate_closed_rejections: self.gate_closed_rejections.get(),
            gate_transitions: self.gate_transitions.get(),
            project_views: self.project_views.get(),
            project_clicks: self.project_clicks.get(),
            clicks_skipped: self.clicks_skipped.get(),
            contacts_received: self.contacts_received.get(),
            ingest_latency_mean_ms: self.ingest_latency_ms.mean(),
            ingest_latency_p99_ms: self.ingest_latency_ms.quantile_bound(0.99),
            query_latency_mean_ms: self.query_latency_ms.mean(),
            report_latency_mean_ms: self.report_latency_ms.mean(),
            store_available: self.store_available.get() > 0,
        }
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub events_received: u64,
    pub events_tracked: u64,
    pub events_rejected: u64,
    pub ingest_errors: u64,
    pub rate_limited_requests: u64,
    pub fallback_responses: u64,
    pub store_errors: u64,
    pub gate_closed_rejections: u64,
    pub gate_transitions: u64,
    pub project_views: u64,
    pub project_clicks: u64,
    pub clicks_skipped: u64,
    pub contacts_received: u64,
    pub ingest_latency_mean_ms: f64,
    pub ingest_latency_p99_ms: u64,
    pub query_latency_mean_ms: f64,
    pub report_latency_mean_ms: f64,
    pub store_available: bool,
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
