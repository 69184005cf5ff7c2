//! Tracing setup for structured logging.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Default filter when neither `RUST_LOG` nor a config value is usable.
pub const DEFAULT_FILTER: &str = "info,tower_http=info";

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Log level filter (e.g., "info", "api=debug,clickhouse_client=warn")
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Include span open/close events
    pub span_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            json: false,
            span_events: false,
        }
    }
}

impl TracingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn with_span_events(mut self, span_events: bool) -> Self {
        self.span_events = span_events;
        self
    }

    /// Reads `RUST_LOG`, `LOG_JSON` and `LOG_SPANS`.
    pub fn from_env() -> Self {
        let flag = |name: &str| {
            std::env::var(name)
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false)
        };
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string());

        Self::new()
            .with_filter(filter)
            .with_json(flag("LOG_JSON"))
            .with_span_events(flag("LOG_SPANS"))
    }
}

/// Installs the global subscriber.
///
/// Returns false when a subscriber was already installed (e.g. by a test
/// harness); the existing one is kept.
pub fn init_tracing(config: TracingConfig) -> bool {
    let env_filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let installed = if config.json {
        let fmt_layer = fmt::layer()
            .json()
            .with_span_events(span_events)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .is_ok()
    } else {
        let fmt_layer = fmt::layer()
            .with_span_events(span_events)
            .with_target(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .is_ok()
    };

    if installed {
        tracing::info!(filter = %config.filter, json = config.json, "Tracing initialized");
    }
    installed
}

/// Initialize tracing from environment variables.
pub fn init_tracing_from_env() -> bool {
    init_tracing(TracingConfig::from_env())
}
