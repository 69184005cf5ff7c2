//! Best-effort event emitter.
//!
//! Every tracking call returns [`TrackAck`] with `success: true` without
//! waiting for the server. Transport errors, non-2xx responses and invalid
//! payloads are logged at `warn` and dropped.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use portfolio_core::{
    ClickKind, EventPayload, EventType, PageViewData, ProjectClickData, SectionViewData,
    TimestampData, TrackRequest, SESSION_HEADER,
};
use parking_lot::Mutex;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{Result, TrackerError};
use crate::session::SessionIdProvider;

/// Development API base.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a tracking call. Always successful by contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackAck {
    pub success: bool,
}

impl TrackAck {
    fn done() -> Self {
        Self { success: true }
    }
}

/// Delivers JSON bodies to the API.
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// POSTs `body` to `path` (relative to the API base). Non-2xx is an error.
    async fn post_json(&self, path: &str, session_id: &str, body: &Value) -> Result<()>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(TrackerError::Config("base URL must not be empty".into()));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl EventTransport for HttpTransport {
    async fn post_json(&self, path: &str, session_id: &str, body: &Value) -> Result<()> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .header(SESSION_HEADER, session_id)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrackerError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// Characters escaped inside a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn click_path(project_id: &str) -> String {
    format!(
        "/projects/{}/click",
        utf8_percent_encode(project_id, PATH_SEGMENT)
    )
}

/// Client-side emitter bound to one session.
///
/// Tracking calls return as soon as delivery is handed to the runtime;
/// the caller never waits on the network. [`Tracker::flush`] waits for
/// deliveries still in flight.
pub struct Tracker {
    transport: Arc<dyn EventTransport>,
    sessions: SessionIdProvider,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl Tracker {
    pub fn new(transport: Arc<dyn EventTransport>, sessions: SessionIdProvider) -> Self {
        Self {
            transport,
            sessions,
            in_flight: Mutex::new(Vec::new()),
        }
    }

    /// HTTP emitter against `base_url` with in-memory session storage.
    pub fn http(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self::new(
            Arc::new(HttpTransport::new(base_url)?),
            SessionIdProvider::in_memory(),
        ))
    }

    pub fn session_id(&self) -> String {
        self.sessions.get_or_create()
    }

    /// Sends one analytics event.
    pub fn track(&self, event_type: EventType, data: Value) -> TrackAck {
        match EventPayload::from_parts(event_type, data) {
            Ok(payload) => self.send(payload),
            Err(e) => {
                warn!(event_type = %event_type, error = %e, "Dropping invalid analytics event");
                TrackAck::done()
            }
        }
    }

    pub fn track_page_view(&self, page: impl Into<String>) -> TrackAck {
        self.send(EventPayload::PageView(PageViewData { page: page.into() }))
    }

    pub fn track_section_view(&self, section: impl Into<String>) -> TrackAck {
        self.send(EventPayload::SectionView(SectionViewData {
            section: section.into(),
        }))
    }

    pub fn track_project_click(&self, project_id: impl Into<String>, kind: ClickKind) -> TrackAck {
        self.send(EventPayload::ProjectClick(ProjectClickData {
            project_id: project_id.into(),
            kind,
        }))
    }

    pub fn track_contact_form(&self) -> TrackAck {
        self.send(EventPayload::ContactForm(TimestampData { timestamp: Utc::now() }))
    }

    pub fn track_resume_download(&self) -> TrackAck {
        self.send(EventPayload::DownloadResume(TimestampData { timestamp: Utc::now() }))
    }

    /// Bumps the project's own click counter (`/projects/{id}/click`).
    pub fn record_project_click(&self, project_id: &str, kind: ClickKind) -> TrackAck {
        let body = json!({ "type": kind.as_str() });
        self.dispatch(click_path(project_id), body, "project click")
    }

    /// Waits for every delivery started so far.
    pub async fn flush(&self) {
        let pending = std::mem::take(&mut *self.in_flight.lock());
        for handle in pending {
            if let Err(e) = handle.await {
                warn!(error = %e, "Tracking task aborted");
            }
        }
    }

    fn send(&self, payload: EventPayload) -> TrackAck {
        let event_type = payload.event_type();
        let request = TrackRequest {
            event_type: Some(event_type.as_str().to_string()),
            data: Some(payload.data()),
            session_id: Some(self.session_id()),
        };

        match serde_json::to_value(&request) {
            Ok(body) => {
                self.dispatch("/analytics/track".to_string(), body, event_type.as_str())
            }
            Err(e) => {
                warn!(event_type = %event_type, error = %e, "Failed to encode analytics event");
                TrackAck::done()
            }
        }
    }

    fn dispatch(&self, path: String, body: Value, what: &'static str) -> TrackAck {
        let Ok(runtime) = Handle::try_current() else {
            warn!(what, "No async runtime, dropping tracking call");
            return TrackAck::done();
        };

        let transport = self.transport.clone();
        let session_id = self.session_id();
        let handle = runtime.spawn(async move {
            match transport.post_json(&path, &session_id, &body).await {
                Ok(()) => debug!(what, "Tracking call delivered"),
                Err(e) => warn!(what, error = %e, "Tracking call failed"),
            }
        });

        let mut in_flight = self.in_flight.lock();
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
        TrackAck::done()
    }
}
