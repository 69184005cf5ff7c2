//! Event type definitions for analytics tracking.
//!
//! The ingestion body is loose JSON (`{type, data, sessionId}`); it is turned
//! into a typed [`EventRecord`] here so every stored event carries a payload
//! of the shape its type promises.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, FieldError, Result};
use crate::limits::{
    truncate_chars, MAX_DATA_FIELD_LEN, MAX_EVENT_DATA_BYTES, MAX_IP_LEN, MAX_REFERRER_LEN,
    MAX_USER_AGENT_LEN,
};
use crate::projects::ClickKind;
use crate::session::resolve_session_id;

/// User agent recorded when the request carries none.
pub const UNKNOWN_USER_AGENT: &str = "Unknown";

/// Client address recorded when none can be determined.
pub const UNKNOWN_IP: &str = "unknown";

/// All supported event types. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PageView,
    SectionView,
    ProjectClick,
    ContactForm,
    DownloadResume,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        Self::PageView,
        Self::SectionView,
        Self::ProjectClick,
        Self::ContactForm,
        Self::DownloadResume,
    ];

    /// Returns the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PageView => "page_view",
            Self::SectionView => "section_view",
            Self::ProjectClick => "project_click",
            Self::ContactForm => "contact_form",
            Self::DownloadResume => "download_resume",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::InvalidEventType(s.to_string()))
    }
}

/// `page_view` data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageViewData {
    pub page: String,
}

/// `section_view` data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionViewData {
    pub section: String,
}

/// `project_click` data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectClickData {
    pub project_id: String,
    #[serde(rename = "type")]
    pub kind: ClickKind,
}

/// `contact_form` / `download_resume` data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampData {
    pub timestamp: DateTime<Utc>,
}

/// Event payload, one shape per event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventPayload {
    PageView(PageViewData),
    SectionView(SectionViewData),
    ProjectClick(ProjectClickData),
    ContactForm(TimestampData),
    DownloadResume(TimestampData),
}

impl EventPayload {
    /// Builds a typed payload from an event type and its raw `data` value.
    pub fn from_parts(event_type: EventType, data: Value) -> Result<Self> {
        if !data.is_object() {
            return Err(Error::invalid_field("data", "data must be an object"));
        }

        let size = serde_json::to_vec(&data).map(|v| v.len()).unwrap_or(0);
        if size > MAX_EVENT_DATA_BYTES {
            return Err(Error::invalid_field(
                "data",
                format!(
                    "data {}KB exceeds {}KB limit",
                    size / 1024,
                    MAX_EVENT_DATA_BYTES / 1024
                ),
            ));
        }

        let payload = match event_type {
            EventType::PageView => Self::PageView(parse_data(event_type, data)?),
            EventType::SectionView => Self::SectionView(parse_data(event_type, data)?),
            EventType::ProjectClick => Self::ProjectClick(parse_data(event_type, data)?),
            EventType::ContactForm => Self::ContactForm(parse_data(event_type, data)?),
            EventType::DownloadResume => Self::DownloadResume(parse_data(event_type, data)?),
        };
        payload.check_fields()?;
        Ok(payload)
    }

    pub fn event_type(&self) -> EventType {
        match self {
            Self::PageView(_) => EventType::PageView,
            Self::SectionView(_) => EventType::SectionView,
            Self::ProjectClick(_) => EventType::ProjectClick,
            Self::ContactForm(_) => EventType::ContactForm,
            Self::DownloadResume(_) => EventType::DownloadResume,
        }
    }

    /// The `data` object as it appears on the wire.
    pub fn data(&self) -> Value {
        let result = match self {
            Self::PageView(d) => serde_json::to_value(d),
            Self::SectionView(d) => serde_json::to_value(d),
            Self::ProjectClick(d) => serde_json::to_value(d),
            Self::ContactForm(d) | Self::DownloadResume(d) => serde_json::to_value(d),
        };
        result.unwrap_or(Value::Null)
    }

    /// Value of the grouping key for breakdown queries, if this payload has it.
    pub fn group_value(&self, key: DataKey) -> Option<&str> {
        match (self, key) {
            (Self::SectionView(d), DataKey::Section) => Some(d.section.as_str()),
            (Self::ProjectClick(d), DataKey::ProjectId) => Some(d.project_id.as_str()),
            _ => None,
        }
    }

    fn check_fields(&self) -> Result<()> {
        let (field, value) = match self {
            Self::PageView(d) => ("data.page", d.page.as_str()),
            Self::SectionView(d) => ("data.section", d.section.as_str()),
            Self::ProjectClick(d) => ("data.projectId", d.project_id.as_str()),
            Self::ContactForm(_) | Self::DownloadResume(_) => return Ok(()),
        };
        if value.trim().is_empty() {
            return Err(Error::invalid_field(field, format!("{} must not be empty", field)));
        }
        if value.chars().count() > MAX_DATA_FIELD_LEN {
            return Err(Error::invalid_field(
                field,
                format!("{} exceeds {} characters", field, MAX_DATA_FIELD_LEN),
            ));
        }
        Ok(())
    }
}

fn parse_data<T: serde::de::DeserializeOwned>(event_type: EventType, data: Value) -> Result<T> {
    serde_json::from_value(data).map_err(|e| {
        Error::invalid_field("data", format!("invalid {} data: {}", event_type, e))
    })
}

/// Event data fields that breakdown queries group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKey {
    /// `data.section` of `section_view` events.
    Section,
    /// `data.projectId` of `project_click` events.
    ProjectId,
}

impl DataKey {
    /// The JSON key inside `data`.
    pub fn json_field(&self) -> &'static str {
        match self {
            Self::Section => "section",
            Self::ProjectId => "projectId",
        }
    }

    /// The only event type that carries this key.
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Section => EventType::SectionView,
            Self::ProjectId => EventType::ProjectClick,
        }
    }
}

/// Request-derived metadata attached to every event.
///
/// Always read from the HTTP request, never from the client body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub ip_address: String,
    pub user_agent: String,
    pub referrer: String,
}

impl RequestContext {
    pub fn new(ip: Option<&str>, user_agent: Option<&str>, referrer: Option<&str>) -> Self {
        fn non_empty(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|v| !v.is_empty())
        }
        Self {
            ip_address: truncate_chars(non_empty(ip).unwrap_or(UNKNOWN_IP), MAX_IP_LEN),
            user_agent: truncate_chars(
                non_empty(user_agent).unwrap_or(UNKNOWN_USER_AGENT),
                MAX_USER_AGENT_LEN,
            ),
            referrer: truncate_chars(non_empty(referrer).unwrap_or(""), MAX_REFERRER_LEN),
        }
    }
}

/// Raw ingestion body. Fields beyond these three are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl TrackRequest {
    /// Validates the body and builds the record to persist.
    ///
    /// Nothing is produced unless every check passes.
    pub fn into_record(
        self,
        header_session: Option<&str>,
        context: RequestContext,
    ) -> Result<EventRecord> {
        let mut missing = Vec::new();
        let event_type = self
            .event_type
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if event_type.is_none() {
            missing.push(FieldError::new("type", "type is required"));
        }
        let data = self.data.filter(|d| !d.is_null());
        if data.is_none() {
            missing.push(FieldError::new("data", "data is required"));
        }

        let (Some(event_type), Some(data)) = (event_type, data) else {
            return Err(Error::validation("Missing required fields", missing));
        };

        let event_type: EventType = event_type.parse()?;
        let payload = EventPayload::from_parts(event_type, data)?;
        let session_id = resolve_session_id(self.session_id.as_deref(), header_session)?;

        Ok(EventRecord::new(payload, session_id, context))
    }
}

/// One immutable logged occurrence of a tracked user action.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub id: Uuid,
    pub payload: EventPayload,
    pub session_id: String,
    pub ip_address: String,
    pub user_agent: String,
    pub referrer: String,
    pub created_at: DateTime<Utc>,
}

impl EventRecord {
    /// Creates a record stamped with the current server time.
    pub fn new(payload: EventPayload, session_id: impl Into<String>, context: RequestContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload,
            session_id: session_id.into(),
            ip_address: context.ip_address,
            user_agent: context.user_agent,
            referrer: context.referrer,
            created_at: Utc::now(),
        }
    }

    pub fn event_type(&self) -> EventType {
        self.payload.event_type()
    }

    /// Public projection without client address and user agent.
    pub fn view(&self) -> EventView {
        EventView {
            id: self.id.to_string(),
            event_type: self.event_type(),
            data: self.payload.data(),
            session_id: self.session_id.clone(),
            referrer: self.referrer.clone(),
            created_at: self.created_at,
        }
    }
}

/// Event as returned by the detailed analytics view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub data: Value,
    pub session_id: String,
    pub referrer: String,
    pub created_at: DateTime<Utc>,
}

/// Selection of events for counts, breakdowns and listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub event_type: Option<EventType>,
    /// Inclusive lower bound on `created_at`.
    pub since: Option<DateTime<Utc>>,
}

impl EventFilter {
    /// All events ever recorded.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn since(since: DateTime<Utc>) -> Self {
        Self {
            event_type: None,
            since: Some(since),
        }
    }

    pub fn with_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    pub fn matches(&self, record: &EventRecord) -> bool {
        self.event_type.map_or(true, |t| record.event_type() == t)
            && self.since.map_or(true, |s| record.created_at >= s)
    }
}
