//! Session token handling.
//!
//! A session token is an opaque client-generated string used only to
//! correlate events. The server keeps no session record and does not
//! enforce uniqueness.

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::limits::MAX_SESSION_ID_LEN;

/// Header carrying the session token on every front-end request.
pub const SESSION_HEADER: &str = "x-session-id";

/// Session recorded when neither the body nor the header carries one.
pub const ANONYMOUS_SESSION: &str = "anonymous";

/// Generates a new random session token (32 hex chars).
///
/// Uniqueness is best-effort; collisions are tolerated downstream.
pub fn generate_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Picks the session for an event: body value, then header, then anonymous.
pub fn resolve_session_id(body: Option<&str>, header: Option<&str>) -> Result<String> {
    fn pick(v: Option<&str>) -> Option<&str> {
        v.map(str::trim).filter(|v| !v.is_empty())
    }
    let session = pick(body).or_else(|| pick(header)).unwrap_or(ANONYMOUS_SESSION);

    if session.chars().count() > MAX_SESSION_ID_LEN {
        return Err(Error::invalid_field(
            "sessionId",
            format!("sessionId exceeds {} characters", MAX_SESSION_ID_LEN),
        ));
    }
    Ok(session.to_string())
}
