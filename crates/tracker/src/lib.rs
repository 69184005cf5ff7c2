//! Client-side tracking: session identity, event emitter and section
//! visibility triggering.

pub mod client;
pub mod error;
pub mod session;
pub mod visibility;

pub use client::{EventTransport, HttpTransport, TrackAck, Tracker, DEFAULT_BASE_URL};
pub use error::{Result, TrackerError};
pub use session::{FileSessionStorage, MemorySessionStorage, SessionIdProvider, SessionStorage};
pub use visibility::{intersection_ratio, Rect, SectionVisibility};
