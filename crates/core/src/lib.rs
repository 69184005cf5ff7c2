//! Core types, validation and the availability gate for the portfolio service.

pub mod contact;
pub mod error;
pub mod events;
pub mod fallback;
pub mod gate;
pub mod limits;
pub mod projects;
pub mod report;
pub mod session;

pub use contact::*;
pub use error::{Error, FieldError, Result};
pub use events::*;
pub use fallback::{fallback_projects, find_fallback, list_fallback, FALLBACK_MESSAGE};
pub use gate::{AvailabilityGate, GateController, GateStatus};
pub use projects::*;
pub use report::*;
pub use session::*;
