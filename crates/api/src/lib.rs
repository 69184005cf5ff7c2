//! HTTP API layer for the portfolio service.

pub mod degrade;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;

pub use response::{ApiError, ApiResponse};
pub use routes::router;
pub use state::AppState;
