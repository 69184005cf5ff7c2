pub mod auth;
pub mod rate_limit;

pub use auth::require_admin;
pub use rate_limit::{rate_limit, RateLimitConfig, RateLimiter, SharedRateLimiter};
