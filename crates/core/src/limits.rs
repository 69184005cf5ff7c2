//! Size limits and fixed constants for the portfolio service.
//!
//! The `#[validate]` derive macro requires literal values in attributes,
//! so field limits for admin/contact input are duplicated there. Keep both
//! in sync when modifying.

// === Request Limits ===

/// Maximum request body size in bytes (10MB).
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Maximum serialized event `data` size in bytes (16KB).
///
/// Payloads are tiny (`{page}`, `{section}`, ...); anything larger is abuse.
pub const MAX_EVENT_DATA_BYTES: usize = 16 * 1024;

// === String Field Limits (chars) ===

/// Session token max length.
pub const MAX_SESSION_ID_LEN: usize = 128;

/// User agent string max length.
/// Browser UAs: 100-300 typical, 500+ with extensions.
pub const MAX_USER_AGENT_LEN: usize = 512;

/// IP address max length (IPv6 = 45 chars).
pub const MAX_IP_LEN: usize = 45;

/// Referrer URL max length.
/// Matches HTTP Referer header limit.
pub const MAX_REFERRER_LEN: usize = 2048;

/// Page path / section / project id max length inside event data.
pub const MAX_DATA_FIELD_LEN: usize = 2000;

// === Reporting ===

/// Entries in the top-sections and top-projects breakdowns.
pub const TOP_N: usize = 5;

/// Default page size for the detailed analytics view.
pub const DEFAULT_PAGE_LIMIT: u64 = 50;

/// Maximum page size for the detailed analytics view.
pub const MAX_PAGE_LIMIT: u64 = 100;

/// Truncates a string to at most `max` characters, on a char boundary.
pub fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}
