//! Shared integration test support.

pub mod fixtures;
pub mod mocks;
pub mod setup;
