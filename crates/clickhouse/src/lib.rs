//! ClickHouse persistence for the portfolio service.

pub mod client;
pub mod config;
pub mod connection;
pub mod health;
pub mod insert;
pub mod query;
pub mod schema;
pub mod store;

pub use client::*;
pub use config::*;
pub use connection::{ConnectionManager, Transition};
pub use store::{ContactStore, EventStore, ProjectStore, StoreProbe};
