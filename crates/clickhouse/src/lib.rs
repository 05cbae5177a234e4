//! Click event store backed by ClickHouse.

pub mod client;
pub mod config;
pub mod health;
pub mod insert;
pub mod memory;
pub mod query;
pub mod scan;
pub mod schema;
pub mod store;

pub use client::*;
pub use config::*;
pub use memory::MemoryClickStore;
pub use query::*;
pub use scan::*;
pub use store::*;
