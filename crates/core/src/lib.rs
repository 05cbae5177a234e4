//! Core types, validation, and click binning for the heatmap engine.

pub mod aggregate;
pub mod auth;
pub mod error;
pub mod events;
pub mod grid;
pub mod limits;
pub mod query;

pub use aggregate::*;
pub use auth::*;
pub use error::{Error, Result};
pub use events::*;
pub use grid::*;
pub use query::*;
