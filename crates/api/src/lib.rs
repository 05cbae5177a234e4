//! HTTP API layer for the heatmap aggregator.

pub mod extractors;
pub mod response;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::{AppState, AuthClient, HeatmapSettings};
