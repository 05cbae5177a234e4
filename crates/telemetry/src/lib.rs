//! Internal telemetry for the heatmap engine.
//!
//! Counters and histograms live in-process and are periodically written to
//! the log as a structured snapshot; there is no external metrics backend.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
