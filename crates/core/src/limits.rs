//! Bounds and defaults for heatmap aggregation.
//!
//! The grid bounds and bin cap keep response payloads and overlay render
//! cost predictable regardless of how dense the underlying clicks are.
//!
//! At the maximum grid size of 400 a page has 160,000 possible cells. A
//! response carrying all of them would be several megabytes of JSON and
//! far more stamps than a single animation frame can paint, so the number
//! of distinct non-empty cells is capped at `MAX_BINS`.

// === Grid ===

/// Smallest effective grid resolution (cells per axis).
pub const MIN_GRID_SIZE: u32 = 50;

/// Largest effective grid resolution (cells per axis).
pub const MAX_GRID_SIZE: u32 = 400;

/// Grid resolution used when the request does not name one.
pub const DEFAULT_GRID_SIZE: u32 = 100;

/// Maximum number of distinct non-empty cells returned per aggregate.
pub const MAX_BINS: usize = 20_000;

// === Time window ===

/// Lookback window in days when the request does not name one.
pub const DEFAULT_DAYS: u32 = 30;

// === Store scan ===

/// Rows requested per page when scanning the click store.
///
/// A page shorter than this signals that the scan is exhausted.
pub const CLICK_PAGE_SIZE: u64 = 1000;

/// Event name under which clicks are recorded.
pub const CLICK_EVENT_NAME: &str = "click";

// === Auth ===

/// Bearer token pattern (opaque or JWT-shaped, URL-safe characters only).
pub const BEARER_TOKEN_PATTERN: &str = r"^[A-Za-z0-9_\-]{16,}(\.[A-Za-z0-9_\-]+){0,2}$";
