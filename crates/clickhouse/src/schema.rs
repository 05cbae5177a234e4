//! ClickHouse table schema for click events.
//!
//! - LowCardinality for the event name
//! - DateTime64(3) for millisecond precision
//! - JSON props blob, parsed leniently on read

/// Table holding raw click events.
pub const CLICK_EVENTS_TABLE: &str = "click_events";

/// SQL for creating the click events table.
///
/// Ordered by `(page_path, created_at, event_id)` so a heatmap scan for one
/// page reads a contiguous range and pagination order is stable.
pub const CREATE_CLICK_EVENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS click_events (
    event_id String,
    page_path String,
    event_name LowCardinality(String),
    created_at DateTime64(3),

    -- {x?, y?, page_x?, page_y?, device_bucket?, element_id?}
    props String,

    inserted_at DateTime DEFAULT now()
)
ENGINE = MergeTree()
PARTITION BY toYYYYMM(created_at)
ORDER BY (page_path, created_at, event_id)
TTL toDateTime(created_at) + INTERVAL 180 DAY
SETTINGS index_granularity = 8192
"#;

/// All DDL statements, in creation order.
pub fn all_tables() -> Vec<&'static str> {
    vec![CREATE_CLICK_EVENTS_TABLE]
}
