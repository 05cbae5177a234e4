//! Test fixtures and click generators.

use chrono::{DateTime, Duration, Utc};
use heatmap_core::{ClickEvent, ClickProps};
use uuid::Uuid;

/// Bearer token accepted by the mock auth client.
pub fn test_token() -> String {
    "hm_test_ABC123xyz789DEF456ghi012".to_string()
}

/// `Authorization` header value for [`test_token`].
pub fn bearer() -> String {
    format!("Bearer {}", test_token())
}

/// A click with a fresh id, a minute ago.
pub fn click(page_path: &str, props: ClickProps) -> ClickEvent {
    click_at(page_path, Utc::now() - Duration::minutes(1), props)
}

pub fn click_at(page_path: &str, created_at: DateTime<Utc>, props: ClickProps) -> ClickEvent {
    ClickEvent::new(Uuid::new_v4().to_string(), page_path, created_at, props)
}

/// `n` viewport-relative clicks at the same point.
pub fn viewport_clicks(page_path: &str, n: usize, x: f64, y: f64) -> Vec<ClickEvent> {
    (0..n)
        .map(|_| click(page_path, ClickProps::viewport(x, y)))
        .collect()
}

/// `n` document-relative clicks spread along a diagonal.
pub fn page_clicks(page_path: &str, n: usize) -> Vec<ClickEvent> {
    (0..n)
        .map(|i| {
            let t = (i as f64 + 0.5) / n as f64;
            click(page_path, ClickProps::page(t, t))
        })
        .collect()
}

/// Clicks tagged with a device bucket.
pub fn device_clicks(page_path: &str, device: &str, n: usize) -> Vec<ClickEvent> {
    (0..n)
        .map(|i| {
            let x = 0.1 + (i % 8) as f64 * 0.1;
            click(page_path, ClickProps::viewport(x, 0.4).with_device(device))
        })
        .collect()
}

/// Raw props JSON as the collection pipeline stores it.
pub fn raw_props(json: serde_json::Value) -> ClickProps {
    serde_json::from_value(json).unwrap_or_default()
}
