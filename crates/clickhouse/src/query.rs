//! Click event reads against ClickHouse.

use async_trait::async_trait;
use chrono::DateTime;
use clickhouse::Row;
use heatmap_core::{ClickEvent, ClickProps};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::ClickHouseClient;
use crate::store::{ClickEventStore, ClickQuery, StoreError};

/// Click event row as stored in `click_events`.
#[derive(Debug, Clone, Row, Serialize, Deserialize)]
pub struct ClickEventRow {
    pub event_id: String,
    pub page_path: String,
    pub event_name: String,
    pub created_at: i64, // DateTime64(3) as milliseconds since epoch
    pub props: String,   // JSON props bag
}

impl From<ClickEventRow> for ClickEvent {
    fn from(row: ClickEventRow) -> Self {
        let props = serde_json::from_str::<ClickProps>(&row.props).unwrap_or_else(|e| {
            debug!(event_id = %row.event_id, error = %e, "Unparseable click props");
            ClickProps::default()
        });
        let created_at = DateTime::from_timestamp_millis(row.created_at).unwrap_or_default();

        ClickEvent {
            event_id: row.event_id,
            page_path: row.page_path,
            created_at,
            props,
        }
    }
}

impl ClickEventRow {
    /// Build a storable row from a click event.
    pub fn from_event(event: &ClickEvent, event_name: &str) -> Self {
        Self {
            event_id: event.event_id.clone(),
            page_path: event.page_path.clone(),
            event_name: event_name.to_string(),
            created_at: event.created_at.timestamp_millis(),
            props: serde_json::to_string(&event.props).unwrap_or_else(|_| "{}".to_string()),
        }
    }
}

const SELECT_CLICK_PAGE: &str = "SELECT event_id, page_path, event_name, created_at, props \
     FROM click_events \
     WHERE event_name = ? AND page_path = ? \
       AND created_at >= fromUnixTimestamp64Milli(?) AND created_at <= fromUnixTimestamp64Milli(?) \
     ORDER BY created_at, event_id \
     LIMIT ? OFFSET ?";

/// Earliest `DateTime64` value ClickHouse represents (1900-01-01).
const MIN_DATETIME64_MILLIS: i64 = -2_208_988_800_000;

/// Window bounds in milliseconds, with very long lookbacks pinned to the
/// earliest instant the column can hold.
fn window_millis(query: &ClickQuery) -> (i64, i64) {
    (
        query.from.timestamp_millis().max(MIN_DATETIME64_MILLIS),
        query.to.timestamp_millis(),
    )
}

/// ClickHouse error codes for a missing table or database.
const UNPROVISIONED_MARKERS: [&str; 4] = ["UNKNOWN_TABLE", "UNKNOWN_DATABASE", "Code: 60.", "Code: 81."];

/// Whether a ClickHouse error message means the schema does not exist yet.
pub fn is_unprovisioned_message(message: &str) -> bool {
    UNPROVISIONED_MARKERS.iter().any(|m| message.contains(m))
}

fn classify(err: clickhouse::error::Error) -> StoreError {
    let message = err.to_string();
    if is_unprovisioned_message(&message) {
        StoreError::NotProvisioned(message)
    } else {
        StoreError::Query(message)
    }
}

#[async_trait]
impl ClickEventStore for ClickHouseClient {
    async fn fetch_page(
        &self,
        query: &ClickQuery,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<ClickEvent>, StoreError> {
        let (from, to) = window_millis(query);
        let rows: Vec<ClickEventRow> = self
            .inner()
            .query(SELECT_CLICK_PAGE)
            .bind(query.event_name.as_str())
            .bind(query.page_path.as_str())
            .bind(from)
            .bind(to)
            .bind(limit)
            .bind(offset)
            .fetch_all()
            .await
            .map_err(classify)?;

        Ok(rows.into_iter().map(ClickEvent::from).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner()
            .query("SELECT 1")
            .fetch_one::<u8>()
            .await
            .map(|_| ())
            .map_err(classify)
    }
}

/// Count click events stored for a page (admin and tests).
pub async fn count_page_clicks(client: &ClickHouseClient, page_path: &str) -> Result<u64, StoreError> {
    client
        .inner()
        .query("SELECT count() FROM click_events WHERE page_path = ?")
        .bind(page_path)
        .fetch_one()
        .await
        .map_err(classify)
}

/// Truncate the click table (test cleanup).
pub async fn truncate_clicks(client: &ClickHouseClient) -> Result<(), StoreError> {
    client
        .inner()
        .query("TRUNCATE TABLE IF EXISTS click_events")
        .execute()
        .await
        .map_err(classify)
}
