//! Batch insert of click events.
//!
//! Clicks are normally written by the collection pipeline; this path exists
//! for seeding, backfills, and tests.

use crate::client::ClickHouseClient;
use crate::query::ClickEventRow;
use crate::schema::CLICK_EVENTS_TABLE;
use crate::store::StoreError;
use heatmap_core::{limits::CLICK_EVENT_NAME, ClickEvent};
use tracing::debug;

/// Insert click events, returning the number written.
pub async fn insert_click_events(
    client: &ClickHouseClient,
    events: &[ClickEvent],
) -> Result<usize, StoreError> {
    if events.is_empty() {
        return Ok(0);
    }

    let start = std::time::Instant::now();

    let mut insert = client
        .inner()
        .insert(CLICK_EVENTS_TABLE)
        .map_err(|e| StoreError::Query(format!("Insert error: {}", e)))?;

    for event in events {
        let row = ClickEventRow::from_event(event, CLICK_EVENT_NAME);
        insert
            .write(&row)
            .await
            .map_err(|e| StoreError::Query(format!("Write error: {}", e)))?;
    }

    insert
        .end()
        .await
        .map_err(|e| StoreError::Query(format!("End error: {}", e)))?;

    debug!(
        count = events.len(),
        latency_ms = %start.elapsed().as_millis(),
        "Inserted click events"
    );

    Ok(events.len())
}
