//! Sequential paginated scan of the click store.
//!
//! Pages are awaited one at a time; the next offset is only requested after
//! the previous page arrived. A page shorter than `page_size` ends the scan.

use heatmap_core::ClickEvent;
use std::time::Instant;
use telemetry::metrics;
use tracing::{debug, info, warn};

use crate::store::{ClickEventStore, ClickQuery, StoreError};

/// Result of scanning the store for one query.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// Every matching event, in store order.
    Events(Vec<ClickEvent>),
    /// The click table does not exist yet.
    NotProvisioned,
}

impl ScanOutcome {
    /// Matching events, empty when the store is not provisioned.
    pub fn into_events(self) -> Vec<ClickEvent> {
        match self {
            Self::Events(events) => events,
            Self::NotProvisioned => Vec::new(),
        }
    }
}

/// Read every event matching `query`, `page_size` rows at a time.
pub async fn scan_clicks(
    store: &dyn ClickEventStore,
    query: &ClickQuery,
    page_size: u64,
) -> Result<ScanOutcome, StoreError> {
    let page_size = page_size.max(1);
    let mut events = Vec::new();
    let mut offset = 0u64;
    let mut pages = 0u64;

    loop {
        let start = Instant::now();
        let page = match store.fetch_page(query, offset, page_size).await {
            Ok(page) => page,
            Err(StoreError::NotProvisioned(detail)) => {
                metrics().unprovisioned_hits.inc();
                info!(
                    page_path = %query.page_path,
                    detail = %detail,
                    "Click store not provisioned, returning empty scan"
                );
                return Ok(ScanOutcome::NotProvisioned);
            }
            Err(e) => {
                metrics().store_errors.inc();
                warn!(
                    page_path = %query.page_path,
                    offset = offset,
                    error = %e,
                    "Click store page fetch failed"
                );
                return Err(e);
            }
        };

        metrics()
            .store_page_latency_ms
            .observe(start.elapsed().as_millis() as u64);
        metrics().pages_fetched.inc();

        let fetched = page.len() as u64;
        pages += 1;
        offset += fetched;
        events.extend(page);

        if fetched < page_size {
            break;
        }
    }

    metrics().events_scanned.inc_by(events.len() as u64);
    debug!(
        page_path = %query.page_path,
        pages = pages,
        events = events.len(),
        "Click scan complete"
    );

    Ok(ScanOutcome::Events(events))
}
