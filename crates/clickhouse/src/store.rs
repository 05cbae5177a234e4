//! Read-only access to stored click events.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use heatmap_core::{limits::CLICK_EVENT_NAME, ClickEvent, DateRange, HeatmapRequest};
use thiserror::Error;

/// Click store failures.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The click table (or its database) has not been created yet.
    #[error("click store not provisioned: {0}")]
    NotProvisioned(String),

    /// Any other read failure.
    #[error("click store query failed: {0}")]
    Query(String),
}

impl From<StoreError> for heatmap_core::Error {
    fn from(err: StoreError) -> Self {
        heatmap_core::Error::store(heatmap_core::error::StoreErrorCode::ReadFailed, err.to_string())
    }
}

/// Filter for one page path over a time window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickQuery {
    pub page_path: String,
    pub event_name: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl ClickQuery {
    pub fn new(page_path: impl Into<String>, range: &DateRange) -> Self {
        Self {
            page_path: page_path.into(),
            event_name: CLICK_EVENT_NAME.to_string(),
            from: range.from,
            to: range.to,
        }
    }

    pub fn for_request(request: &HeatmapRequest, range: &DateRange) -> Self {
        Self::new(request.page_path.clone(), range)
    }

    /// Whether an event falls inside this query (used by in-memory stores).
    pub fn matches(&self, event: &ClickEvent) -> bool {
        event.page_path == self.page_path && event.created_at >= self.from && event.created_at <= self.to
    }
}

/// Paginated read access to click events.
///
/// Implementations return events ordered by `(created_at, event_id)` so that
/// consecutive offsets never overlap.
#[async_trait]
pub trait ClickEventStore: Send + Sync {
    /// Fetch up to `limit` events starting at `offset`.
    async fn fetch_page(
        &self,
        query: &ClickQuery,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<ClickEvent>, StoreError>;

    /// Cheap connectivity check.
    async fn ping(&self) -> Result<(), StoreError>;
}
