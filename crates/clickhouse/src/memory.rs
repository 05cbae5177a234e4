//! In-memory click store for tests and local runs without ClickHouse.

use async_trait::async_trait;
use heatmap_core::ClickEvent;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::store::{ClickEventStore, ClickQuery, StoreError};

/// Clones share the same events, page log and injected failure.
///
/// Every `fetch_page` call is recorded as `(offset, limit)` so callers can
/// check the pagination pattern.
#[derive(Clone, Default)]
pub struct MemoryClickStore {
    events: Arc<Mutex<Vec<ClickEvent>>>,
    pages: Arc<Mutex<Vec<(u64, u64)>>>,
    failure: Arc<Mutex<Option<StoreError>>>,
}

impl MemoryClickStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: impl IntoIterator<Item = ClickEvent>) -> Self {
        let store = Self::new();
        store.insert(events);
        store
    }

    /// Add events, keeping store order `(created_at, event_id)`.
    pub fn insert(&self, events: impl IntoIterator<Item = ClickEvent>) {
        let mut stored = self.events.lock();
        stored.extend(events);
        stored.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.event_id.cmp(&b.event_id))
        });
    }

    /// `(offset, limit)` of every page requested so far.
    pub fn pages_requested(&self) -> Vec<(u64, u64)> {
        self.pages.lock().clone()
    }

    pub fn clear_pages(&self) {
        self.pages.lock().clear();
    }

    /// Fail every read with `err` until [`MemoryClickStore::recover`].
    pub fn fail_with(&self, err: StoreError) {
        *self.failure.lock() = Some(err);
    }

    /// Behave like a server without the click table.
    pub fn fail_unprovisioned(&self) {
        self.fail_with(StoreError::NotProvisioned(
            "Code: 60. DB::Exception: Table heatmap.click_events does not exist. (UNKNOWN_TABLE)"
                .to_string(),
        ));
    }

    pub fn recover(&self) {
        *self.failure.lock() = None;
    }
}

#[async_trait]
impl ClickEventStore for MemoryClickStore {
    async fn fetch_page(
        &self,
        query: &ClickQuery,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<ClickEvent>, StoreError> {
        self.pages.lock().push((offset, limit));

        if let Some(err) = self.failure.lock().clone() {
            return Err(err);
        }

        Ok(self
            .events
            .lock()
            .iter()
            .filter(|e| query.matches(e))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    /// Reachable unless a query failure is injected.
    async fn ping(&self) -> Result<(), StoreError> {
        match self.failure.lock().clone() {
            Some(err @ StoreError::Query(_)) => Err(err),
            _ => Ok(()),
        }
    }
}
