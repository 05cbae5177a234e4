//! Internal metrics collection.
//!
//! Lock-free counters updated on the request path. A background task in the
//! binary logs a [`MetricsSnapshot`] at a fixed interval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement, saturating at zero.
    pub fn dec(&self) {
        let _ = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| Some(v.saturating_sub(1)));
    }
}

/// Increments a gauge for as long as the guard lives.
pub struct GaugeGuard<'a>(&'a Gauge);

impl<'a> GaugeGuard<'a> {
    pub fn new(gauge: &'a Gauge) -> Self {
        gauge.inc();
        Self(gauge)
    }
}

impl Drop for GaugeGuard<'_> {
    fn drop(&mut self) {
        self.0.dec();
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 10s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 10000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len() - 1);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Upper bound of the bucket containing the given quantile (0.0-1.0).
    pub fn quantile_bound(&self, q: f64) -> u64 {
        let total = self.count();
        if total == 0 {
            return 0;
        }
        let target = (q.clamp(0.0, 1.0) * total as f64).ceil().max(1.0) as u64;
        let mut seen = 0;
        for (bound, count) in self.buckets() {
            seen += count;
            if seen >= target {
                return bound;
            }
        }
        Self::BUCKET_BOUNDS[Self::BUCKET_BOUNDS.len() - 1]
    }

    /// Returns bucket counts.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the heatmap engine.
#[derive(Debug, Default)]
pub struct Metrics {
    // Request metrics
    pub heatmap_requests: Counter,
    pub heatmap_requests_failed: Counter,
    pub auth_failures: Counter,
    pub validation_failures: Counter,

    // Store scan metrics
    pub pages_fetched: Counter,
    pub events_scanned: Counter,
    pub store_errors: Counter,
    pub unprovisioned_hits: Counter,

    // Aggregate metrics
    pub cells_emitted: Counter,
    pub sampled_responses: Counter,

    // Latency histograms
    pub aggregate_latency_ms: Histogram,
    pub store_page_latency_ms: Histogram,

    // Gauges
    pub active_requests: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub heatmap_requests: u64,
    pub heatmap_requests_failed: u64,
    pub auth_failures: u64,
    pub validation_failures: u64,
    pub pages_fetched: u64,
    pub events_scanned: u64,
    pub store_errors: u64,
    pub unprovisioned_hits: u64,
    pub cells_emitted: u64,
    pub sampled_responses: u64,
    pub aggregate_latency_mean_ms: f64,
    pub aggregate_latency_p95_ms: u64,
    pub store_page_latency_mean_ms: f64,
    pub active_requests: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            heatmap_requests: self.heatmap_requests.get(),
            heatmap_requests_failed: self.heatmap_requests_failed.get(),
            auth_failures: self.auth_failures.get(),
            validation_failures: self.validation_failures.get(),
            pages_fetched: self.pages_fetched.get(),
            events_scanned: self.events_scanned.get(),
            store_errors: self.store_errors.get(),
            unprovisioned_hits: self.unprovisioned_hits.get(),
            cells_emitted: self.cells_emitted.get(),
            sampled_responses: self.sampled_responses.get(),
            aggregate_latency_mean_ms: self.aggregate_latency_ms.mean(),
            aggregate_latency_p95_ms: self.aggregate_latency_ms.quantile_bound(0.95),
            store_page_latency_mean_ms: self.store_page_latency_ms.mean(),
            active_requests: self.active_requests.get(),
        }
    }
}

/// Log a metrics snapshot as one structured line.
pub fn log_metrics_snapshot(snapshot: &MetricsSnapshot) {
    tracing::info!(
        heatmap_requests = snapshot.heatmap_requests,
        heatmap_requests_failed = snapshot.heatmap_requests_failed,
        auth_failures = snapshot.auth_failures,
        pages_fetched = snapshot.pages_fetched,
        events_scanned = snapshot.events_scanned,
        store_errors = snapshot.store_errors,
        unprovisioned_hits = snapshot.unprovisioned_hits,
        cells_emitted = snapshot.cells_emitted,
        sampled_responses = snapshot.sampled_responses,
        aggregate_latency_mean_ms = snapshot.aggregate_latency_mean_ms,
        aggregate_latency_p95_ms = snapshot.aggregate_latency_p95_ms,
        active_requests = snapshot.active_requests,
        "Metrics snapshot"
    );
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
