//! Heatmap aggregation endpoint.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use clickhouse_client::{scan_clicks, ClickQuery, ScanOutcome};
use heatmap_core::{
    aggregate_clicks, AggregateParams, DateRange, HeatmapAggregate, HeatmapParams, HeatmapRequest,
};
use std::time::Instant;
use telemetry::{metrics, GaugeGuard};
use tracing::{debug, info, warn};

use crate::extractors::AuthContext;
use crate::response::ApiError;
use crate::state::AppState;

/// GET /heatmap/*page_path
///
/// `page_path` arrives URL-component-encoded and is matched against stored
/// paths exactly after decoding.
pub async fn heatmap_handler(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(page_path): Path<String>,
    Query(params): Query<HeatmapParams>,
) -> Result<Json<HeatmapAggregate>, ApiError> {
    let start = Instant::now();
    let _active = GaugeGuard::new(&metrics().active_requests);
    metrics().heatmap_requests.inc();

    let request = HeatmapRequest::with_defaults(page_path, &params, state.heatmap.request_defaults())
        .map_err(|e| {
            metrics().validation_failures.inc();
            metrics().heatmap_requests_failed.inc();
            debug!(error = %e, "Invalid heatmap parameters");
            ApiError::from(e)
        })?;

    let range = DateRange::last_days(Utc::now(), request.days);
    let query = ClickQuery::for_request(&request, &range);
    let agg_params = AggregateParams::from(&request).with_max_bins(state.heatmap.max_bins);

    let outcome = scan_clicks(state.store.as_ref(), &query, state.heatmap.page_size)
        .await
        .map_err(|e| {
            metrics().heatmap_requests_failed.inc();
            warn!(
                page_path = %request.page_path,
                user_id = %auth.user_id,
                error = %e,
                "Heatmap aggregation failed"
            );
            ApiError::from(heatmap_core::Error::from(e))
        })?;

    let aggregate = match outcome {
        ScanOutcome::NotProvisioned => HeatmapAggregate::empty(&agg_params, range),
        ScanOutcome::Events(events) => aggregate_clicks(&events, &agg_params, range),
    };

    let latency_ms = start.elapsed().as_millis() as u64;
    metrics().aggregate_latency_ms.observe(latency_ms);
    metrics().cells_emitted.inc_by(aggregate.grid.len() as u64);
    if aggregate.was_sampled() {
        metrics().sampled_responses.inc();
        warn!(
            page_path = %request.page_path,
            warning = aggregate.stats.sampling_warning.as_deref().unwrap_or_default(),
            "Heatmap response sampled"
        );
    }

    info!(
        page_path = %request.page_path,
        user_id = %auth.user_id,
        days = request.days,
        grid_size = request.grid_size.get(),
        device = request.device.as_str(),
        events = aggregate.stats.original_clicks,
        cells = aggregate.grid.len(),
        latency_ms = latency_ms,
        "Heatmap served"
    );

    Ok(Json(aggregate))
}
