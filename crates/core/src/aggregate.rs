//! Spatial binning of click events into a bounded-size density summary.
//!
//! The aggregate is rebuilt from raw events on every request. Steps:
//! 1. Drop events that fail the device filter.
//! 2. Resolve each event's coordinates (document-relative pair first).
//! 3. Drop missing, non-finite, or out-of-range coordinates.
//! 4. Quantize into `grid_size × grid_size` cells and count.
//! 5. If more than `max_bins` cells are non-empty, keep the busiest ones.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::events::{ClickEvent, CoordMode};
use crate::grid::{GridCell, GridSize, HeatmapGrid};
use crate::limits::MAX_BINS;
use crate::query::{DeviceFilter, HeatmapRequest};

/// Inputs to the binning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateParams {
    pub grid_size: GridSize,
    pub device: DeviceFilter,
    pub max_bins: usize,
}

impl AggregateParams {
    pub fn new(grid_size: GridSize, device: DeviceFilter) -> Self {
        Self {
            grid_size,
            device,
            max_bins: MAX_BINS,
        }
    }

    pub fn with_max_bins(mut self, max_bins: usize) -> Self {
        self.max_bins = max_bins;
        self
    }
}

impl From<&HeatmapRequest> for AggregateParams {
    fn from(req: &HeatmapRequest) -> Self {
        Self::new(req.grid_size, req.device)
    }
}

/// Time window an aggregate covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub days: u32,
}

impl DateRange {
    /// The window `[now - days, now]`.
    ///
    /// Windows reaching past the earliest representable instant start there.
    pub fn last_days(now: DateTime<Utc>, days: u32) -> Self {
        let from = now
            .checked_sub_signed(Duration::days(i64::from(days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self {
            from,
            to: now,
            days,
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.from && ts <= self.to
    }
}

/// Filters echoed back in the stats block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredBy {
    pub device: DeviceFilter,
}

/// Summary statistics for one aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapStats {
    /// Sum of retained cell counts.
    pub total_clicks: u64,
    /// Clicks binned before sampling.
    pub original_clicks: u64,
    /// Distinct element ids among device-filtered events, before sampling.
    pub unique_elements: u64,
    /// Effective (clamped) grid resolution.
    pub grid_size: GridSize,
    pub coord_mode: CoordMode,
    pub filtered_by: FilteredBy,
    pub sampling_warning: Option<String>,
    pub date_range: DateRange,
}

/// One retained cell in screen-independent form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapClick {
    /// Normalized cell center, x axis.
    pub x: f64,
    /// Normalized cell center, y axis.
    pub y: f64,
    pub count: u64,
    pub grid_x: u32,
    pub grid_y: u32,
}

impl HeatmapClick {
    fn from_cell(size: GridSize, cell: GridCell, count: u64) -> Self {
        Self {
            x: size.center(cell.grid_x),
            y: size.center(cell.grid_y),
            count,
            grid_x: cell.grid_x,
            grid_y: cell.grid_y,
        }
    }
}

/// Aggregation result, also the `GET /heatmap` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapAggregate {
    pub clicks: Vec<HeatmapClick>,
    pub grid: HeatmapGrid,
    pub stats: HeatmapStats,
}

/// Wire name used by clients.
pub type HeatmapResponse = HeatmapAggregate;

impl HeatmapAggregate {
    /// An all-zero aggregate.
    pub fn empty(params: &AggregateParams, date_range: DateRange) -> Self {
        Self {
            clicks: Vec::new(),
            grid: HeatmapGrid::new(),
            stats: HeatmapStats {
                total_clicks: 0,
                original_clicks: 0,
                unique_elements: 0,
                grid_size: params.grid_size,
                coord_mode: CoordMode::Viewport,
                filtered_by: FilteredBy {
                    device: params.device,
                },
                sampling_warning: None,
                date_range,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stats.total_clicks == 0
    }

    pub fn was_sampled(&self) -> bool {
        self.stats.sampling_warning.is_some()
    }
}

/// Bin click events into a sparse grid.
pub fn aggregate_clicks<'a, I>(
    events: I,
    params: &AggregateParams,
    date_range: DateRange,
) -> HeatmapAggregate
where
    I: IntoIterator<Item = &'a ClickEvent>,
{
    let size = params.grid_size;
    let mut counts: HashMap<GridCell, u64> = HashMap::new();
    let mut elements: HashSet<&'a str> = HashSet::new();
    let mut original_clicks = 0u64;
    let mut saw_page_coords = false;

    for event in events {
        if !params.device.matches(event.device_bucket()) {
            continue;
        }

        if let Some(element_id) = event.element_id() {
            elements.insert(element_id);
        }

        let Some(point) = event.props.resolve() else {
            continue;
        };
        if !point.is_normalized() {
            continue;
        }
        let (Some(grid_x), Some(grid_y)) = (size.quantize(point.x), size.quantize(point.y)) else {
            continue;
        };

        if point.mode == CoordMode::Page {
            saw_page_coords = true;
        }
        *counts.entry(GridCell::new(grid_x, grid_y)).or_insert(0) += 1;
        original_clicks += 1;
    }

    let distinct_cells = counts.len();
    let mut cells: Vec<(GridCell, u64)> = counts.into_iter().collect();

    let sampling_warning = if distinct_cells > params.max_bins {
        cells.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        cells.truncate(params.max_bins);
        Some(format!(
            "Sampled {} of {} grid cells (limit {})",
            cells.len(),
            distinct_cells,
            params.max_bins
        ))
    } else {
        None
    };

    let grid: HeatmapGrid = cells.into_iter().collect();
    let clicks = grid
        .iter()
        .map(|(cell, count)| HeatmapClick::from_cell(size, cell, count))
        .collect();

    HeatmapAggregate {
        clicks,
        stats: HeatmapStats {
            total_clicks: grid.total(),
            original_clicks,
            unique_elements: elements.len() as u64,
            grid_size: size,
            coord_mode: if saw_page_coords {
                CoordMode::Page
            } else {
                CoordMode::Viewport
            },
            filtered_by: FilteredBy {
                device: params.device,
            },
            sampling_warning,
            date_range,
        },
        grid,
    }
}
