//! Density renderer.
//!
//! [`render`] turns a sparse grid into RGBA pixels for the current
//! viewport. It owns no state: every buffer it writes lives in
//! [`RenderResources`], and every geometry value comes from the
//! [`ViewportState`] passed in.

pub mod buffer;
pub mod config;
pub mod overlay;
pub mod palette;
pub mod stamp;
pub mod viewport;

pub use buffer::{AccumulationBuffer, PixelBuffer};
pub use config::RenderConfig;
pub use overlay::{DensityOverlay, MemorySurface, Surface};
pub use palette::{Palette, DEFAULT_ALPHA_CEILING};
pub use stamp::{Stamp, StampCache};
pub use viewport::{Viewport, ViewportState};

use heatmap_core::{CoordMode, GridSize, HeatmapAggregate, HeatmapGrid};

/// What the renderer needs from an aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayData {
    pub grid: HeatmapGrid,
    pub grid_size: GridSize,
    pub total_clicks: u64,
    pub coord_mode: CoordMode,
    max_count: u64,
}

impl OverlayData {
    pub fn new(grid: HeatmapGrid, grid_size: GridSize, coord_mode: CoordMode) -> Self {
        let max_count = grid.max_count().max(1);
        Self {
            total_clicks: grid.total(),
            grid,
            grid_size,
            coord_mode,
            max_count,
        }
    }

    /// Largest cell count in the dataset, at least 1.
    pub fn max_count(&self) -> u64 {
        self.max_count
    }
}

impl From<&HeatmapAggregate> for OverlayData {
    fn from(aggregate: &HeatmapAggregate) -> Self {
        Self::new(
            aggregate.grid.clone(),
            aggregate.stats.grid_size,
            aggregate.stats.coord_mode,
        )
    }
}

/// Buffers reused across frames.
///
/// Created on first render and dropped on teardown.
#[derive(Debug, Default)]
pub struct RenderResources {
    pub stamps: StampCache,
    pub accumulation: AccumulationBuffer,
    pub pixels: PixelBuffer,
    pub palette: Palette,
    /// Cells drawn during the last pass.
    pub last_drawn: usize,
}

impl RenderResources {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Paint one frame.
///
/// Each cell center is mapped through the document size and scroll offset
/// read from `viewport`; cells further than one stamp extent outside the
/// visible area are skipped.
pub fn render<'a>(
    data: &OverlayData,
    viewport: &ViewportState,
    config: &RenderConfig,
    resources: &'a mut RenderResources,
) -> &'a PixelBuffer {
    let RenderResources {
        stamps,
        accumulation,
        pixels,
        palette,
        last_drawn,
    } = resources;

    accumulation.reset(viewport.width, viewport.height);
    *last_drawn = 0;

    if !viewport.is_empty() && !data.grid.is_empty() {
        let stamp = stamps.get(config.radius_px(), config.blur_px());
        let margin = stamp.half_extent();
        let max = data.max_count as f32;

        for (cell, count) in data.grid.iter() {
            let nx = data.grid_size.center(cell.grid_x);
            let ny = data.grid_size.center(cell.grid_y);
            let (sx, sy) = viewport.to_screen(nx, ny);
            if !viewport.is_near(sx, sy, margin) {
                continue;
            }
            accumulation.draw(stamp, sx, sy, count as f32 / max);
            *last_drawn += 1;
        }
    }

    palette.colorize(accumulation, pixels, config.opacity());
    pixels
}
