//! Filter controller: owns the filter selection, issues aggregation
//! requests and feeds results to the density overlay.
//!
//! Every request carries the generation it was issued under. A response
//! whose generation is no longer current is dropped, so a slow reply can
//! never overwrite a newer one.

use heatmap_core::{DeviceFilter, HeatmapResponse, HeatmapStats};
use tracing::{debug, info, warn};

use crate::activation::{activation_requested, strip_activation_marker, History};
use crate::error::{ControllerError, FetchError};
use crate::filters::{DayWindow, Filters, GridChoice};
use crate::render::{DensityOverlay, OverlayData, RenderConfig, Surface, Viewport};
use crate::source::{HeatmapQuery, HeatmapSource};

/// What the UI should show.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Inactive,
    Loading,
    Error(ControllerError),
    /// No clicks in the window. A normal outcome, not an error.
    Empty(HeatmapStats),
    Ready(HeatmapStats),
}

impl ViewState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// A request issued but not yet resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    generation: u64,
    pub query: HeatmapQuery,
}

impl PendingRequest {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

pub struct FilterController<H, S, V> {
    history: H,
    overlay: DensityOverlay<S, V>,
    filters: Filters,
    page_path: String,
    state: ViewState,
    generation: u64,
    active: bool,
}

impl<H: History, S: Surface, V: Viewport> FilterController<H, S, V> {
    pub fn new(history: H, overlay: DensityOverlay<S, V>) -> Self {
        Self {
            history,
            overlay,
            filters: Filters::default(),
            page_path: String::new(),
            state: ViewState::Inactive,
            generation: 0,
            active: false,
        }
    }

    /// Activate when the current URL carries the marker.
    pub fn activate_if_requested(&mut self, viewport_width: u32) -> Option<PendingRequest> {
        if activation_requested(&self.history.current_url()) {
            self.activate(viewport_width)
        } else {
            None
        }
    }

    /// Enter overlay mode for the current page and issue the first request.
    ///
    /// The device filter is picked from the viewport width once, here.
    pub fn activate(&mut self, viewport_width: u32) -> Option<PendingRequest> {
        if self.active {
            return None;
        }
        self.active = true;
        self.page_path = self.history.current_url().path().to_string();
        self.filters = Filters::for_viewport(viewport_width);
        info!(
            page_path = %self.page_path,
            device = self.filters.device.as_str(),
            "Heatmap overlay activated"
        );
        self.begin_request()
    }

    /// Leave overlay mode: unmount, forget everything, drop the URL marker.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.generation += 1;
        self.overlay.unmount();
        self.overlay.clear_data();
        self.state = ViewState::Inactive;
        self.page_path.clear();
        self.filters = Filters::default();

        let current = self.history.current_url();
        let stripped = strip_activation_marker(&current);
        if stripped != current {
            self.history.replace_url(stripped);
        }
        info!("Heatmap overlay deactivated");
    }

    pub fn set_days(&mut self, days: DayWindow) -> Option<PendingRequest> {
        if self.filters.days == days {
            return None;
        }
        self.filters.days = days;
        self.begin_request()
    }

    pub fn set_device(&mut self, device: DeviceFilter) -> Option<PendingRequest> {
        if self.filters.device == device {
            return None;
        }
        self.filters.device = device;
        self.begin_request()
    }

    pub fn set_grid(&mut self, grid: GridChoice) -> Option<PendingRequest> {
        if self.filters.grid == grid {
            return None;
        }
        self.filters.grid = grid;
        self.begin_request()
    }

    /// Rendering parameters apply immediately; no request is needed.
    pub fn set_render_config(&mut self, config: RenderConfig) {
        self.overlay.set_config(config);
    }

    /// Issue a request for the current filters, superseding any in flight.
    pub fn begin_request(&mut self) -> Option<PendingRequest> {
        if !self.active {
            return None;
        }
        self.generation += 1;
        self.state = ViewState::Loading;
        debug!(generation = self.generation, "Heatmap request issued");
        Some(PendingRequest {
            generation: self.generation,
            query: HeatmapQuery::new(self.page_path.clone(), &self.filters),
        })
    }

    /// Apply a result. Returns `false` when it was stale and ignored.
    pub fn resolve(
        &mut self,
        pending: PendingRequest,
        result: Result<HeatmapResponse, FetchError>,
    ) -> bool {
        if !self.active || pending.generation != self.generation {
            debug!(
                generation = pending.generation,
                current = self.generation,
                "Dropping stale heatmap response"
            );
            return false;
        }

        self.state = match result {
            Ok(response) if response.stats.total_clicks == 0 => {
                self.overlay.unmount();
                self.overlay.clear_data();
                ViewState::Empty(response.stats)
            }
            Ok(response) => {
                self.overlay.set_data(OverlayData::from(&response));
                self.overlay.mount();
                ViewState::Ready(response.stats)
            }
            Err(err) => {
                warn!(error = %err, "Heatmap request failed");
                self.overlay.unmount();
                self.overlay.clear_data();
                ViewState::Error(ControllerError::from(&err))
            }
        };
        true
    }

    /// Fetch `pending` from `source` and apply the result.
    pub async fn execute<Src>(&mut self, source: &Src, pending: PendingRequest) -> bool
    where
        Src: HeatmapSource + ?Sized,
    {
        let result = source.fetch(&pending.query).await;
        self.resolve(pending, result)
    }

    /// Issue a request for the current filters and wait for it.
    pub async fn refresh<Src>(&mut self, source: &Src) -> bool
    where
        Src: HeatmapSource + ?Sized,
    {
        match self.begin_request() {
            Some(pending) => self.execute(source, pending).await,
            None => false,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn filters(&self) -> Filters {
        self.filters
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn page_path(&self) -> &str {
        &self.page_path
    }

    pub fn overlay(&self) -> &DensityOverlay<S, V> {
        &self.overlay
    }

    /// Forward scroll/resize/frame events to the overlay through this.
    pub fn overlay_mut(&mut self) -> &mut DensityOverlay<S, V> {
        &mut self.overlay
    }

    pub fn history(&self) -> &H {
        &self.history
    }
}
