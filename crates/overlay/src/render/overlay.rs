//! Redraw dispatcher for the density overlay.
//!
//! Scroll, data and config changes repaint immediately. Resize bursts are
//! coalesced into at most one repaint per animation frame: `on_resize`
//! reports whether the host must request a frame, and `on_animation_frame`
//! performs the repaint.

use tracing::{debug, trace};

use super::buffer::PixelBuffer;
use super::config::RenderConfig;
use super::viewport::Viewport;
use super::{render, OverlayData, RenderResources};

/// Visible canvas the overlay composites onto.
pub trait Surface {
    /// Whether the canvas is still part of the page. Redraws scheduled by
    /// timers can fire after teardown.
    fn is_attached(&self) -> bool;

    /// Replace the canvas contents with `pixels` in a single write.
    fn present(&mut self, pixels: &PixelBuffer);

    /// Remove everything from the canvas.
    fn clear(&mut self) {}
}

/// Surface that keeps the last presented frame in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    attached: bool,
    frame: Option<PixelBuffer>,
    presents: u64,
}

impl MemorySurface {
    pub fn attached() -> Self {
        Self {
            attached: true,
            ..Self::default()
        }
    }

    pub fn detach(&mut self) {
        self.attached = false;
    }

    pub fn frame(&self) -> Option<&PixelBuffer> {
        self.frame.as_ref()
    }

    /// Number of frames presented so far.
    pub fn presents(&self) -> u64 {
        self.presents
    }
}

impl Surface for MemorySurface {
    fn is_attached(&self) -> bool {
        self.attached
    }

    fn present(&mut self, pixels: &PixelBuffer) {
        self.frame = Some(pixels.clone());
        self.presents += 1;
    }

    fn clear(&mut self) {
        self.frame = None;
    }
}

/// Mounted overlay: owns the surface, the render resources and the data.
pub struct DensityOverlay<S, V> {
    surface: S,
    viewport: V,
    config: RenderConfig,
    data: Option<OverlayData>,
    resources: Option<RenderResources>,
    mounted: bool,
    frame_requested: bool,
}

impl<S: Surface, V: Viewport> DensityOverlay<S, V> {
    pub fn new(surface: S, viewport: V) -> Self {
        Self {
            surface,
            viewport,
            config: RenderConfig::default(),
            data: None,
            resources: None,
            mounted: false,
            frame_requested: false,
        }
    }

    pub fn mount(&mut self) {
        if !self.mounted {
            debug!("Mounting density overlay");
            self.mounted = true;
        }
        self.redraw();
    }

    /// Tear down: release buffers, cancel any pending frame, clear the canvas.
    pub fn unmount(&mut self) {
        if self.mounted {
            debug!("Unmounting density overlay");
        }
        self.mounted = false;
        self.frame_requested = false;
        self.resources = None;
        if self.surface.is_attached() {
            self.surface.clear();
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Scroll repaints synchronously on every event.
    pub fn on_scroll(&mut self) -> bool {
        self.redraw()
    }

    /// Returns `true` when the caller must schedule an animation frame.
    pub fn on_resize(&mut self) -> bool {
        if !self.mounted || self.frame_requested {
            return false;
        }
        self.frame_requested = true;
        true
    }

    /// Perform the repaint coalesced by [`DensityOverlay::on_resize`].
    pub fn on_animation_frame(&mut self) -> bool {
        if !std::mem::take(&mut self.frame_requested) {
            return false;
        }
        self.redraw()
    }

    pub fn set_data(&mut self, data: OverlayData) -> bool {
        self.data = Some(data);
        self.redraw()
    }

    pub fn clear_data(&mut self) {
        self.data = None;
        if self.mounted && self.surface.is_attached() {
            self.surface.clear();
        }
    }

    pub fn data(&self) -> Option<&OverlayData> {
        self.data.as_ref()
    }

    pub fn set_config(&mut self, config: RenderConfig) -> bool {
        self.config = config;
        self.redraw()
    }

    pub fn config(&self) -> RenderConfig {
        self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    /// Render and present one frame. No-op when unmounted, detached or
    /// without data.
    pub fn redraw(&mut self) -> bool {
        if !self.mounted {
            return false;
        }
        if !self.surface.is_attached() {
            trace!("Skipping overlay frame on detached surface");
            return false;
        }
        let Some(data) = self.data.as_ref() else {
            return false;
        };

        let state = self.viewport.state();
        let resources = self.resources.get_or_insert_with(RenderResources::new);
        let pixels = render(data, &state, &self.config, resources);
        self.surface.present(pixels);
        true
    }
}
