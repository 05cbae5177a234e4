//! Viewport and document geometry, measured fresh on every pass.

use serde::{Deserialize, Serialize};

/// Visible area plus scroll position and scrollable extent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    /// Visible width in pixels.
    pub width: u32,
    /// Visible height in pixels.
    pub height: u32,
    pub scroll_x: f64,
    pub scroll_y: f64,
    /// Scrollable document width.
    pub scroll_width: f64,
    /// Scrollable document height.
    pub scroll_height: f64,
}

impl ViewportState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
            scroll_width: width as f64,
            scroll_height: height as f64,
        }
    }

    pub fn with_scroll(mut self, scroll_x: f64, scroll_y: f64) -> Self {
        self.scroll_x = scroll_x;
        self.scroll_y = scroll_y;
        self
    }

    pub fn with_document(mut self, scroll_width: f64, scroll_height: f64) -> Self {
        self.scroll_width = scroll_width;
        self.scroll_height = scroll_height;
        self
    }

    pub fn document_width(&self) -> f64 {
        self.scroll_width.max(self.width as f64)
    }

    pub fn document_height(&self) -> f64 {
        self.scroll_height.max(self.height as f64)
    }

    /// Screen position of a normalized document point.
    pub fn to_screen(&self, nx: f64, ny: f64) -> (f64, f64) {
        (
            nx * self.document_width() - self.scroll_x,
            ny * self.document_height() - self.scroll_y,
        )
    }

    /// Whether a point lies within `margin` pixels of the visible area.
    pub fn is_near(&self, x: f64, y: f64, margin: f64) -> bool {
        x >= -margin
            && y >= -margin
            && x <= self.width as f64 + margin
            && y <= self.height as f64 + margin
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Source of the current viewport geometry.
pub trait Viewport {
    /// Read the geometry now. Never cached by callers.
    fn state(&self) -> ViewportState;
}

impl Viewport for ViewportState {
    fn state(&self) -> ViewportState {
        *self
    }
}
