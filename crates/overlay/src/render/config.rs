//! Live-tunable rendering parameters.

use serde::{Deserialize, Serialize};

pub const MIN_RADIUS_PX: u32 = 10;
pub const MAX_RADIUS_PX: u32 = 100;
pub const DEFAULT_RADIUS_PX: u32 = 35;

pub const MAX_BLUR_PX: u32 = 40;
pub const DEFAULT_BLUR_PX: u32 = 15;

pub const MIN_OPACITY: f32 = 0.3;
pub const MAX_OPACITY: f32 = 0.9;
pub const DEFAULT_OPACITY: f32 = 0.6;

/// Stamp radius, blur and output opacity.
///
/// Lives only while the overlay is mounted; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    radius_px: u32,
    blur_px: u32,
    opacity: f32,
}

impl RenderConfig {
    /// Build a config, clamping every value into its supported range.
    pub fn new(radius_px: u32, blur_px: u32, opacity: f32) -> Self {
        let opacity = if opacity.is_finite() {
            opacity.clamp(MIN_OPACITY, MAX_OPACITY)
        } else {
            DEFAULT_OPACITY
        };
        Self {
            radius_px: radius_px.clamp(MIN_RADIUS_PX, MAX_RADIUS_PX),
            blur_px: blur_px.min(MAX_BLUR_PX),
            opacity,
        }
    }

    pub fn radius_px(&self) -> u32 {
        self.radius_px
    }

    pub fn blur_px(&self) -> u32 {
        self.blur_px
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn with_radius(self, radius_px: u32) -> Self {
        Self::new(radius_px, self.blur_px, self.opacity)
    }

    pub fn with_blur(self, blur_px: u32) -> Self {
        Self::new(self.radius_px, blur_px, self.opacity)
    }

    pub fn with_opacity(self, opacity: f32) -> Self {
        Self::new(self.radius_px, self.blur_px, opacity)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::new(DEFAULT_RADIUS_PX, DEFAULT_BLUR_PX, DEFAULT_OPACITY)
    }
}
