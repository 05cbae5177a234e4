//! Five-stop color ramp used to colorize accumulated density.

use super::buffer::{AccumulationBuffer, PixelBuffer};

/// Density at or above this alpha maps to the hottest color.
pub const DEFAULT_ALPHA_CEILING: u8 = 220;

const STOPS: [(f32, [u8; 3]); 5] = [
    (0.00, [0, 0, 255]),   // blue
    (0.25, [0, 255, 255]), // cyan
    (0.50, [0, 255, 0]),   // green
    (0.75, [255, 255, 0]), // yellow
    (1.00, [255, 0, 0]),   // red
];

/// 256-entry RGB lookup table over `t ∈ [0, 1]`.
#[derive(Debug, Clone)]
pub struct Palette {
    lut: [[u8; 3]; 256],
    ceiling: u8,
}

impl Palette {
    pub fn new(ceiling: u8) -> Self {
        let mut lut = [[0u8; 3]; 256];
        for (i, entry) in lut.iter_mut().enumerate() {
            *entry = interpolate(i as f32 / 255.0);
        }
        Self {
            lut,
            ceiling: ceiling.max(1),
        }
    }

    pub fn ceiling(&self) -> u8 {
        self.ceiling
    }

    /// Color for a normalized position `t`.
    pub fn at(&self, t: f32) -> [u8; 3] {
        let idx = (t.clamp(0.0, 1.0) * 255.0).round() as usize;
        self.lut[idx]
    }

    /// Color for an accumulated alpha, clamped against the ceiling.
    pub fn color_for(&self, alpha: u8) -> [u8; 3] {
        let clamped = alpha.min(self.ceiling);
        self.at(clamped as f32 / self.ceiling as f32)
    }

    /// Map every non-zero density pixel to RGBA.
    ///
    /// Output alpha is the accumulated alpha scaled by `opacity`; zero
    /// density stays fully transparent.
    pub fn colorize(&self, density: &AccumulationBuffer, out: &mut PixelBuffer, opacity: f32) {
        out.reset(density.width(), density.height());
        let opacity = opacity.clamp(0.0, 1.0);

        for (a, px) in density
            .alpha()
            .iter()
            .zip(out.as_rgba_mut().chunks_exact_mut(4))
        {
            if *a == 0 {
                continue;
            }
            let [r, g, b] = self.color_for(*a);
            px[0] = r;
            px[1] = g;
            px[2] = b;
            px[3] = (*a as f32 * opacity).round() as u8;
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA_CEILING)
    }
}

fn interpolate(t: f32) -> [u8; 3] {
    for pair in STOPS.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            let f = ((t - t0) / (t1 - t0)).clamp(0.0, 1.0);
            let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * f).round() as u8;
            return [mix(c0[0], c1[0]), mix(c0[1], c1[1]), mix(c0[2], c1[2])];
        }
    }
    STOPS[STOPS.len() - 1].1
}
