//! Radial-gradient stamps and their blurred variants.
//!
//! A stamp is an alpha-only square: opaque at the center, fading linearly
//! to zero at `radius`. Blur is applied to the stamp once and cached, which
//! matches blurring the whole accumulation buffer because accumulation is
//! additive.

use tracing::debug;

/// Alpha-only drawing primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamp {
    radius: u32,
    blur: u32,
    size: u32,
    alpha: Vec<u8>,
}

impl Stamp {
    /// Build an unblurred `2r × 2r` stamp.
    pub fn radial(radius: u32) -> Self {
        let size = radius * 2;
        let r = radius as f64;
        let mut alpha = Vec::with_capacity((size * size) as usize);

        for y in 0..size {
            for x in 0..size {
                let dx = x as f64 + 0.5 - r;
                let dy = y as f64 + 0.5 - r;
                let falloff = (1.0 - (dx * dx + dy * dy).sqrt() / r).max(0.0);
                alpha.push((falloff * 255.0).round() as u8);
            }
        }

        Self {
            radius,
            blur: 0,
            size,
            alpha,
        }
    }

    /// A copy softened by a Gaussian-like blur of standard deviation `sigma`.
    ///
    /// The result is padded so the blurred tail is not clipped.
    pub fn blurred(&self, sigma: u32) -> Self {
        if sigma == 0 {
            return self.clone();
        }

        let boxes = box_sizes(sigma as f64);
        let pad: u32 = boxes.iter().map(|w| w / 2).sum();
        let size = self.size + pad * 2;
        let side = size as usize;

        let mut buf = vec![0f32; side * side];
        for y in 0..self.size as usize {
            let src = &self.alpha[y * self.size as usize..(y + 1) * self.size as usize];
            let row = (y + pad as usize) * side + pad as usize;
            for (dst, &a) in buf[row..row + src.len()].iter_mut().zip(src) {
                *dst = a as f32;
            }
        }

        let mut scratch = vec![0f32; side * side];
        for &w in &boxes {
            let half = (w / 2) as usize;
            box_blur_horizontal(&buf, &mut scratch, side, half);
            box_blur_vertical(&scratch, &mut buf, side, half);
        }

        Self {
            radius: self.radius,
            blur: sigma,
            size,
            alpha: buf.iter().map(|v| v.round().clamp(0.0, 255.0) as u8).collect(),
        }
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn blur(&self) -> u32 {
        self.blur
    }

    /// Side length in pixels (stamps are square).
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size
    }

    pub fn height(&self) -> u32 {
        self.size
    }

    /// Distance from the stamp center to its edge.
    pub fn half_extent(&self) -> f64 {
        self.size as f64 / 2.0
    }

    pub fn alpha(&self) -> &[u8] {
        &self.alpha
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.alpha[(y * self.size + x) as usize]
    }
}

/// Widths of three successive box filters approximating a Gaussian.
fn box_sizes(sigma: f64) -> [u32; 3] {
    const PASSES: f64 = 3.0;

    let ideal = (12.0 * sigma * sigma / PASSES + 1.0).sqrt();
    let mut lower = ideal.floor() as u32;
    if lower % 2 == 0 {
        lower = lower.saturating_sub(1).max(1);
    }
    let upper = lower + 2;
    let l = lower as f64;
    let m = ((12.0 * sigma * sigma - PASSES * l * l - 4.0 * PASSES * l - 3.0 * PASSES)
        / (-4.0 * l - 4.0))
        .round() as i64;

    let mut sizes = [upper; 3];
    for (i, size) in sizes.iter_mut().enumerate() {
        if (i as i64) < m {
            *size = lower;
        }
    }
    sizes
}

fn box_blur_horizontal(src: &[f32], dst: &mut [f32], side: usize, half: usize) {
    let norm = 1.0 / (2 * half + 1) as f32;
    for y in 0..side {
        let row = &src[y * side..(y + 1) * side];
        let out = &mut dst[y * side..(y + 1) * side];
        let mut acc: f32 = row.iter().take(half + 1).sum();
        for x in 0..side {
            out[x] = acc * norm;
            if x + half + 1 < side {
                acc += row[x + half + 1];
            }
            if x >= half {
                acc -= row[x - half];
            }
        }
    }
}

fn box_blur_vertical(src: &[f32], dst: &mut [f32], side: usize, half: usize) {
    let norm = 1.0 / (2 * half + 1) as f32;
    for x in 0..side {
        let mut acc: f32 = (0..=half.min(side - 1)).map(|y| src[y * side + x]).sum();
        for y in 0..side {
            dst[y * side + x] = acc * norm;
            if y + half + 1 < side {
                acc += src[(y + half + 1) * side + x];
            }
            if y >= half {
                acc -= src[(y - half) * side + x];
            }
        }
    }
}

/// Lazily built stamps, invalidated when their shaping parameters change.
#[derive(Debug, Default)]
pub struct StampCache {
    base: Option<Stamp>,
    blurred: Option<Stamp>,
    builds: u64,
}

impl StampCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The unblurred stamp for `radius`, rebuilt only when the radius changed.
    pub fn base(&mut self, radius: u32) -> &Stamp {
        if self.base.as_ref().is_some_and(|s| s.radius() != radius) {
            self.base = None;
            self.blurred = None;
        }
        if self.base.is_none() {
            debug!(radius = radius, "Building heatmap stamp");
            self.builds += 1;
        }
        self.base.get_or_insert_with(|| Stamp::radial(radius))
    }

    /// The stamp to draw for `radius` and `blur`.
    pub fn get(&mut self, radius: u32, blur: u32) -> &Stamp {
        if blur == 0 {
            return self.base(radius);
        }

        let stale = self
            .blurred
            .as_ref()
            .map_or(true, |s| s.radius() != radius || s.blur() != blur);
        if stale {
            let blurred = self.base(radius).blurred(blur);
            debug!(radius = radius, blur = blur, size = blurred.size(), "Built blurred stamp");
            self.blurred = Some(blurred);
        }
        self.blurred
            .get_or_insert_with(|| Stamp::radial(radius).blurred(blur))
    }

    /// Number of base stamps built so far.
    pub fn builds(&self) -> u64 {
        self.builds
    }

    pub fn clear(&mut self) {
        self.base = None;
        self.blurred = None;
    }
}
