//! Offscreen accumulation buffer and the RGBA output buffer.

use super::stamp::Stamp;

/// Alpha-only density buffer sized to the viewport.
///
/// Stamps add into it and saturate at 255.
#[derive(Debug, Clone, Default)]
pub struct AccumulationBuffer {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

impl AccumulationBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            alpha: vec![0; width as usize * height as usize],
        }
    }

    /// Resize and clear. Reallocates only when the dimensions changed.
    pub fn reset(&mut self, width: u32, height: u32) {
        if self.width != width || self.height != height {
            *self = Self::new(width, height);
        } else {
            self.alpha.fill(0);
        }
    }

    /// Add `stamp` centered at `(cx, cy)`, scaled by `weight` in `[0, 1]`.
    pub fn draw(&mut self, stamp: &Stamp, cx: f64, cy: f64, weight: f32) {
        let weight = weight.clamp(0.0, 1.0);
        if weight == 0.0 {
            return;
        }

        let left = (cx - stamp.half_extent()).round() as i64;
        let top = (cy - stamp.half_extent()).round() as i64;
        let size = stamp.size() as i64;

        let x0 = left.max(0);
        let y0 = top.max(0);
        let x1 = (left + size).min(self.width as i64);
        let y1 = (top + size).min(self.height as i64);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let src = stamp.alpha();
        for y in y0..y1 {
            let src_row = ((y - top) * size) as usize;
            let dst_row = (y * self.width as i64) as usize;
            for x in x0..x1 {
                let a = src[src_row + (x - left) as usize];
                if a == 0 {
                    continue;
                }
                let add = (a as f32 * weight).round() as u8;
                let dst = &mut self.alpha[dst_row + x as usize];
                *dst = dst.saturating_add(add);
            }
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn alpha(&self) -> &[u8] {
        &self.alpha
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.alpha[(y * self.width + x) as usize]
    }
}

/// RGBA8 pixels ready to be composited onto the visible canvas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Resize and clear to transparent black.
    pub fn reset(&mut self, width: u32, height: u32) {
        if self.width != width || self.height != height {
            *self = Self::new(width, height);
        } else {
            self.pixels.fill(0);
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, row-major.
    pub fn as_rgba(&self) -> &[u8] {
        &self.pixels
    }

    pub fn as_rgba_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y * self.width + x) as usize * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Whether every pixel is fully transparent.
    pub fn is_clear(&self) -> bool {
        self.pixels.chunks_exact(4).all(|p| p[3] == 0)
    }
}
