//! Image representation handed to the mask engine.

use crate::buffer::Array2D;

/// Source image of the current processing crop. Always stored as RGB f32 linear.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Pixel data in RGB f32 linear format, row-major.
    pub pixels: Vec<[f32; 3]>,
}

impl RgbImage {
    /// Create a uniformly colored image.
    pub fn filled(width: u32, height: u32, rgb: [f32; 3]) -> Self {
        Self {
            width,
            height,
            pixels: vec![rgb; (width as usize) * (height as usize)],
        }
    }

    /// Build an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [f32; 3]) -> Self {
        let mut pixels = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Pixel at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 3] {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Render a 0..1 grayscale buffer as an image, e.g. for "show mask".
    pub fn from_gray(mask: &Array2D<f32>) -> Self {
        Self {
            width: mask.width() as u32,
            height: mask.height() as u32,
            pixels: mask
                .as_slice()
                .iter()
                .map(|&v| {
                    let v = v.clamp(0.0, 1.0);
                    [v, v, v]
                })
                .collect(),
        }
    }
}
