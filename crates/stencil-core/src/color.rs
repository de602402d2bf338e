//! Perceptual color decomposition for parametric and ΔE masks.
//!
//! Source pixels are linear RGB with sRGB primaries; they are taken to
//! CIE L*C*h° (D65) through `palette`.

use palette::{FromColor, Lab, Lch, LinSrgb};

use crate::buffer::Array2D;
use crate::image::RgbImage;
use crate::parallel;

/// Chroma that maps to 1.0 in normalized mask space.
pub const CHROMA_NORM: f32 = 100.0;

/// A pixel in CIE L*C*h°: L in 0..100, C ≥ 0, H in degrees 0..360.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LchColor {
    pub l: f32,
    pub c: f32,
    pub h: f32,
}

impl LchColor {
    /// Lightness mapped to 0..1.
    pub fn l_norm(&self) -> f32 {
        (self.l / 100.0).clamp(0.0, 1.0)
    }

    /// Chroma mapped to 0..1 (saturating at [`CHROMA_NORM`]).
    pub fn c_norm(&self) -> f32 {
        (self.c / CHROMA_NORM).clamp(0.0, 1.0)
    }

    /// Hue mapped to 0..1.
    pub fn h_norm(&self) -> f32 {
        (self.h / 360.0).rem_euclid(1.0)
    }
}

/// Convert one linear RGB pixel to L*C*h°. Negative components are clipped.
pub fn rgb_to_lch(rgb: [f32; 3]) -> LchColor {
    let lin = LinSrgb::new(rgb[0].max(0.0), rgb[1].max(0.0), rgb[2].max(0.0));
    let lab: Lab = Lab::from_color(lin);
    let lch: Lch = Lch::from_color(lab);
    LchColor {
        l: lch.l,
        c: lch.chroma,
        h: lch.hue.into_positive_degrees(),
    }
}

/// Per-pixel L*C*h° of a whole image.
pub fn lch_planes(rgb: &RgbImage, multithread: bool) -> Array2D<LchColor> {
    let width = rgb.width as usize;
    parallel::build(width, rgb.height as usize, multithread, |x, y| {
        rgb_to_lch(rgb.pixels[y * width + x])
    })
}

/// Normalized lightness plane, used as the edge guide for smoothing.
pub fn lightness_guide(lch: &Array2D<LchColor>, multithread: bool) -> Array2D<f32> {
    let mut out = Array2D::new(lch.width(), lch.height());
    parallel::map_into(lch, &mut out, multithread, LchColor::l_norm);
    out
}
