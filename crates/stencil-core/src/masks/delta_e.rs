//! Color-difference sampling and the ΔE mask source.
//!
//! ΔE here is a weighted CIE94-style distance in L*C*h°:
//! ```text
//! ΔH = 2·√(C₁·C₂)·sin(Δh / 2)
//! ΔE = √(w_L·ΔL² + w_C·ΔC² + w_H·ΔH²)
//! ```
//! The mask is fully on within `range` and decays as a Gaussian of the
//! excess distance beyond it.

use serde::{Deserialize, Serialize};

use crate::buffer::Array2D;
use crate::color::{LchColor, rgb_to_lch};
use crate::image::RgbImage;
use crate::params::DeltaEMask;
use crate::parallel;

use super::geometry::MaskGeometry;

/// Channel rendered by [`fill_pipette_masks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MasksEditId {
    H,
    C,
    L,
}

/// Weighted perceptual distance between two L*C*h° colors.
pub fn delta_e(reference: LchColor, sample: LchColor, weights: [f32; 3]) -> f32 {
    let dl = sample.l - reference.l;
    let dc = sample.c - reference.c;
    let dh = (sample.h - reference.h).to_radians();
    let dh_big = 2.0 * (sample.c * reference.c).max(0.0).sqrt() * (dh * 0.5).sin();
    (weights[0] * dl * dl + weights[1] * dc * dc + weights[2] * dh_big * dh_big).sqrt()
}

/// Mask value for a distance `de` under the settings of `mask`, before inversion.
fn falloff(mask: &DeltaEMask, de: f32) -> f32 {
    let range = mask.range.max(0.0);
    let v = if de <= range {
        1.0
    } else {
        let excess = (de - range) / range.max(1.0);
        (-mask.decay.max(0.0) * excess * excess).exp()
    };
    v * mask.strength.clamp(0.0, 1.0)
}

/// Evaluate the ΔE source over precomputed L*C*h° planes.
///
/// Returns `None` when the source is disabled.
pub fn delta_e_mask(
    mask: &DeltaEMask,
    lch: &Array2D<LchColor>,
    multithread: bool,
) -> Option<Array2D<f32>> {
    if !mask.enabled {
        return None;
    }
    let reference = LchColor {
        l: mask.l,
        c: mask.c,
        h: mask.h,
    };
    let weights = [
        mask.weight_l.max(0.0),
        mask.weight_c.max(0.0),
        mask.weight_h.max(0.0),
    ];
    let mut out = Array2D::new(lch.width(), lch.height());
    parallel::map_into(lch, &mut out, multithread, |px| {
        let v = falloff(mask, delta_e(reference, *px, weights));
        if mask.inverted { 1.0 - v } else { v }
    });
    Some(out)
}

/// Sample the color under a full-resolution image coordinate.
///
/// `(x, y)` is mapped to the crop through `geom` (scaled, then offset) and
/// the RGB average of a `(2·sample_radius + 1)²` window, clamped to the
/// crop, is converted to L*C*h°. Returns `None` when the point falls outside
/// the crop or the full frame.
pub fn get_delta_e_color(
    rgb: &RgbImage,
    x: i32,
    y: i32,
    geom: &MaskGeometry,
    sample_radius: u32,
) -> Option<LchColor> {
    let fx = (f64::from(x) * geom.scale).round() as i64;
    let fy = (f64::from(y) * geom.scale).round() as i64;
    if fx < 0 || fy < 0 || fx >= i64::from(geom.full_width) || fy >= i64::from(geom.full_height) {
        return None;
    }
    let cx = fx - i64::from(geom.offset_x);
    let cy = fy - i64::from(geom.offset_y);
    if cx < 0 || cy < 0 || cx >= i64::from(rgb.width) || cy >= i64::from(rgb.height) {
        return None;
    }

    let r = i64::from(sample_radius);
    let (w, h) = (i64::from(rgb.width), i64::from(rgb.height));
    let mut sum = [0.0_f64; 3];
    let mut n = 0.0_f64;
    for sy in (cy - r).max(0)..=(cy + r).min(h - 1) {
        for sx in (cx - r).max(0)..=(cx + r).min(w - 1) {
            let px = rgb.pixels[(sy * w + sx) as usize];
            for c in 0..3 {
                sum[c] += f64::from(px[c]);
            }
            n += 1.0;
        }
    }
    Some(rgb_to_lch([
        (sum[0] / n) as f32,
        (sum[1] / n) as f32,
        (sum[2] / n) as f32,
    ]))
}

/// Render one normalized L*C*h° channel of `rgb` into `out` for on-canvas
/// picking. `out` is resized to the image if needed.
pub fn fill_pipette_masks(
    rgb: &RgbImage,
    out: &mut Array2D<f32>,
    id: MasksEditId,
    multithread: bool,
) {
    let width = rgb.width as usize;
    out.resize(width, rgb.height as usize, 0.0);
    parallel::for_each_row(out, multithread, |y, row| {
        let src = &rgb.pixels[y * width..(y + 1) * width];
        for (o, &px) in row.iter_mut().zip(src) {
            let lch = rgb_to_lch(px);
            *o = match id {
                MasksEditId::H => lch.h_norm(),
                MasksEditId::C => lch.c_norm(),
                MasksEditId::L => lch.l_norm(),
            };
        }
    });
}
