//! Parametric (hue / chromaticity / lightness) mask source.

use crate::buffer::Array2D;
use crate::color::LchColor;
use crate::params::ParametricMask;
use crate::parallel;

use super::curves::SelectionCurve;
use super::filter::gaussian_blur;
use super::geometry::MaskGeometry;

/// σ (processing pixels) of the low-pass used to measure local contrast.
const CONTRAST_SIGMA: f32 = 2.0;
/// Width of the soft step around the contrast threshold, in normalized contrast.
const CONTRAST_SOFTNESS: f32 = 0.1;

/// Local contrast of `guide`, normalized so the strongest detail is 1.
fn local_contrast(guide: &Array2D<f32>, multithread: bool) -> Array2D<f32> {
    let low = gaussian_blur(guide, CONTRAST_SIGMA, multithread);
    let mut contrast = Array2D::new(guide.width(), guide.height());
    parallel::for_each_row(&mut contrast, multithread, |y, row| {
        for ((c, &g), &l) in row.iter_mut().zip(guide.row(y)).zip(low.row(y)) {
            *c = (g - l).abs();
        }
    });
    let peak = contrast.as_slice().iter().copied().fold(0.0_f32, f32::max);
    if peak > 0.0 {
        for v in contrast.as_mut_slice() {
            *v /= peak;
        }
    }
    // Spread the per-pixel measure so textured areas read as regions.
    gaussian_blur(&contrast, CONTRAST_SIGMA, multithread)
}

/// Evaluate the parametric source.
///
/// `guide` is the normalized lightness plane of the same image, used for the
/// contrast threshold. Returns `None` when the source is disabled.
pub fn parametric_mask(
    mask: &ParametricMask,
    lch: &Array2D<LchColor>,
    guide: &Array2D<f32>,
    geom: &MaskGeometry,
    multithread: bool,
) -> Option<Array2D<f32>> {
    if !mask.enabled {
        return None;
    }
    let hue = SelectionCurve::bake(&mask.hue, true);
    let chroma = SelectionCurve::bake(&mask.chromaticity, false);
    let lightness = SelectionCurve::bake(&mask.lightness, false);

    let mut out = Array2D::new(lch.width(), lch.height());
    parallel::map_into(lch, &mut out, multithread, |px| {
        hue.weight(px.h_norm()) * chroma.weight(px.c_norm()) * lightness.weight(px.l_norm())
    });

    let threshold = mask.contrast_threshold.clamp(-1.0, 1.0);
    if threshold != 0.0 {
        let contrast = local_contrast(guide, multithread);
        let t = threshold.abs();
        let keep_textured = threshold > 0.0;
        parallel::for_each_row(&mut out, multithread, |y, row| {
            for (v, &c) in row.iter_mut().zip(contrast.row(y)) {
                let step = ((c - t) / CONTRAST_SOFTNESS + 0.5).clamp(0.0, 1.0);
                *v *= if keep_textured { step } else { 1.0 - step };
            }
        });
    }

    Some(gaussian_blur(&out, geom.scaled(mask.blur), multithread))
}
