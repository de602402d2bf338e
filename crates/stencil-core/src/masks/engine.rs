//! Per-region mask generation.
//!
//! Each region's enabled sources are evaluated independently and multiplied
//! into one composite, so source order never matters. The composite is
//! blurred into the chroma mask and additionally smoothed against image
//! lightness into the lightness mask. A linked source then scales both
//! channels, the region's inversion is applied, and the result is offered
//! to the linked store for later consumers in the same pass.
//!
//! Regions run in order, one at a time; only per-pixel work fans out.

use std::cell::OnceCell;
use std::time::Instant;

use crate::buffer::Array2D;
use crate::color::{LchColor, lch_planes, lightness_guide};
use crate::image::RgbImage;
use crate::params::Mask;
use crate::parallel;
use crate::progress::{ProgressListener, report_error};

use super::area::area_mask;
use super::delta_e::delta_e_mask;
use super::drawn::drawn_mask;
use super::external::ExternalMaskManager;
use super::filter::{gaussian_blur, guided_filter};
use super::geometry::MaskGeometry;
use super::linked::LinkedMaskManager;
use super::parametric::parametric_mask;

/// Output of [`generate_masks`]: one lightness/chroma pair per input mask.
#[derive(Debug, Clone, Default)]
pub struct GeneratedMasks {
    pub lightness: Vec<Array2D<f32>>,
    pub chroma: Vec<Array2D<f32>>,
    /// Grayscale rendering of the lightness mask selected by `show_mask_idx`.
    pub preview: Option<RgbImage>,
}

/// Color planes of the source image, computed on first use.
struct Planes<'a> {
    rgb: &'a RgbImage,
    multithread: bool,
    lch: OnceCell<Array2D<LchColor>>,
    guide: OnceCell<Array2D<f32>>,
}

impl<'a> Planes<'a> {
    fn new(rgb: &'a RgbImage, multithread: bool) -> Self {
        Self {
            rgb,
            multithread,
            lch: OnceCell::new(),
            guide: OnceCell::new(),
        }
    }

    fn lch(&self) -> &Array2D<LchColor> {
        self.lch.get_or_init(|| lch_planes(self.rgb, self.multithread))
    }

    fn guide(&self) -> &Array2D<f32> {
        self.guide
            .get_or_init(|| lightness_guide(self.lch(), self.multithread))
    }
}

fn multiply_in_place(acc: &mut Array2D<f32>, m: &Array2D<f32>, multithread: bool) {
    debug_assert!(acc.same_size(m), "mask source dimensions differ");
    parallel::for_each_row(acc, multithread, |y, row| {
        for (a, &v) in row.iter_mut().zip(m.row(y)) {
            *a *= v;
        }
    });
}

fn multiply_into(acc: &mut Option<Array2D<f32>>, m: Array2D<f32>, multithread: bool) {
    match acc {
        None => *acc = Some(m),
        Some(acc) => multiply_in_place(acc, &m, multithread),
    }
}

/// Generate the masks of one tool.
///
/// `rgb` is the processing crop; every output buffer has its dimensions.
/// Recoverable failures (missing linked mask, unreadable external file)
/// make that source neutral and are reported to `listener`.
#[allow(clippy::too_many_arguments)]
pub fn generate_masks(
    rgb: &RgbImage,
    tool: &str,
    linked: &mut LinkedMaskManager,
    external: &ExternalMaskManager,
    masks: &[Mask],
    geom: &MaskGeometry,
    multithread: bool,
    show_mask_idx: Option<usize>,
    listener: Option<&dyn ProgressListener>,
) -> GeneratedMasks {
    let (width, height) = (rgb.width as usize, rgb.height as usize);
    let planes = Planes::new(rgb, multithread);
    let mut result = GeneratedMasks {
        lightness: Vec::with_capacity(masks.len()),
        chroma: Vec::with_capacity(masks.len()),
        preview: None,
    };

    for (idx, mask) in masks.iter().enumerate() {
        let start = Instant::now();
        let (lightness, chroma) = if mask.enabled {
            region_masks(mask, &planes, tool, linked, external, geom, multithread, listener)
        } else {
            (Array2D::filled(width, height, 1.0), Array2D::filled(width, height, 1.0))
        };

        if linked.is_needed(tool, &mask.name) {
            linked.store_mask(tool, &mask.name, &lightness, &chroma, multithread);
        }
        if show_mask_idx == Some(idx) {
            result.preview = Some(RgbImage::from_gray(&lightness));
        }
        tracing::debug!(
            tool,
            region = idx,
            name = %mask.name,
            elapsed_us = start.elapsed().as_micros() as u64,
            "region mask generated"
        );

        result.lightness.push(lightness);
        result.chroma.push(chroma);
        if let Some(listener) = listener {
            listener.set_progress((idx + 1) as f64 / masks.len() as f64);
        }
    }

    if show_mask_idx.is_some_and(|i| i >= masks.len()) {
        tracing::warn!(tool, ?show_mask_idx, regions = masks.len(), "show_mask index out of range");
    }
    result
}

#[allow(clippy::too_many_arguments)]
fn region_masks(
    mask: &Mask,
    planes: &Planes<'_>,
    tool: &str,
    linked: &LinkedMaskManager,
    external: &ExternalMaskManager,
    geom: &MaskGeometry,
    multithread: bool,
    listener: Option<&dyn ProgressListener>,
) -> (Array2D<f32>, Array2D<f32>) {
    let (width, height) = (planes.rgb.width as usize, planes.rgb.height as usize);
    let mut composite: Option<Array2D<f32>> = None;

    if mask.parametric.enabled {
        if let Some(m) = parametric_mask(&mask.parametric, planes.lch(), planes.guide(), geom, multithread) {
            multiply_into(&mut composite, m, multithread);
        }
    }
    if let Some(m) = area_mask(&mask.area, width, height, geom, multithread) {
        multiply_into(&mut composite, m, multithread);
    }
    if mask.delta_e.enabled {
        if let Some(m) = delta_e_mask(&mask.delta_e, planes.lch(), multithread) {
            multiply_into(&mut composite, m, multithread);
        }
    }
    if let Some(m) = drawn_mask(&mask.drawn, width, height, geom, multithread) {
        multiply_into(&mut composite, m, multithread);
    }
    if mask.external.enabled {
        let mut m = Array2D::new(width, height);
        let ok = external.apply_mask(
            &mask.external.path,
            mask.external.inverted,
            geom.scaled(mask.external.feather),
            geom.offset_x,
            geom.offset_y,
            geom.full_width,
            geom.full_height,
            planes.guide(),
            &mut m,
            multithread,
            listener,
        );
        if ok {
            multiply_into(&mut composite, m, multithread);
        }
    }

    let composite = composite.unwrap_or_else(|| Array2D::filled(width, height, 1.0));
    let mut chroma = gaussian_blur(&composite, geom.scaled(mask.postprocess.blur), multithread);
    let radius = geom.scaled(mask.postprocess.smoothing).round();
    let mut lightness = if radius >= 1.0 {
        guided_filter(planes.guide(), &chroma, radius as usize, multithread)
    } else {
        chroma.clone()
    };

    if mask.linked.enabled {
        let mut l1 = Array2D::new(0, 0);
        let mut l2 = Array2D::new(0, 0);
        let found = linked.apply_mask(
            &mask.linked.tool,
            &mask.linked.name,
            mask.linked.inverted,
            &mut l1,
            &mut l2,
            multithread,
            listener,
        );
        if found && l1.same_size(&lightness) && l2.same_size(&chroma) {
            multiply_in_place(&mut lightness, &l1, multithread);
            multiply_in_place(&mut chroma, &l2, multithread);
        } else if found {
            tracing::warn!(
                tool,
                linked_tool = %mask.linked.tool,
                linked_name = %mask.linked.name,
                "linked mask size differs from the crop; ignored"
            );
            report_error(
                listener,
                &format!(
                    "linked mask \"{}/{}\" does not match the image size",
                    mask.linked.tool, mask.linked.name
                ),
            );
        }
    }

    let inverted = mask.inverted;
    for buf in [&mut lightness, &mut chroma] {
        parallel::for_each_row(buf, multithread, |_, row| {
            for v in row {
                let m = if inverted { 1.0 - *v } else { *v };
                *v = m.clamp(0.0, 1.0);
            }
        });
    }
    (lightness, chroma)
}
