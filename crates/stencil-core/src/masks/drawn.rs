//! Brush-painted mask source.

use glam::Vec2;

use crate::buffer::Array2D;
use crate::params::{DrawnMask, DrawnStroke};
use crate::parallel;

use super::area::segment_distance_sq;
use super::filter::gaussian_blur;
use super::geometry::MaskGeometry;

struct PreparedStroke {
    points: Vec<Vec2>,
    radius: f32,
    inner: f32,
    opacity: f32,
    erase: bool,
    min: Vec2,
    max: Vec2,
}

impl PreparedStroke {
    fn new(stroke: &DrawnStroke, geom: &MaskGeometry) -> Option<Self> {
        if stroke.points.is_empty() || stroke.radius <= 0.0 {
            return None;
        }
        let points: Vec<Vec2> = stroke.points.iter().map(|p| geom.to_pixels(*p)).collect();
        let radius = stroke.radius * geom.short_side();
        let (min, max) = points.iter().fold(
            (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
            |(lo, hi), p| (lo.min(*p), hi.max(*p)),
        );
        Some(Self {
            points,
            radius,
            inner: radius * stroke.hardness.clamp(0.0, 1.0),
            opacity: stroke.opacity.clamp(0.0, 1.0),
            erase: stroke.erase,
            min: min - Vec2::splat(radius),
            max: max + Vec2::splat(radius),
        })
    }

    /// Brush coverage at `p`: 1 inside the hard core, linear falloff to the rim.
    fn coverage(&self, p: Vec2) -> f32 {
        if p.x < self.min.x || p.y < self.min.y || p.x > self.max.x || p.y > self.max.y {
            return 0.0;
        }
        let d = if self.points.len() == 1 {
            p.distance(self.points[0])
        } else {
            self.points
                .windows(2)
                .map(|seg| segment_distance_sq(p, seg[0], seg[1]))
                .fold(f32::INFINITY, f32::min)
                .sqrt()
        };
        if d >= self.radius {
            0.0
        } else if d <= self.inner {
            1.0
        } else {
            1.0 - (d - self.inner) / (self.radius - self.inner)
        }
    }
}

/// Rasterize the drawn source for the crop described by `geom`.
///
/// Returns `None` when the source is disabled.
pub fn drawn_mask(
    drawn: &DrawnMask,
    width: usize,
    height: usize,
    geom: &MaskGeometry,
    multithread: bool,
) -> Option<Array2D<f32>> {
    if !drawn.enabled {
        return None;
    }
    let strokes: Vec<PreparedStroke> = drawn
        .strokes
        .iter()
        .filter_map(|s| PreparedStroke::new(s, geom))
        .collect();
    let strength = 1.0 - drawn.transparency.clamp(0.0, 1.0);

    let painted = parallel::build(width, height, multithread, |x, y| {
        let p = geom.pixel_center(x, y);
        let mut m = 0.0_f32;
        for stroke in &strokes {
            let a = stroke.opacity * stroke.coverage(p);
            if stroke.erase {
                m *= 1.0 - a;
            } else {
                m = m.max(a);
            }
        }
        m * strength
    });

    let mut out = gaussian_blur(&painted, geom.scaled(drawn.feather), multithread);
    if drawn.inverted {
        for v in out.as_mut_slice() {
            *v = 1.0 - *v;
        }
    }
    Some(out)
}
