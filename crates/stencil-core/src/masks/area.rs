//! Geometric (area) mask source.
//!
//! Every shape is reduced to a signed distance field in processing pixels
//! (negative inside). Coverage is a step at the boundary when the shape has
//! no feather, otherwise a linear ramp of width `feather` centered on the
//! boundary, so the transition band grows in proportion to the feather.

use glam::Vec2;

use crate::buffer::Array2D;
use crate::params::{AreaMask, AreaShape, ShapeGeometry, ShapeMode};
use crate::parallel;

use super::geometry::MaskGeometry;

enum Outline {
    RoundedBox {
        center: Vec2,
        half: Vec2,
        rotation: Vec2,
        corner: f32,
    },
    Ellipse {
        center: Vec2,
        radii: Vec2,
        rotation: Vec2,
    },
    Polygon {
        points: Vec<Vec2>,
    },
    HalfPlane {
        center: Vec2,
        normal: Vec2,
    },
}

struct PreparedShape {
    mode: ShapeMode,
    feather: f32,
    outline: Outline,
}

/// Unit vector undoing a rotation of `degrees`.
fn inverse_rotation(degrees: f32) -> Vec2 {
    Vec2::from_angle(-degrees.to_radians())
}

impl PreparedShape {
    fn new(shape: &AreaShape, geom: &MaskGeometry) -> Self {
        let outline = match &shape.geometry {
            ShapeGeometry::Rectangle {
                center,
                width,
                height,
                angle,
                roundness,
            } => {
                let half = Vec2::new(
                    width.abs() * geom.full_width as f32,
                    height.abs() * geom.full_height as f32,
                ) * 0.5;
                Outline::RoundedBox {
                    center: geom.to_pixels(*center),
                    half,
                    rotation: inverse_rotation(*angle),
                    corner: roundness.clamp(0.0, 1.0) * half.min_element(),
                }
            }
            ShapeGeometry::Ellipse {
                center,
                radius_x,
                radius_y,
                angle,
            } => Outline::Ellipse {
                center: geom.to_pixels(*center),
                radii: Vec2::new(
                    radius_x.abs() * geom.full_width as f32,
                    radius_y.abs() * geom.full_height as f32,
                )
                .max(Vec2::splat(1e-3)),
                rotation: inverse_rotation(*angle),
            },
            ShapeGeometry::Polygon { points } => Outline::Polygon {
                points: points.iter().map(|p| geom.to_pixels(*p)).collect(),
            },
            ShapeGeometry::Gradient { center, angle } => Outline::HalfPlane {
                center: geom.to_pixels(*center),
                normal: Vec2::from_angle(angle.to_radians()),
            },
        };
        Self {
            mode: shape.mode,
            feather: shape.feather.max(0.0) * geom.short_side(),
            outline,
        }
    }

    fn signed_distance(&self, p: Vec2) -> f32 {
        match &self.outline {
            Outline::RoundedBox {
                center,
                half,
                rotation,
                corner,
            } => {
                let local = rotation.rotate(p - *center).abs();
                let q = local - *half + Vec2::splat(*corner);
                q.max(Vec2::ZERO).length() + q.max_element().min(0.0) - corner
            }
            Outline::Ellipse {
                center,
                radii,
                rotation,
            } => {
                let local = rotation.rotate(p - *center);
                ((local / *radii).length() - 1.0) * radii.min_element()
            }
            Outline::Polygon { points } => polygon_signed_distance(points, p),
            Outline::HalfPlane { center, normal } => (p - *center).dot(*normal),
        }
    }

    fn coverage(&self, p: Vec2) -> f32 {
        let d = self.signed_distance(p);
        if self.feather <= 0.0 {
            if d <= 0.0 { 1.0 } else { 0.0 }
        } else {
            (0.5 - d / self.feather).clamp(0.0, 1.0)
        }
    }
}

fn polygon_signed_distance(points: &[Vec2], p: Vec2) -> f32 {
    if points.len() < 3 {
        return f32::INFINITY;
    }

    let mut inside = false;
    let mut min_dist_sq = f32::INFINITY;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (pi, pj) = (points[i], points[j]);

        // Ray casting for the sign.
        if ((pi.y > p.y) != (pj.y > p.y))
            && (p.x < (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }

        min_dist_sq = min_dist_sq.min(segment_distance_sq(p, pj, pi));
        j = i;
    }

    let d = min_dist_sq.sqrt();
    if inside { -d } else { d }
}

/// Squared distance from `p` to the segment `a`–`b`.
pub(crate) fn segment_distance_sq(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    let t = if len_sq < 1e-12 {
        0.0
    } else {
        ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0)
    };
    p.distance_squared(a + ab * t)
}

/// Rasterize the area source for the crop described by `geom`.
///
/// Shapes are combined in order onto an empty selection. Returns `None`
/// when the source is disabled or has no shapes.
pub fn area_mask(
    area: &AreaMask,
    width: usize,
    height: usize,
    geom: &MaskGeometry,
    multithread: bool,
) -> Option<Array2D<f32>> {
    if !area.enabled || area.shapes.is_empty() {
        return None;
    }
    let shapes: Vec<PreparedShape> = area
        .shapes
        .iter()
        .map(|s| PreparedShape::new(s, geom))
        .collect();
    let inverted = area.inverted;

    Some(parallel::build(width, height, multithread, |x, y| {
        let p = geom.pixel_center(x, y);
        let mut m = 0.0_f32;
        for shape in &shapes {
            let s = shape.coverage(p);
            m = match shape.mode {
                ShapeMode::Add => m.max(s),
                ShapeMode::Subtract => m.min(1.0 - s),
                ShapeMode::Intersect => m.min(s),
            };
        }
        if inverted { 1.0 - m } else { m }
    }))
}
