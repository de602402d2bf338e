//! Spline-based selection curves for parametric masks.
//!
//! Implements Catmull-Rom spline interpolation through user-defined control
//! points. A curve maps a normalized channel value (hue, chromaticity, or
//! lightness) to a selection weight.
//!
//! # Algorithm
//! Catmull-Rom splines (1974) provide C1 continuity through control points.
//! For each segment between P1 and P2, with neighbors P0 and P3:
//! ```text
//! q(t) = 0.5 × ((2×P1) + (-P0 + P2)×t + (2×P0 - 5×P1 + 4×P2 - P3)×t² + (-P0 + 3×P1 - 3×P2 + P3)×t³)
//! ```
//!
//! Hue curves are periodic: control points are replicated one period to each
//! side before interpolation so the curve is continuous across 0/1.
//!
//! # Complexity
//! - Evaluate: O(log N) binary search + O(1) interpolation
//! - Bake: O(N × size); lookups afterwards are O(1)

/// Samples in a baked curve. Enough that linear interpolation between them
/// is indistinguishable from the spline at 16-bit output precision.
const LUT_SIZE: usize = 1024;

/// Evaluates cubic Catmull-Rom spline curves from control points.
///
/// Control points are `[x, y]` pairs sorted by x-coordinate.
/// The curve passes through all control points with smooth interpolation.
pub struct CurveEvaluator<'a> {
    /// Control points as `[x, y]` pairs, sorted by x.
    pub control_points: &'a [[f32; 2]],
}

impl CurveEvaluator<'_> {
    /// Evaluate the curve at position `t`.
    ///
    /// Values outside the control point range are clamped to the
    /// first/last control point's y-value. A single control point yields a
    /// constant; no control points yield 1.0 (select everything).
    pub fn evaluate(&self, t: f32) -> f32 {
        let pts = self.control_points;
        match pts.len() {
            0 => return 1.0,
            1 => return pts[0][1],
            _ => {}
        }

        if t <= pts[0][0] {
            return pts[0][1];
        }
        if t >= pts[pts.len() - 1][0] {
            return pts[pts.len() - 1][1];
        }

        // Binary search for the segment containing t
        let mut lo = 0;
        let mut hi = pts.len() - 1;
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if pts[mid][0] <= t {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        let p1 = pts[lo];
        let p2 = pts[hi];

        // Virtual endpoints: mirror at boundaries
        let p0 = if lo > 0 {
            pts[lo - 1]
        } else {
            [2.0 * p1[0] - p2[0], 2.0 * p1[1] - p2[1]]
        };
        let p3 = if hi < pts.len() - 1 {
            pts[hi + 1]
        } else {
            [2.0 * p2[0] - p1[0], 2.0 * p2[1] - p1[1]]
        };

        let segment_t = if (p2[0] - p1[0]).abs() < 1e-10 {
            0.5
        } else {
            (t - p1[0]) / (p2[0] - p1[0])
        };

        catmull_rom(p0[1], p1[1], p2[1], p3[1], segment_t)
    }
}

/// Catmull-Rom cubic interpolation between P1 and P2.
fn catmull_rom(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

/// Replicate control points one period left and right of 0..1.
fn periodic_points(control_points: &[[f32; 2]]) -> Vec<[f32; 2]> {
    let mut pts = Vec::with_capacity(control_points.len() * 3);
    for shift in [-1.0_f32, 0.0, 1.0] {
        pts.extend(control_points.iter().map(|p| [p[0] + shift, p[1]]));
    }
    pts
}

/// A selection curve baked into a lookup table.
///
/// Output is clamped to 0..1. An empty curve bakes to a constant 1.0 and is
/// reported as a pass-through by [`is_pass_through`](Self::is_pass_through)
/// so callers can skip it entirely.
#[derive(Debug, Clone)]
pub struct SelectionCurve {
    lut: Vec<f32>,
    periodic: bool,
    pass_through: bool,
}

impl SelectionCurve {
    /// Bake `control_points` (sorted by x). `periodic` wraps the curve at 0/1.
    pub fn bake(control_points: &[[f32; 2]], periodic: bool) -> Self {
        if control_points.is_empty() {
            return Self {
                lut: vec![1.0; 2],
                periodic,
                pass_through: true,
            };
        }

        let wrapped;
        let points = if periodic && control_points.len() > 1 {
            wrapped = periodic_points(control_points);
            wrapped.as_slice()
        } else {
            control_points
        };
        let evaluator = CurveEvaluator {
            control_points: points,
        };

        let lut: Vec<f32> = (0..LUT_SIZE)
            .map(|i| {
                let t = i as f32 / (LUT_SIZE - 1) as f32;
                evaluator.evaluate(t).clamp(0.0, 1.0)
            })
            .collect();
        let pass_through = lut.iter().all(|&v| v >= 1.0);

        Self {
            lut,
            periodic,
            pass_through,
        }
    }

    /// `true` when every input maps to 1.0.
    pub fn is_pass_through(&self) -> bool {
        self.pass_through
    }

    /// Weight for normalized input `t`.
    pub fn weight(&self, t: f32) -> f32 {
        if self.pass_through {
            return 1.0;
        }
        let t = if self.periodic {
            t.rem_euclid(1.0)
        } else {
            t.clamp(0.0, 1.0)
        };
        let pos = t * (self.lut.len() - 1) as f32;
        let i = (pos as usize).min(self.lut.len() - 2);
        let frac = pos - i as f32;
        self.lut[i] + (self.lut[i + 1] - self.lut[i]) * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_catmull_rom_endpoints() {
        // At t=0, should return p1; at t=1, should return p2
        let v = catmull_rom(0.0, 0.25, 0.75, 1.0, 0.0);
        assert!((v - 0.25).abs() < EPSILON);
        let v = catmull_rom(0.0, 0.25, 0.75, 1.0, 1.0);
        assert!((v - 0.75).abs() < EPSILON);
    }

    #[test]
    fn test_evaluator_linear_with_two_points() {
        let points = [[0.0, 0.0], [1.0, 1.0]];
        let eval = CurveEvaluator {
            control_points: &points,
        };
        assert!((eval.evaluate(0.0) - 0.0).abs() < EPSILON);
        assert!((eval.evaluate(0.5) - 0.5).abs() < 0.01);
        assert!((eval.evaluate(1.0) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_evaluator_empty_selects_everything() {
        let eval = CurveEvaluator {
            control_points: &[],
        };
        assert_eq!(eval.evaluate(0.3), 1.0);
    }

    #[test]
    fn test_empty_curve_is_pass_through() {
        let curve = SelectionCurve::bake(&[], true);
        assert!(curve.is_pass_through());
        assert_eq!(curve.weight(0.42), 1.0);
    }

    #[test]
    fn test_flat_one_curve_is_pass_through() {
        let curve = SelectionCurve::bake(&[[0.0, 1.0], [1.0, 1.0]], false);
        assert!(curve.is_pass_through());
    }

    #[test]
    fn test_band_curve_selects_inside_only() {
        let curve = SelectionCurve::bake(
            &[[0.0, 0.0], [0.3, 0.0], [0.5, 1.0], [0.7, 0.0], [1.0, 0.0]],
            false,
        );
        assert!(!curve.is_pass_through());
        assert!((curve.weight(0.5) - 1.0).abs() < 0.01);
        assert!(curve.weight(0.1) < 0.01);
        assert!(curve.weight(0.9) < 0.01);
    }

    #[test]
    fn test_output_is_clamped() {
        // Overshoot between steep control points must not leave 0..1.
        let curve = SelectionCurve::bake(&[[0.0, 0.0], [0.1, 1.0], [0.2, 0.0], [1.0, 0.0]], false);
        for i in 0..=100 {
            let w = curve.weight(i as f32 / 100.0);
            assert!((0.0..=1.0).contains(&w), "weight {w} at {i}");
        }
    }

    #[test]
    fn test_periodic_curve_is_continuous_across_wrap() {
        let curve = SelectionCurve::bake(&[[0.1, 1.0], [0.5, 0.0], [0.9, 1.0]], true);
        let below = curve.weight(0.999);
        let above = curve.weight(0.001);
        assert!((below - above).abs() < 0.02, "{below} vs {above}");
        assert!((curve.weight(1.1) - curve.weight(0.1)).abs() < EPSILON);
    }
}
