//! Spatial filters for feathering and refining masks.
//!
//! [`gaussian_blur`] is a separable, row-parallel Gaussian with
//! clamp-to-edge borders. [`guided_filter`] is the edge-preserving filter of
//! He, Sun & Tang (2010): it smooths a mask while snapping its transitions to
//! edges of a guide image (here, image lightness).

use crate::buffer::Array2D;
use crate::parallel;

/// Regularization of the guided filter. Smaller values follow guide edges
/// more tightly.
const GUIDED_EPSILON: f32 = 1e-3;

/// Kernel taps for `sigma`, truncated at 3σ and at `max_radius`. With
/// clamp-to-edge borders, taps beyond the buffer extent add nothing new.
fn gaussian_kernel(sigma: f32, max_radius: usize) -> Vec<f32> {
    let radius = ((sigma * 3.0).ceil() as usize).min(max_radius);
    if radius == 0 {
        return vec![1.0];
    }
    let len = radius * 2 + 1;
    let s2 = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..len)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / s2).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}

/// Gaussian blur of a single-channel buffer.
///
/// Non-positive or non-finite `sigma` returns the input unchanged.
#[must_use = "returns the blurred buffer"]
pub fn gaussian_blur(src: &Array2D<f32>, sigma: f32, multithread: bool) -> Array2D<f32> {
    if !sigma.is_finite() || sigma <= 0.0 || src.is_empty() {
        return src.clone();
    }
    let (w, h) = src.dimensions();
    let kernel = gaussian_kernel(sigma, w.max(h));
    let radius = (kernel.len() / 2) as isize;

    // --- Horizontal pass (parallel by row) ---
    let mut horizontal = Array2D::new(w, h);
    parallel::for_each_row(&mut horizontal, multithread, |y, row_out| {
        let row_in = src.row(y);
        for (x, out) in row_out.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (ki, &kv) in kernel.iter().enumerate() {
                let sx = (x as isize + ki as isize - radius).clamp(0, w as isize - 1) as usize;
                acc += row_in[sx] * kv;
            }
            *out = acc;
        }
    });

    // --- Vertical pass (parallel by row) ---
    let mut out = Array2D::new(w, h);
    parallel::for_each_row(&mut out, multithread, |y, row_out| {
        for (ki, &kv) in kernel.iter().enumerate() {
            let sy = (y as isize + ki as isize - radius).clamp(0, h as isize - 1) as usize;
            for (o, &v) in row_out.iter_mut().zip(horizontal.row(sy)) {
                *o += v * kv;
            }
        }
    });
    out
}

/// Mean over a `(2r+1)²` window, shrinking the window at the borders.
fn box_mean(src: &Array2D<f32>, r: usize, multithread: bool) -> Array2D<f32> {
    let (w, h) = src.dimensions();
    // A window wider than the buffer covers all of it.
    let r = r.min(w.max(h));

    let mut horizontal = Array2D::new(w, h);
    parallel::for_each_row(&mut horizontal, multithread, |y, row_out| {
        let row_in = src.row(y);
        let mut prefix = Vec::with_capacity(w + 1);
        prefix.push(0.0_f64);
        for &v in row_in {
            let last = prefix[prefix.len() - 1];
            prefix.push(last + f64::from(v));
        }
        for (x, out) in row_out.iter_mut().enumerate() {
            let lo = x.saturating_sub(r);
            let hi = (x + r + 1).min(w);
            *out = ((prefix[hi] - prefix[lo]) / (hi - lo) as f64) as f32;
        }
    });

    let mut out = Array2D::new(w, h);
    parallel::for_each_row(&mut out, multithread, |y, row_out| {
        let lo = y.saturating_sub(r);
        let hi = (y + r + 1).min(h);
        for sy in lo..hi {
            for (o, &v) in row_out.iter_mut().zip(horizontal.row(sy)) {
                *o += v;
            }
        }
        let n = (hi - lo) as f32;
        for o in row_out.iter_mut() {
            *o /= n;
        }
    });
    out
}

fn zip_map(
    a: &Array2D<f32>,
    b: &Array2D<f32>,
    multithread: bool,
    f: impl Fn(f32, f32) -> f32 + Sync,
) -> Array2D<f32> {
    let mut out = Array2D::new(a.width(), a.height());
    parallel::for_each_row(&mut out, multithread, |y, row| {
        for ((o, &va), &vb) in row.iter_mut().zip(a.row(y)).zip(b.row(y)) {
            *o = f(va, vb);
        }
    });
    out
}

/// Edge-aware smoothing of `src` steered by `guide`.
///
/// Both buffers must have the same dimensions. A zero radius returns `src`
/// unchanged.
#[must_use = "returns the filtered buffer"]
pub fn guided_filter(
    guide: &Array2D<f32>,
    src: &Array2D<f32>,
    radius: usize,
    multithread: bool,
) -> Array2D<f32> {
    debug_assert!(guide.same_size(src), "guide and source dimensions differ");
    if radius == 0 || src.is_empty() || !guide.same_size(src) {
        return src.clone();
    }

    let mean_i = box_mean(guide, radius, multithread);
    let mean_p = box_mean(src, radius, multithread);
    let corr_ii = box_mean(&zip_map(guide, guide, multithread, |i, _| i * i), radius, multithread);
    let corr_ip = box_mean(&zip_map(guide, src, multithread, |i, p| i * p), radius, multithread);

    let var_i = zip_map(&corr_ii, &mean_i, multithread, |c, m| c - m * m);
    let cov_ip = {
        let mut out = Array2D::new(src.width(), src.height());
        parallel::for_each_row(&mut out, multithread, |y, row| {
            for (x, o) in row.iter_mut().enumerate() {
                *o = corr_ip[(x, y)] - mean_i[(x, y)] * mean_p[(x, y)];
            }
        });
        out
    };

    let a = zip_map(&cov_ip, &var_i, multithread, |cov, var| cov / (var + GUIDED_EPSILON));
    let b = {
        let mut out = Array2D::new(src.width(), src.height());
        parallel::for_each_row(&mut out, multithread, |y, row| {
            for (x, o) in row.iter_mut().enumerate() {
                *o = mean_p[(x, y)] - a[(x, y)] * mean_i[(x, y)];
            }
        });
        out
    };

    let mean_a = box_mean(&a, radius, multithread);
    let mean_b = box_mean(&b, radius, multithread);

    let mut out = Array2D::new(src.width(), src.height());
    parallel::for_each_row(&mut out, multithread, |y, row| {
        for (x, o) in row.iter_mut().enumerate() {
            *o = mean_a[(x, y)] * guide[(x, y)] + mean_b[(x, y)];
        }
    });
    out
}
