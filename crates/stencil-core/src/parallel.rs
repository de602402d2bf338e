//! Row-parallel helpers.
//!
//! Every per-pixel pass in the engine goes through these so the
//! `multithread` flag is honored in one place.

use rayon::prelude::*;

use crate::buffer::Array2D;

/// Run `f(y, row)` for every row of `buf`, fanning out with rayon when
/// `multithread` is set.
pub fn for_each_row<T, F>(buf: &mut Array2D<T>, multithread: bool, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync,
{
    let width = buf.width();
    if width == 0 {
        return;
    }
    let data = buf.as_mut_slice();
    if multithread {
        data.par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    } else {
        for (y, row) in data.chunks_mut(width).enumerate() {
            f(y, row);
        }
    }
}

/// Build a `width × height` buffer by evaluating `f(x, y)` per element.
pub fn build<T, F>(width: usize, height: usize, multithread: bool, f: F) -> Array2D<T>
where
    T: Clone + Default + Send,
    F: Fn(usize, usize) -> T + Sync,
{
    let mut out = Array2D::new(width, height);
    for_each_row(&mut out, multithread, |y, row| {
        for (x, v) in row.iter_mut().enumerate() {
            *v = f(x, y);
        }
    });
    out
}

/// Copy `src` into `dst` element-wise through `f`. Dimensions must match.
pub fn map_into<T, U, F>(src: &Array2D<T>, dst: &mut Array2D<U>, multithread: bool, f: F)
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync,
{
    debug_assert!(src.same_size(dst), "map_into dimension mismatch");
    for_each_row(dst, multithread, |y, row| {
        for (d, s) in row.iter_mut().zip(src.row(y)) {
            *d = f(s);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_matches_sequential_and_parallel() {
        let seq = build(7, 5, false, |x, y| (x * 3 + y) as f32);
        let par = build(7, 5, true, |x, y| (x * 3 + y) as f32);
        assert_eq!(seq, par);
        assert_eq!(seq[(6, 4)], 22.0);
    }

    #[test]
    fn test_map_into_applies_function() {
        let src = Array2D::filled(3, 3, 0.25_f32);
        let mut dst = Array2D::new(3, 3);
        map_into(&src, &mut dst, true, |v| 1.0 - v);
        assert!(dst.as_slice().iter().all(|&v| v == 0.75));
    }
}
