//! Dense 2-D buffers used for masks, guides, and decoded external files.

use std::ops::{Index, IndexMut};

/// Row-major 2-D grid of `T`, indexed as `(x, y)`.
///
/// The masking code treats this as an opaque rectangle: no color or file
/// format semantics are attached to the values.
#[derive(Debug, Clone, PartialEq)]
pub struct Array2D<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Clone> Array2D<T> {
    /// Allocate a `width × height` grid filled with `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Set every element to `value`.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Reallocate to `width × height` filled with `value` if the dimensions differ.
    pub fn resize(&mut self, width: usize, height: usize, value: T) {
        if self.width != width || self.height != height {
            *self = Self::filled(width, height, value);
        }
    }
}

impl<T: Clone + Default> Array2D<T> {
    /// Allocate a `width × height` grid of `T::default()`.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, T::default())
    }
}

impl<T> Array2D<T> {
    /// Wrap an existing row-major vector.
    ///
    /// Returns `None` when `data.len() != width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Option<Self> {
        (data.len() == width * height).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Build a grid by evaluating `f(x, y)` for every element.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Row `y` as a slice of `width` elements.
    pub fn row(&self, y: usize) -> &[T] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        &mut self.data[y * self.width..(y + 1) * self.width]
    }

    /// Element at `(x, y)`, or `None` when out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x < self.width && y < self.height {
            self.data.get(y * self.width + x)
        } else {
            None
        }
    }

    /// `true` when both grids have the same dimensions.
    pub fn same_size<U>(&self, other: &Array2D<U>) -> bool {
        self.width == other.width && self.height == other.height
    }
}

impl<T> Index<(usize, usize)> for Array2D<T> {
    type Output = T;

    fn index(&self, (x, y): (usize, usize)) -> &T {
        debug_assert!(x < self.width && y < self.height, "({x}, {y}) out of bounds");
        &self.data[y * self.width + x]
    }
}

impl<T> IndexMut<(usize, usize)> for Array2D<T> {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut T {
        debug_assert!(x < self.width && y < self.height, "({x}, {y}) out of bounds");
        &mut self.data[y * self.width + x]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_is_row_major() {
        let grid = Array2D::from_fn(3, 2, |x, y| (y * 10 + x) as u32);
        assert_eq!(grid.as_slice(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(grid[(2, 1)], 12);
        assert_eq!(grid.row(1), &[10, 11, 12]);
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        assert!(Array2D::from_vec(2, 2, vec![0.0_f32; 3]).is_none());
        assert!(Array2D::from_vec(2, 2, vec![0.0_f32; 4]).is_some());
    }

    #[test]
    fn test_get_out_of_bounds_is_none() {
        let grid: Array2D<f32> = Array2D::new(4, 4);
        assert!(grid.get(4, 0).is_none());
        assert!(grid.get(0, 4).is_none());
        assert_eq!(grid.get(3, 3), Some(&0.0));
    }

    #[test]
    fn test_resize_keeps_matching_buffer() {
        let mut grid = Array2D::filled(2, 2, 7u8);
        grid.resize(2, 2, 0);
        assert_eq!(grid.as_slice(), &[7, 7, 7, 7]);
        grid.resize(3, 1, 0);
        assert_eq!(grid.dimensions(), (3, 1));
        assert_eq!(grid.as_slice(), &[0, 0, 0]);
    }
}
