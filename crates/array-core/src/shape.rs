// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Array shape descriptors and dimension utilities.

use std::fmt;

/// Describes the extents of an array, one entry per axis.
///
/// Shapes are immutable once created and provide convenience methods for
/// computing strides, total element counts, and broadcasting compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a new shape from the given dimensions.
    ///
    /// # Examples
    /// ```
    /// use array_core::Shape;
    /// let s = Shape::new(vec![2, 3, 4]);
    /// assert_eq!(s.rank(), 3);
    /// assert_eq!(s.num_elements(), 24);
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Creates a 1-D shape.
    pub fn vector(len: usize) -> Self {
        Self { dims: vec![len] }
    }

    /// Creates a 2-D shape (matrix).
    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self {
            dims: vec![rows, cols],
        }
    }

    /// Returns the number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the total number of elements.
    ///
    /// For a rank-0 shape, returns 1.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// Returns the dimensions as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Splits the shape into `(rows, last)`, where `rows` is the product of
    /// every axis but the last one.
    ///
    /// This is how every block is seen by matrix kernels: all non-property
    /// axes are flattened into a single row dimension.
    pub fn rows_and_last(&self) -> (usize, usize) {
        match self.dims.split_last() {
            Some((&last, rest)) => (rest.iter().product(), last),
            None => (1, 1),
        }
    }

    /// Computes row-major (C-order) strides for this shape.
    ///
    /// The stride for dimension `i` is the number of elements to skip
    /// in the flat buffer to advance one step along that dimension.
    pub fn strides(&self) -> Vec<usize> {
        let rank = self.dims.len();
        if rank == 0 {
            return vec![];
        }
        let mut strides = vec![0usize; rank];
        strides[rank - 1] = 1;
        for i in (0..rank - 1).rev() {
            strides[i] = strides[i + 1] * self.dims[i + 1];
        }
        strides
    }

    /// Returns the shape obtained by broadcasting `self` against `other`,
    /// or `None` when the trailing axes disagree.
    pub fn broadcast(&self, other: &Shape) -> Option<Shape> {
        let a = &self.dims;
        let b = &other.dims;
        let rank = a.len().max(b.len());
        let mut dims = vec![0usize; rank];
        for i in 0..rank {
            let da = if i < a.len() { a[a.len() - 1 - i] } else { 1 };
            let db = if i < b.len() { b[b.len() - 1 - i] } else { 1 };
            dims[rank - 1 - i] = match (da, db) {
                (x, y) if x == y => x,
                (1, y) => y,
                (x, 1) => x,
                _ => return None,
            };
        }
        Some(Shape { dims })
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

/// Convenience: `Shape::from(vec![2, 3])`.
impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

/// Convenience: `Shape::from(&[2, 3][..])`.
impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_shape() {
        let s = Shape::vector(5);
        assert_eq!(s.rank(), 1);
        assert_eq!(s.num_elements(), 5);
        assert_eq!(s.strides(), vec![1]);
    }

    #[test]
    fn test_matrix_shape() {
        let s = Shape::matrix(3, 4);
        assert_eq!(s.rank(), 2);
        assert_eq!(s.num_elements(), 12);
        assert_eq!(s.strides(), vec![4, 1]);
    }

    #[test]
    fn test_3d_strides() {
        let s = Shape::new(vec![2, 3, 4]);
        assert_eq!(s.strides(), vec![12, 4, 1]);
    }

    #[test]
    fn test_empty_axis_has_no_elements() {
        let s = Shape::new(vec![0, 3]);
        assert_eq!(s.num_elements(), 0);
        assert_eq!(s.rows_and_last(), (0, 3));
    }

    #[test]
    fn test_rows_and_last() {
        assert_eq!(Shape::new(vec![4, 3, 2]).rows_and_last(), (12, 2));
        assert_eq!(Shape::matrix(5, 7).rows_and_last(), (5, 7));
    }

    #[test]
    fn test_broadcast_unit_axes() {
        let a = Shape::new(vec![1, 3]);
        assert_eq!(a.broadcast(&Shape::new(vec![4, 3])), Some(Shape::new(vec![4, 3])));
        assert_eq!(a.broadcast(&Shape::new(vec![4, 1])), Some(Shape::new(vec![4, 3])));
        assert_eq!(a.broadcast(&Shape::new(vec![4, 2])), None);
    }

    #[test]
    fn test_broadcast_trailing_axes() {
        let a = Shape::new(vec![5, 3, 2]);
        let b = Shape::new(vec![3, 2]);
        assert_eq!(a.broadcast(&b), Some(Shape::new(vec![5, 3, 2])));

        let c = Shape::new(vec![5, 1, 1]);
        assert_eq!(a.broadcast(&c), Some(Shape::new(vec![5, 3, 2])));
    }

    #[test]
    fn test_display() {
        let s = Shape::new(vec![2, 3, 4]);
        assert_eq!(format!("{s}"), "[2, 3, 4]");
    }

    #[test]
    fn test_from_conversions() {
        let s1: Shape = vec![2, 3].into();
        let s2: Shape = (&[2, 3][..]).into();
        assert_eq!(s1, s2);
    }
}
