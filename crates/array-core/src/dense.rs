// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! A minimal owned array type with a flat row-major buffer.

use crate::{ArrayData, ArrayError, Shape};
use std::any::Any;

/// An owned, n-dimensional `f64` array stored in contiguous memory.
///
/// `DenseArray` is the lightweight alternative to `ndarray::ArrayD<f64>`:
/// it has no views and no strides, so it is always contiguous.
///
/// # Memory Layout
/// Data is stored in row-major (C) order as a flat `Vec<f64>`.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseArray {
    shape: Shape,
    data: Vec<f64>,
}

impl DenseArray {
    /// Creates a new array filled with zeros.
    ///
    /// # Examples
    /// ```
    /// use array_core::{DenseArray, Shape};
    /// let a = DenseArray::zeros(Shape::matrix(2, 3));
    /// assert_eq!(a.as_slice().len(), 6);
    /// ```
    pub fn zeros(shape: Shape) -> Self {
        Self::full(shape, 0.0)
    }

    /// Creates a new array with every element set to `value`.
    pub fn full(shape: Shape, value: f64) -> Self {
        let size = shape.num_elements();
        Self {
            shape,
            data: vec![value; size],
        }
    }

    /// Creates an array from row-major values.
    ///
    /// Returns an error if `data.len()` does not match `shape.num_elements()`.
    ///
    /// # Examples
    /// ```
    /// use array_core::{DenseArray, Shape};
    /// let a = DenseArray::from_vec(Shape::vector(3), vec![1.0, 2.0, 3.0]).unwrap();
    /// assert_eq!(a.as_slice(), &[1.0, 2.0, 3.0]);
    /// ```
    pub fn from_vec(shape: Shape, data: Vec<f64>) -> Result<Self, ArrayError> {
        let expected = shape.num_elements();
        if data.len() != expected {
            return Err(ArrayError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Returns the array's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the values in row-major order.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Returns the values in row-major order, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Fills the array with a constant value.
    pub fn fill(&mut self, value: f64) {
        self.data.iter_mut().for_each(|x| *x = value);
    }
}

impl ArrayData for DenseArray {
    fn shape(&self) -> &[usize] {
        self.shape.dims()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros() {
        let a = DenseArray::zeros(Shape::matrix(2, 3));
        assert_eq!(a.shape(), &Shape::matrix(2, 3));
        assert!(a.as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_from_vec() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let a = DenseArray::from_vec(Shape::matrix(2, 3), data.clone()).unwrap();
        assert_eq!(a.as_slice(), data.as_slice());
    }

    #[test]
    fn test_from_vec_size_mismatch() {
        let result = DenseArray::from_vec(Shape::matrix(2, 3), vec![0.0; 5]);
        assert!(matches!(
            result,
            Err(ArrayError::BufferSizeMismatch {
                expected: 6,
                actual: 5
            })
        ));
    }

    #[test]
    fn test_fill() {
        let mut a = DenseArray::zeros(Shape::vector(5));
        a.fill(3.5);
        assert!(a.as_slice().iter().all(|&x| x == 3.5));
    }

    #[test]
    fn test_as_mut_slice() {
        let mut a = DenseArray::zeros(Shape::vector(3));
        let slice = a.as_mut_slice();
        slice[0] = 10.0;
        slice[2] = 30.0;
        assert_eq!(a.as_slice(), &[10.0, 0.0, 30.0]);
    }

    #[test]
    fn test_array_data_shape() {
        let a = DenseArray::zeros(Shape::new(vec![4, 0, 2]));
        assert_eq!(ArrayData::shape(&a), &[4, 0, 2]);
    }
}
