// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! [`Backend`] implementation for [`DenseArray`].

use crate::kernels;
use crate::{linalg, Array, ArrayError, Backend, BinaryOp, DenseArray, Shape, UnaryOp};
use rand::Rng;

/// Backend for the flat-buffer [`DenseArray`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DenseBackend;

fn dense<'a>(op: &'static str, array: &'a Array) -> Result<&'a DenseArray, ArrayError> {
    array
        .downcast_ref::<DenseArray>()
        .ok_or_else(|| ArrayError::UnsupportedBackend {
            op,
            origin: array.type_name().to_string(),
        })
}

fn wrap(shape: Shape, data: Vec<f64>) -> Result<Array, ArrayError> {
    Ok(Array::new(DenseArray::from_vec(shape, data)?))
}

impl Backend for DenseBackend {
    fn name(&self) -> &str {
        "dense"
    }

    fn copy(&self, array: &Array) -> Result<Array, ArrayError> {
        Ok(Array::new(dense("copy", array)?.clone()))
    }

    fn to_vec(&self, array: &Array) -> Result<Vec<f64>, ArrayError> {
        Ok(dense("to_vec", array)?.as_slice().to_vec())
    }

    fn is_contiguous(&self, array: &Array) -> Result<bool, ArrayError> {
        dense("is_contiguous", array)?;
        Ok(true)
    }

    fn make_contiguous(&self, array: &Array) -> Result<Array, ArrayError> {
        self.copy(array)
    }

    fn full(&self, like: &Array, shape: &[usize], value: f64) -> Result<Array, ArrayError> {
        dense("full", like)?;
        Ok(Array::new(DenseArray::full(Shape::from(shape), value)))
    }

    fn from_vec(&self, like: &Array, shape: &[usize], data: Vec<f64>) -> Result<Array, ArrayError> {
        dense("from_vec", like)?;
        wrap(Shape::from(shape), data)
    }

    fn uniform_random(&self, like: &Array, shape: &[usize]) -> Result<Array, ArrayError> {
        dense("uniform_random", like)?;
        let shape = Shape::from(shape);
        let mut rng = rand::thread_rng();
        let data = (0..shape.num_elements()).map(|_| rng.gen::<f64>()).collect();
        wrap(shape, data)
    }

    fn reshape(&self, array: &Array, shape: &[usize]) -> Result<Array, ArrayError> {
        let a = dense("reshape", array)?;
        wrap(Shape::from(shape), a.as_slice().to_vec())
    }

    fn transpose(&self, array: &Array) -> Result<Array, ArrayError> {
        let a = dense("transpose", array)?;
        let (rows, cols) = a.shape().rows_and_last();
        wrap(
            Shape::matrix(cols, rows),
            kernels::transpose(a.as_slice(), rows, cols),
        )
    }

    fn select(&self, array: &Array, axis: usize, indices: &[usize]) -> Result<Array, ArrayError> {
        let a = dense("select", array)?;
        let mut dims = a.shape().dims().to_vec();
        let data = kernels::select(a.as_slice(), &dims, axis, indices);
        dims[axis] = indices.len();
        wrap(Shape::new(dims), data)
    }

    fn concatenate(&self, arrays: &[&Array], axis: usize) -> Result<Array, ArrayError> {
        let parts = arrays
            .iter()
            .map(|array| {
                let a = dense("concatenate", array)?;
                Ok((a.as_slice(), a.shape().dims()))
            })
            .collect::<Result<Vec<_>, ArrayError>>()?;
        let (data, dims) = kernels::concatenate(&parts, axis);
        wrap(Shape::new(dims), data)
    }

    fn index_add(&self, array: &Array, groups: &[usize], n_groups: usize) -> Result<Array, ArrayError> {
        let a = dense("index_add", array)?;
        let mut dims = a.shape().dims().to_vec();
        let row_len: usize = dims[1..].iter().product();
        let data = kernels::index_add(a.as_slice(), row_len, groups, n_groups);
        dims[0] = n_groups;
        wrap(Shape::new(dims), data)
    }

    fn binary(&self, op: BinaryOp, lhs: &Array, rhs: &Array) -> Result<Array, ArrayError> {
        let a = dense(op.as_str(), lhs)?;
        let b = dense(op.as_str(), rhs)?;
        let out_shape = a
            .shape()
            .broadcast(b.shape())
            .ok_or_else(|| ArrayError::ShapeMismatch {
                op: op.as_str(),
                lhs: a.shape().clone(),
                rhs: b.shape().clone(),
            })?;
        let data = kernels::broadcast_binary(
            op,
            a.as_slice(),
            a.shape(),
            b.as_slice(),
            b.shape(),
            &out_shape,
        );
        wrap(out_shape, data)
    }

    fn scalar(&self, op: BinaryOp, lhs: &Array, rhs: f64) -> Result<Array, ArrayError> {
        let a = dense(op.as_str(), lhs)?;
        let data = a.as_slice().iter().map(|&x| op.apply(x, rhs)).collect();
        wrap(a.shape().clone(), data)
    }

    fn unary(&self, op: UnaryOp, array: &Array) -> Result<Array, ArrayError> {
        let a = dense("unary", array)?;
        let data = a.as_slice().iter().map(|&x| op.apply(x)).collect();
        wrap(a.shape().clone(), data)
    }

    fn dot(&self, lhs: &Array, rhs: &Array) -> Result<Array, ArrayError> {
        let a = dense("dot", lhs)?;
        let b = dense("dot", rhs)?;
        let (m, k) = a.shape().rows_and_last();
        let n = b.shape().dims()[0];
        let c = kernels::matmul_nt(a.as_slice(), b.as_slice(), m, k, n);
        let mut dims = a.shape().dims().to_vec();
        if let Some(last) = dims.last_mut() {
            *last = n;
        }
        wrap(Shape::new(dims), c)
    }

    fn lstsq(&self, a: &Array, b: &Array, rcond: Option<f64>) -> Result<Array, ArrayError> {
        let x = dense("lstsq", a)?;
        let y = dense("lstsq", b)?;
        let (m, n) = x.shape().rows_and_last();
        let (_, k) = y.shape().rows_and_last();
        let data = linalg::lstsq(x.as_slice(), m, n, y.as_slice(), k, rcond)?;
        wrap(Shape::matrix(n, k), data)
    }

    fn solve(&self, a: &Array, b: &Array) -> Result<Array, ArrayError> {
        let x = dense("solve", a)?;
        let y = dense("solve", b)?;
        let (n, _) = x.shape().rows_and_last();
        let (_, k) = y.shape().rows_and_last();
        let data = linalg::solve(x.as_slice(), n, y.as_slice(), k)?;
        wrap(Shape::matrix(n, k), data)
    }

    fn equal(&self, lhs: &Array, rhs: &Array) -> Result<bool, ArrayError> {
        Ok(dense("equal", lhs)? == dense("equal", rhs)?)
    }

    fn allclose(&self, lhs: &Array, rhs: &Array, rtol: f64, atol: f64) -> Result<bool, ArrayError> {
        let a = dense("allclose", lhs)?;
        let b = dense("allclose", rhs)?;
        Ok(a.shape() == b.shape()
            && a
                .as_slice()
                .iter()
                .zip(b.as_slice())
                .all(|(x, y)| (x - y).abs() <= atol + rtol * y.abs()))
    }
}
