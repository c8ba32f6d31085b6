// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! [`Backend`] implementation for `ndarray::ArrayD<f64>`.
//!
//! Unlike [`DenseArray`](crate::DenseArray), `ndarray` arrays may be stored
//! in non-standard layouts (e.g., after a transpose), so contiguity is a real
//! physical property here.

use crate::{linalg, Array, ArrayData, ArrayError, Backend, BinaryOp, Shape, UnaryOp};
use ndarray::{Array2, ArrayBase, ArrayD, ArrayView, Axis, Ix2, IxDyn, ShapeError, Zip};
use rand::Rng;
use std::any::Any;

impl ArrayData for ArrayD<f64> {
    fn shape(&self) -> &[usize] {
        ArrayBase::shape(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Backend for `ndarray::ArrayD<f64>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NdArrayBackend;

fn nd<'a>(op: &'static str, array: &'a Array) -> Result<&'a ArrayD<f64>, ArrayError> {
    array
        .downcast_ref::<ArrayD<f64>>()
        .ok_or_else(|| ArrayError::UnsupportedBackend {
            op,
            origin: array.type_name().to_string(),
        })
}

fn shape_error(op: &'static str) -> impl FnOnce(ShapeError) -> ArrayError {
    move |e| ArrayError::InvalidArgument {
        op,
        detail: e.to_string(),
    }
}

fn to_matrix(op: &'static str, a: &ArrayD<f64>) -> Result<Array2<f64>, ArrayError> {
    let (rows, cols) = Shape::from(a.shape()).rows_and_last();
    Array2::from_shape_vec((rows, cols), a.iter().copied().collect()).map_err(shape_error(op))
}

impl Backend for NdArrayBackend {
    fn name(&self) -> &str {
        "ndarray"
    }

    fn copy(&self, array: &Array) -> Result<Array, ArrayError> {
        Ok(Array::new(nd("copy", array)?.clone()))
    }

    fn to_vec(&self, array: &Array) -> Result<Vec<f64>, ArrayError> {
        Ok(nd("to_vec", array)?.iter().copied().collect())
    }

    fn is_contiguous(&self, array: &Array) -> Result<bool, ArrayError> {
        Ok(nd("is_contiguous", array)?.is_standard_layout())
    }

    fn make_contiguous(&self, array: &Array) -> Result<Array, ArrayError> {
        let a = nd("make_contiguous", array)?;
        Ok(Array::new(a.as_standard_layout().into_owned()))
    }

    fn full(&self, like: &Array, shape: &[usize], value: f64) -> Result<Array, ArrayError> {
        nd("full", like)?;
        Ok(Array::new(ArrayD::from_elem(IxDyn(shape), value)))
    }

    fn from_vec(&self, like: &Array, shape: &[usize], data: Vec<f64>) -> Result<Array, ArrayError> {
        nd("from_vec", like)?;
        let a = ArrayD::from_shape_vec(IxDyn(shape), data).map_err(shape_error("from_vec"))?;
        Ok(Array::new(a))
    }

    fn uniform_random(&self, like: &Array, shape: &[usize]) -> Result<Array, ArrayError> {
        nd("uniform_random", like)?;
        let mut rng = rand::thread_rng();
        let a = ArrayD::from_shape_simple_fn(IxDyn(shape), || rng.gen::<f64>());
        Ok(Array::new(a))
    }

    fn reshape(&self, array: &Array, shape: &[usize]) -> Result<Array, ArrayError> {
        let a = nd("reshape", array)?;
        let data = a.iter().copied().collect();
        let out = ArrayD::from_shape_vec(IxDyn(shape), data).map_err(shape_error("reshape"))?;
        Ok(Array::new(out))
    }

    fn transpose(&self, array: &Array) -> Result<Array, ArrayError> {
        // Keeps the column-major layout of the reversed axes.
        Ok(Array::new(nd("transpose", array)?.clone().reversed_axes()))
    }

    fn select(&self, array: &Array, axis: usize, indices: &[usize]) -> Result<Array, ArrayError> {
        Ok(Array::new(nd("select", array)?.select(Axis(axis), indices)))
    }

    fn concatenate(&self, arrays: &[&Array], axis: usize) -> Result<Array, ArrayError> {
        let views = arrays
            .iter()
            .map(|array| Ok(nd("concatenate", array)?.view()))
            .collect::<Result<Vec<ArrayView<'_, f64, IxDyn>>, ArrayError>>()?;
        let out = ndarray::concatenate(Axis(axis), &views).map_err(shape_error("concatenate"))?;
        Ok(Array::new(out))
    }

    fn index_add(&self, array: &Array, groups: &[usize], n_groups: usize) -> Result<Array, ArrayError> {
        let a = nd("index_add", array)?;
        let mut dims = a.shape().to_vec();
        dims[0] = n_groups;
        let mut out = ArrayD::<f64>::zeros(IxDyn(&dims));
        for (row, &group) in groups.iter().enumerate() {
            let mut dst = out.index_axis_mut(Axis(0), group);
            dst += &a.index_axis(Axis(0), row);
        }
        Ok(Array::new(out))
    }

    fn binary(&self, op: BinaryOp, lhs: &Array, rhs: &Array) -> Result<Array, ArrayError> {
        let a = nd(op.as_str(), lhs)?;
        let b = nd(op.as_str(), rhs)?;
        let mismatch = || ArrayError::ShapeMismatch {
            op: op.as_str(),
            lhs: Shape::from(a.shape()),
            rhs: Shape::from(b.shape()),
        };
        let out_shape = Shape::from(a.shape())
            .broadcast(&Shape::from(b.shape()))
            .ok_or_else(mismatch)?;
        let av = a.broadcast(IxDyn(out_shape.dims())).ok_or_else(mismatch)?;
        let bv = b.broadcast(IxDyn(out_shape.dims())).ok_or_else(mismatch)?;
        let out = Zip::from(av).and(bv).map_collect(|&x, &y| op.apply(x, y));
        Ok(Array::new(out))
    }

    fn scalar(&self, op: BinaryOp, lhs: &Array, rhs: f64) -> Result<Array, ArrayError> {
        Ok(Array::new(nd(op.as_str(), lhs)?.mapv(|x| op.apply(x, rhs))))
    }

    fn unary(&self, op: UnaryOp, array: &Array) -> Result<Array, ArrayError> {
        Ok(Array::new(nd("unary", array)?.mapv(|x| op.apply(x))))
    }

    fn dot(&self, lhs: &Array, rhs: &Array) -> Result<Array, ArrayError> {
        let a = nd("dot", lhs)?;
        let b = nd("dot", rhs)?
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(shape_error("dot"))?;
        let c = to_matrix("dot", a)?.dot(&b.t());

        let mut dims = a.shape().to_vec();
        if let Some(last) = dims.last_mut() {
            *last = b.nrows();
        }
        let out =
            ArrayD::from_shape_vec(IxDyn(&dims), c.iter().copied().collect()).map_err(shape_error("dot"))?;
        Ok(Array::new(out))
    }

    fn lstsq(&self, a: &Array, b: &Array, rcond: Option<f64>) -> Result<Array, ArrayError> {
        let x = nd("lstsq", a)?;
        let y = nd("lstsq", b)?;
        let (m, n) = (x.shape()[0], x.shape()[1]);
        let k = y.shape()[1];
        let xs: Vec<f64> = x.iter().copied().collect();
        let ys: Vec<f64> = y.iter().copied().collect();
        let data = linalg::lstsq(&xs, m, n, &ys, k, rcond)?;
        let out = ArrayD::from_shape_vec(IxDyn(&[n, k]), data).map_err(shape_error("lstsq"))?;
        Ok(Array::new(out))
    }

    fn solve(&self, a: &Array, b: &Array) -> Result<Array, ArrayError> {
        let x = nd("solve", a)?;
        let y = nd("solve", b)?;
        let n = x.shape()[0];
        let k = y.shape()[1];
        let xs: Vec<f64> = x.iter().copied().collect();
        let ys: Vec<f64> = y.iter().copied().collect();
        let data = linalg::solve(&xs, n, &ys, k)?;
        let out = ArrayD::from_shape_vec(IxDyn(&[n, k]), data).map_err(shape_error("solve"))?;
        Ok(Array::new(out))
    }

    fn equal(&self, lhs: &Array, rhs: &Array) -> Result<bool, ArrayError> {
        Ok(nd("equal", lhs)? == nd("equal", rhs)?)
    }

    fn allclose(&self, lhs: &Array, rhs: &Array, rtol: f64, atol: f64) -> Result<bool, ArrayError> {
        let a = nd("allclose", lhs)?;
        let b = nd("allclose", rhs)?;
        Ok(a.shape() == b.shape()
            && a
                .iter()
                .zip(b.iter())
                .all(|(x, y)| (x - y).abs() <= atol + rtol * y.abs()))
    }
}
