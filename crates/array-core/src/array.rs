// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The type-erased [`Array`] handle and the [`ArrayData`] trait.

use crate::{backend_for, ArrayError, Backend, BinaryOp, Shape, UnaryOp};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A concrete array representation that can sit behind an [`Array`].
///
/// Implementors only expose their logical shape and `Any` access; every
/// numeric primitive lives in the [`Backend`] registered for the type.
pub trait ArrayData: Any + Send + Sync + fmt::Debug {
    /// Extent of every axis.
    fn shape(&self) -> &[usize];

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Name of the concrete type, used in error messages.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A shared, type-erased handle to an `f64` array of some backend.
///
/// Cloning an `Array` shares the underlying storage; use [`Array::copy`] for
/// an independent deep copy. Storage identity is observable via
/// [`Array::ptr_eq`].
///
/// Every numeric method validates its arguments and then dispatches to the
/// backend registered for the concrete array type.
#[derive(Clone)]
pub struct Array {
    data: Arc<dyn ArrayData>,
}

impl Array {
    /// Wraps a concrete array.
    pub fn new<T: ArrayData>(data: T) -> Self {
        Self {
            data: Arc::new(data),
        }
    }

    /// Returns the extent of every axis.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Returns the number of axes.
    pub fn rank(&self) -> usize {
        self.shape().len()
    }

    /// Returns the total number of elements.
    pub fn num_elements(&self) -> usize {
        self.shape().iter().product()
    }

    /// Name of the concrete array type.
    pub fn type_name(&self) -> &'static str {
        self.data.type_name()
    }

    /// Runtime type tag of the concrete array type, used to select a backend.
    pub fn data_type_id(&self) -> TypeId {
        self.data.as_any().type_id()
    }

    /// Whether both handles point at the same storage.
    pub fn ptr_eq(&self, other: &Array) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.data), Arc::as_ptr(&other.data))
    }

    /// Whether other handles share this storage.
    pub fn is_shared(&self) -> bool {
        Arc::strong_count(&self.data) > 1
    }

    /// Returns the concrete array if it has type `T`.
    pub fn downcast_ref<T: ArrayData>(&self) -> Option<&T> {
        self.data.as_any().downcast_ref::<T>()
    }

    /// Returns mutable access to the concrete array if it has type `T` and
    /// the storage is not shared with any other handle.
    pub fn get_mut<T: ArrayData>(&mut self) -> Option<&mut T> {
        Arc::get_mut(&mut self.data)?.as_any_mut().downcast_mut::<T>()
    }

    /// Looks up the backend registered for this array's concrete type.
    pub fn backend(&self) -> Result<Arc<dyn Backend>, ArrayError> {
        backend_for(self)
    }

    fn same_backend(&self, op: &'static str, other: &Array) -> Result<(), ArrayError> {
        if self.data_type_id() != other.data_type_id() {
            return Err(ArrayError::UnsupportedBackend {
                op,
                origin: format!("{} mixed with {}", self.type_name(), other.type_name()),
            });
        }
        Ok(())
    }

    fn check_axis(&self, op: &'static str, axis: usize) -> Result<(), ArrayError> {
        if axis >= self.rank() {
            return Err(ArrayError::InvalidArgument {
                op,
                detail: format!("axis {axis} is out of range for rank {}", self.rank()),
            });
        }
        Ok(())
    }

    fn require_rank(&self, op: &'static str, rank: usize) -> Result<(), ArrayError> {
        if self.rank() != rank {
            return Err(ArrayError::InvalidArgument {
                op,
                detail: format!("expected a rank-{rank} array, got shape {:?}", self.shape()),
            });
        }
        Ok(())
    }

    fn shape_mismatch(op: &'static str, lhs: &[usize], rhs: &[usize]) -> ArrayError {
        ArrayError::ShapeMismatch {
            op,
            lhs: Shape::from(lhs),
            rhs: Shape::from(rhs),
        }
    }

    // ── Storage ──────────────────────────────────────────────────

    /// Deep copy into new storage.
    pub fn copy(&self) -> Result<Array, ArrayError> {
        self.backend()?.copy(self)
    }

    /// Returns the elements in logical row-major order.
    pub fn to_vec(&self) -> Result<Vec<f64>, ArrayError> {
        self.backend()?.to_vec(self)
    }

    pub fn is_contiguous(&self) -> Result<bool, ArrayError> {
        self.backend()?.is_contiguous(self)
    }

    /// Returns a contiguous array, sharing storage when already contiguous.
    pub fn make_contiguous(&self) -> Result<Array, ArrayError> {
        let backend = self.backend()?;
        if backend.is_contiguous(self)? {
            return Ok(self.clone());
        }
        backend.make_contiguous(self)
    }

    // ── Creation ─────────────────────────────────────────────────

    /// Creates an array of the same backend filled with `value`.
    pub fn full_like(&self, shape: &[usize], value: f64) -> Result<Array, ArrayError> {
        self.backend()?.full(self, shape, value)
    }

    pub fn zeros_like(&self, shape: &[usize]) -> Result<Array, ArrayError> {
        self.full_like(shape, 0.0)
    }

    pub fn ones_like(&self, shape: &[usize]) -> Result<Array, ArrayError> {
        self.full_like(shape, 1.0)
    }

    /// Creates an array of the same backend from row-major values.
    pub fn from_vec_like(&self, shape: &[usize], data: Vec<f64>) -> Result<Array, ArrayError> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(ArrayError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        self.backend()?.from_vec(self, shape, data)
    }

    /// Creates an array of the same backend with values drawn from `U[0, 1)`.
    pub fn uniform_random_like(&self, shape: &[usize]) -> Result<Array, ArrayError> {
        self.backend()?.uniform_random(self, shape)
    }

    // ── Shape manipulation ───────────────────────────────────────

    pub fn reshape(&self, shape: &[usize]) -> Result<Array, ArrayError> {
        if shape.iter().product::<usize>() != self.num_elements() {
            return Err(Self::shape_mismatch("reshape", self.shape(), shape));
        }
        self.backend()?.reshape(self, shape)
    }

    /// Transposes a 2-D array.
    pub fn transpose(&self) -> Result<Array, ArrayError> {
        self.require_rank("transpose", 2)?;
        self.backend()?.transpose(self)
    }

    /// Gathers `indices` along `axis`; indices may repeat.
    pub fn select(&self, axis: usize, indices: &[usize]) -> Result<Array, ArrayError> {
        self.check_axis("select", axis)?;
        let extent = self.shape()[axis];
        if let Some(&bad) = indices.iter().find(|&&i| i >= extent) {
            return Err(ArrayError::InvalidArgument {
                op: "select",
                detail: format!("index {bad} is out of range for axis {axis} of extent {extent}"),
            });
        }
        self.backend()?.select(self, axis, indices)
    }

    /// Concatenates arrays of the same backend along `axis`.
    pub fn concatenate(arrays: &[&Array], axis: usize) -> Result<Array, ArrayError> {
        let first = arrays.first().ok_or(ArrayError::InvalidArgument {
            op: "concatenate",
            detail: "no arrays to concatenate".to_string(),
        })?;
        first.check_axis("concatenate", axis)?;
        for other in &arrays[1..] {
            first.same_backend("concatenate", other)?;
            let compatible = other.rank() == first.rank()
                && first
                    .shape()
                    .iter()
                    .zip(other.shape())
                    .enumerate()
                    .all(|(i, (a, b))| i == axis || a == b);
            if !compatible {
                return Err(Self::shape_mismatch(
                    "concatenate",
                    first.shape(),
                    other.shape(),
                ));
            }
        }
        first.backend()?.concatenate(arrays, axis)
    }

    /// Concatenates along the first axis.
    pub fn vstack(arrays: &[&Array]) -> Result<Array, ArrayError> {
        Self::concatenate(arrays, 0)
    }

    /// Sums rows into `n_groups` output rows, row `i` going to `groups[i]`.
    pub fn index_add(&self, groups: &[usize], n_groups: usize) -> Result<Array, ArrayError> {
        self.check_axis("index_add", 0)?;
        if groups.len() != self.shape()[0] {
            return Err(ArrayError::InvalidArgument {
                op: "index_add",
                detail: format!(
                    "{} group indices for {} rows",
                    groups.len(),
                    self.shape()[0]
                ),
            });
        }
        if let Some(&bad) = groups.iter().find(|&&g| g >= n_groups) {
            return Err(ArrayError::InvalidArgument {
                op: "index_add",
                detail: format!("group {bad} is out of range for {n_groups} groups"),
            });
        }
        self.backend()?.index_add(self, groups, n_groups)
    }

    // ── Arithmetic ───────────────────────────────────────────────

    /// Element-wise binary operation with trailing-axis broadcasting.
    pub fn binary(&self, op: BinaryOp, rhs: &Array) -> Result<Array, ArrayError> {
        self.same_backend(op.as_str(), rhs)?;
        if Shape::from(self.shape())
            .broadcast(&Shape::from(rhs.shape()))
            .is_none()
        {
            return Err(Self::shape_mismatch(op.as_str(), self.shape(), rhs.shape()));
        }
        self.backend()?.binary(op, self, rhs)
    }

    pub fn scalar(&self, op: BinaryOp, rhs: f64) -> Result<Array, ArrayError> {
        self.backend()?.scalar(op, self, rhs)
    }

    pub fn unary(&self, op: UnaryOp) -> Result<Array, ArrayError> {
        self.backend()?.unary(op, self)
    }

    /// Contracts the last axis of `self` with the last axis of the 2-D `rhs`.
    ///
    /// A `[.., k]` array dotted with a `[n, k]` array gives `[.., n]`.
    pub fn dot(&self, rhs: &Array) -> Result<Array, ArrayError> {
        self.same_backend("dot", rhs)?;
        rhs.require_rank("dot", 2)?;
        if self.rank() == 0 || self.shape()[self.rank() - 1] != rhs.shape()[1] {
            return Err(Self::shape_mismatch("dot", self.shape(), rhs.shape()));
        }
        self.backend()?.dot(self, rhs)
    }

    // ── Linear algebra ───────────────────────────────────────────

    /// Least-squares solution `x` of `self @ x = b`.
    pub fn lstsq(&self, b: &Array, rcond: Option<f64>) -> Result<Array, ArrayError> {
        self.same_backend("lstsq", b)?;
        self.require_rank("lstsq", 2)?;
        b.require_rank("lstsq", 2)?;
        if self.shape()[0] != b.shape()[0] {
            return Err(Self::shape_mismatch("lstsq", self.shape(), b.shape()));
        }
        self.backend()?.lstsq(self, b, rcond)
    }

    /// Exact solution `x` of `self @ x = b` for a square `self`.
    pub fn solve(&self, b: &Array) -> Result<Array, ArrayError> {
        self.same_backend("solve", b)?;
        self.require_rank("solve", 2)?;
        b.require_rank("solve", 2)?;
        let shape = self.shape();
        if shape[0] != shape[1] || shape[0] != b.shape()[0] {
            return Err(Self::shape_mismatch("solve", shape, b.shape()));
        }
        self.backend()?.solve(self, b)
    }

    // ── Comparison ───────────────────────────────────────────────

    /// Exact equality of shape and values.
    pub fn equal(&self, other: &Array) -> Result<bool, ArrayError> {
        self.same_backend("equal", other)?;
        if self.shape() != other.shape() {
            return Ok(false);
        }
        self.backend()?.equal(self, other)
    }

    /// Equality of shape, with values within `atol + rtol * |other|`.
    pub fn allclose(&self, other: &Array, rtol: f64, atol: f64) -> Result<bool, ArrayError> {
        self.same_backend("allclose", other)?;
        if self.shape() != other.shape() {
            return Ok(false);
        }
        self.backend()?.allclose(self, other, rtol, atol)
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.data.fmt(f)
    }
}

impl<T: ArrayData> From<T> for Array {
    fn from(data: T) -> Self {
        Self::new(data)
    }
}
