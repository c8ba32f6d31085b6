// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`Backend`] capability trait.
//!
//! A backend supplies every numeric primitive the operations layer needs for
//! one concrete array type. Callers never talk to a backend directly: they go
//! through the dispatching methods on [`Array`], which validate arguments
//! (axes, index bounds, shape compatibility) before a backend sees them.
//! Backends may therefore assume well-formed input, and only have to reject
//! operands that belong to another backend.

use crate::{Array, ArrayError};

/// Element-wise binary operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    /// Applies the operation to two scalars.
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Pow => a.powf(b),
        }
    }

    /// Returns a human-readable label for this operation.
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Pow => "pow",
        }
    }
}

/// Element-wise unary operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Abs,
    Neg,
    Sign,
    Sqrt,
    Square,
    /// `1 / x`, with zero mapped to zero.
    InverseOrZero,
}

impl UnaryOp {
    /// Applies the operation to a scalar.
    pub fn apply(self, x: f64) -> f64 {
        match self {
            UnaryOp::Abs => x.abs(),
            UnaryOp::Neg => -x,
            UnaryOp::Sign => {
                if x > 0.0 {
                    1.0
                } else if x < 0.0 {
                    -1.0
                } else {
                    0.0
                }
            }
            UnaryOp::Sqrt => x.sqrt(),
            UnaryOp::Square => x * x,
            UnaryOp::InverseOrZero => {
                if x == 0.0 {
                    0.0
                } else {
                    1.0 / x
                }
            }
        }
    }
}

/// Numeric primitives for one concrete array type.
///
/// Implementations are registered with [`crate::register_backend`] and looked
/// up by the array's runtime type. Each method receives [`Array`] handles and
/// must downcast them to its own array type; an operand of any other type is
/// reported as [`ArrayError::UnsupportedBackend`].
///
/// All arrays are `f64`, and "row-major" always refers to the logical element
/// order, whatever the physical layout is.
pub trait Backend: Send + Sync {
    /// Human-readable name of this backend.
    fn name(&self) -> &str;

    /// Deep copy into new, independently owned storage.
    fn copy(&self, array: &Array) -> Result<Array, ArrayError>;

    /// Returns the elements in logical row-major order.
    fn to_vec(&self, array: &Array) -> Result<Vec<f64>, ArrayError>;

    /// Whether the storage is in standard row-major contiguous layout.
    fn is_contiguous(&self, array: &Array) -> Result<bool, ArrayError>;

    /// Returns a contiguous copy with the same logical content.
    fn make_contiguous(&self, array: &Array) -> Result<Array, ArrayError>;

    /// Creates an array of the same backend with every element set to `value`.
    fn full(&self, like: &Array, shape: &[usize], value: f64) -> Result<Array, ArrayError>;

    /// Creates an array of the same backend from row-major values.
    fn from_vec(&self, like: &Array, shape: &[usize], data: Vec<f64>)
        -> Result<Array, ArrayError>;

    /// Creates an array of the same backend filled with samples of `U[0, 1)`.
    fn uniform_random(&self, like: &Array, shape: &[usize]) -> Result<Array, ArrayError>;

    /// Reinterprets the row-major content with a new shape.
    fn reshape(&self, array: &Array, shape: &[usize]) -> Result<Array, ArrayError>;

    /// Transposes a 2-D array.
    fn transpose(&self, array: &Array) -> Result<Array, ArrayError>;

    /// Gathers `indices` (possibly repeated) along `axis`.
    fn select(&self, array: &Array, axis: usize, indices: &[usize])
        -> Result<Array, ArrayError>;

    /// Concatenates arrays along `axis`.
    fn concatenate(&self, arrays: &[&Array], axis: usize) -> Result<Array, ArrayError>;

    /// Sums rows (axis 0) into `n_groups` output rows; row `i` goes to `groups[i]`.
    fn index_add(
        &self,
        array: &Array,
        groups: &[usize],
        n_groups: usize,
    ) -> Result<Array, ArrayError>;

    /// Element-wise binary operation with trailing-axis broadcasting.
    fn binary(&self, op: BinaryOp, lhs: &Array, rhs: &Array) -> Result<Array, ArrayError>;

    /// Element-wise operation against a scalar right operand.
    fn scalar(&self, op: BinaryOp, lhs: &Array, rhs: f64) -> Result<Array, ArrayError>;

    /// Element-wise unary operation.
    fn unary(&self, op: UnaryOp, array: &Array) -> Result<Array, ArrayError>;

    /// Contracts the last axis of `lhs` with the last axis of the 2-D `rhs`,
    /// i.e. `lhs @ rhs.T` with all leading axes of `lhs` preserved.
    fn dot(&self, lhs: &Array, rhs: &Array) -> Result<Array, ArrayError>;

    /// Least-squares solution `x` of `a @ x = b` for 2-D `a` and `b`.
    fn lstsq(&self, a: &Array, b: &Array, rcond: Option<f64>) -> Result<Array, ArrayError>;

    /// Exact solution `x` of `a @ x = b` for a square 2-D `a`.
    fn solve(&self, a: &Array, b: &Array) -> Result<Array, ArrayError>;

    /// Exact element-wise equality (shapes must match).
    fn equal(&self, lhs: &Array, rhs: &Array) -> Result<bool, ArrayError>;

    /// Element-wise `|lhs - rhs| <= atol + rtol * |rhs|` (shapes must match).
    fn allclose(&self, lhs: &Array, rhs: &Array, rtol: f64, atol: f64)
        -> Result<bool, ArrayError>;
}
