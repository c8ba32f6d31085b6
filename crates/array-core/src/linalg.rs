// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Dense linear solvers shared by the built-in backends.
//!
//! Matrices are exchanged as row-major slices and handed to `nalgebra` for
//! the factorisations.

use crate::ArrayError;
use nalgebra::DMatrix;

/// Least-squares solution of `a @ x = b` with `a: [m, n]` and `b: [m, k]`,
/// returned as a row-major `[n, k]` buffer.
///
/// Singular values below `rcond * max(singular values)` are treated as zero.
/// `None` uses `f64::EPSILON * max(m, n)`; a negative `rcond` means machine
/// precision.
pub(crate) fn lstsq(
    a: &[f64],
    m: usize,
    n: usize,
    b: &[f64],
    k: usize,
    rcond: Option<f64>,
) -> Result<Vec<f64>, ArrayError> {
    if m == 0 || n == 0 || k == 0 {
        return Ok(vec![0.0; n * k]);
    }

    let a = DMatrix::from_row_slice(m, n, a);
    let b = DMatrix::from_row_slice(m, k, b);

    let rcond = match rcond {
        None => f64::EPSILON * m.max(n) as f64,
        Some(r) if r < 0.0 => f64::EPSILON,
        Some(r) => r,
    };

    let svd = a.svd(true, true);
    let cutoff = rcond * svd.singular_values.max();
    let x = svd.solve(&b, cutoff).map_err(|detail| ArrayError::Numeric {
        op: "lstsq",
        detail: detail.to_string(),
    })?;

    Ok(row_major(&x))
}

/// Exact solution of `a @ x = b` with a square `a: [n, n]` and `b: [n, k]`.
pub(crate) fn solve(a: &[f64], n: usize, b: &[f64], k: usize) -> Result<Vec<f64>, ArrayError> {
    if n == 0 || k == 0 {
        return Ok(vec![0.0; n * k]);
    }

    let a = DMatrix::from_row_slice(n, n, a);
    let b = DMatrix::from_row_slice(n, k, b);
    let x = a.lu().solve(&b).ok_or_else(|| ArrayError::Numeric {
        op: "solve",
        detail: "matrix is singular".to_string(),
    })?;

    Ok(row_major(&x))
}

fn row_major(x: &DMatrix<f64>) -> Vec<f64> {
    x.transpose().as_slice().to_vec()
}
