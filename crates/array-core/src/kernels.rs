// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Portable kernels over flat row-major `f64` buffers.
//!
//! These back the [`DenseBackend`](crate::DenseBackend). Callers are
//! responsible for validating shapes; the kernels index without checks
//! beyond Rust's own bounds checking.

use crate::{BinaryOp, Shape};

/// Element-wise `op` with trailing-axis broadcasting into `out_shape`.
pub(crate) fn broadcast_binary(
    op: BinaryOp,
    a: &[f64],
    a_shape: &Shape,
    b: &[f64],
    b_shape: &Shape,
    out_shape: &Shape,
) -> Vec<f64> {
    if a_shape == b_shape {
        return a.iter().zip(b).map(|(&x, &y)| op.apply(x, y)).collect();
    }

    let rank = out_shape.rank();
    let a_strides = broadcast_strides(a_shape, rank);
    let b_strides = broadcast_strides(b_shape, rank);
    let out_dims = out_shape.dims();

    let mut out = Vec::with_capacity(out_shape.num_elements());
    let mut index = vec![0usize; rank];
    for _ in 0..out_shape.num_elements() {
        let ia: usize = index.iter().zip(&a_strides).map(|(i, s)| i * s).sum();
        let ib: usize = index.iter().zip(&b_strides).map(|(i, s)| i * s).sum();
        out.push(op.apply(a[ia], b[ib]));

        // Odometer increment, last axis fastest.
        for axis in (0..rank).rev() {
            index[axis] += 1;
            if index[axis] < out_dims[axis] {
                break;
            }
            index[axis] = 0;
        }
    }
    out
}

/// Strides of `shape` aligned to the right of a rank-`rank` output, with
/// zero stride on broadcast axes.
fn broadcast_strides(shape: &Shape, rank: usize) -> Vec<usize> {
    let dims = shape.dims();
    let own = shape.strides();
    let offset = rank - dims.len();
    (0..rank)
        .map(|axis| {
            if axis < offset || dims[axis - offset] == 1 {
                0
            } else {
                own[axis - offset]
            }
        })
        .collect()
}

/// Splits `dims` around `axis` into `(outer, extent, inner)` element counts.
fn split_at_axis(dims: &[usize], axis: usize) -> (usize, usize, usize) {
    let outer = dims[..axis].iter().product();
    let inner = dims[axis + 1..].iter().product();
    (outer, dims[axis], inner)
}

/// Gathers `indices` along `axis`.
pub(crate) fn select(data: &[f64], dims: &[usize], axis: usize, indices: &[usize]) -> Vec<f64> {
    let (outer, extent, inner) = split_at_axis(dims, axis);
    let mut out = Vec::with_capacity(outer * indices.len() * inner);
    for o in 0..outer {
        for &i in indices {
            let start = (o * extent + i) * inner;
            out.extend_from_slice(&data[start..start + inner]);
        }
    }
    out
}

/// Concatenates buffers along `axis`; all shapes agree except on `axis`.
pub(crate) fn concatenate(parts: &[(&[f64], &[usize])], axis: usize) -> (Vec<f64>, Vec<usize>) {
    let mut out_dims = parts[0].1.to_vec();
    out_dims[axis] = parts.iter().map(|(_, dims)| dims[axis]).sum();

    let (outer, _, _) = split_at_axis(&out_dims, axis);
    let mut out = Vec::with_capacity(out_dims.iter().product());
    for o in 0..outer {
        for (data, dims) in parts {
            let (_, extent, inner) = split_at_axis(dims, axis);
            let chunk = extent * inner;
            out.extend_from_slice(&data[o * chunk..(o + 1) * chunk]);
        }
    }
    (out, out_dims)
}

/// Sums each row of length `row_len` into `out[groups[row]]`.
pub(crate) fn index_add(data: &[f64], row_len: usize, groups: &[usize], n_groups: usize) -> Vec<f64> {
    let mut out = vec![0.0; n_groups * row_len];
    for (row, &group) in groups.iter().enumerate() {
        let src = &data[row * row_len..(row + 1) * row_len];
        let dst = &mut out[group * row_len..(group + 1) * row_len];
        for (d, s) in dst.iter_mut().zip(src) {
            *d += s;
        }
    }
    out
}

/// `a @ b.T` for row-major `a: [m, k]` and `b: [n, k]`.
///
/// Both operands are walked along contiguous rows, so no transposed copy of
/// `b` is needed.
pub(crate) fn matmul_nt(a: &[f64], b: &[f64], m: usize, k: usize, n: usize) -> Vec<f64> {
    let mut c = vec![0.0; m * n];
    for i in 0..m {
        let a_row = &a[i * k..(i + 1) * k];
        let c_row = &mut c[i * n..(i + 1) * n];
        for (j, c_ij) in c_row.iter_mut().enumerate() {
            let b_row = &b[j * k..(j + 1) * k];
            *c_ij = a_row.iter().zip(b_row).map(|(x, y)| x * y).sum();
        }
    }
    c
}

/// Transposes a row-major `[rows, cols]` matrix.
pub(crate) fn transpose(data: &[f64], rows: usize, cols: usize) -> Vec<f64> {
    let mut out = vec![0.0; rows * cols];
    for i in 0..rows {
        for j in 0..cols {
            out[j * rows + i] = data[i * cols + j];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_row() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [10.0, 20.0, 30.0];
        let out = broadcast_binary(
            BinaryOp::Add,
            &a,
            &Shape::matrix(2, 3),
            &b,
            &Shape::vector(3),
            &Shape::matrix(2, 3),
        );
        assert_eq!(out, vec![11.0, 22.0, 33.0, 14.0, 25.0, 36.0]);
    }

    #[test]
    fn test_broadcast_column() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [2.0, 3.0];
        let out = broadcast_binary(
            BinaryOp::Mul,
            &a,
            &Shape::matrix(2, 2),
            &b,
            &Shape::matrix(2, 1),
            &Shape::matrix(2, 2),
        );
        assert_eq!(out, vec![2.0, 4.0, 9.0, 12.0]);
    }

    #[test]
    fn test_select_middle_axis() {
        // shape [2, 3, 1]
        let data = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let out = select(&data, &[2, 3, 1], 1, &[2, 0]);
        assert_eq!(out, vec![2.0, 0.0, 5.0, 3.0]);
    }

    #[test]
    fn test_concatenate_last_axis() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [5.0, 6.0];
        let (out, dims) = concatenate(&[(&a, &[2, 2]), (&b, &[2, 1])], 1);
        assert_eq!(dims, vec![2, 3]);
        assert_eq!(out, vec![1.0, 2.0, 5.0, 3.0, 4.0, 6.0]);
    }

    #[test]
    fn test_index_add() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let out = index_add(&data, 2, &[1, 0, 1], 2);
        assert_eq!(out, vec![3.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_matmul_nt() {
        // a = [[1, 2], [3, 4]], b = [[1, 0], [0, 1], [1, 1]]
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [1.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let c = matmul_nt(&a, &b, 2, 2, 3);
        assert_eq!(c, vec![1.0, 2.0, 3.0, 3.0, 4.0, 7.0]);
    }

    #[test]
    fn test_transpose() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(
            transpose(&data, 2, 3),
            vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]
        );
    }
}
