// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Linear systems `X w = Y` solved block by block.
//!
//! Values are flattened to `[rows, properties]` matrices, samples and
//! components together forming the rows. Gradient rows are stacked below
//! the value rows so that the fit also matches the gradients.

use super::{paired_blocks, require_identical, require_identical_components, require_same_gradients};
use crate::warning::{emit, Warning};
use crate::OpsError;
use array_core::Array;
use tensor_map::{Block, TensorMap};
use tracing::debug;

/// Reshapes to `[-1, last]`.
fn flatten(values: &Array) -> Result<Array, OpsError> {
    let last = values.shape()[values.rank() - 1];
    let rows = if last == 0 { 0 } else { values.num_elements() / last };
    Ok(values.reshape(&[rows, last])?)
}

fn validate(op: &'static str, x: &Block, y: &Block) -> Result<(), OpsError> {
    require_identical(op, "samples", x.samples(), y.samples())?;
    require_identical_components(op, "components", x.components(), y.components())?;
    // Gradients of `y` only matter when `x` has some to pair them with.
    if x.gradients().len() > 0 {
        require_same_gradients(op, x, y)?;
    }
    for (parameter, gx) in x.gradients() {
        let gy = y.gradient(parameter)?;
        require_identical(op, "gradient samples", gx.samples(), gy.samples())?;
        require_identical_components(op, "gradient components", gx.components(), gy.components())?;
    }
    Ok(())
}

fn stack(parts: &[Array]) -> Result<Array, OpsError> {
    Ok(Array::vstack(&parts.iter().collect::<Vec<_>>())?)
}

/// Flattened `(X, Y)` system with gradient rows stacked in the gradient
/// order of `x`.
fn system(x: &Block, y: &Block) -> Result<(Array, Array), OpsError> {
    let mut xs = vec![flatten(x.values())?];
    let mut ys = vec![flatten(y.values())?];
    for (parameter, gx) in x.gradients() {
        xs.push(flatten(gx.values())?);
        ys.push(flatten(y.gradient(parameter)?.values())?);
    }
    Ok((stack(&xs)?, stack(&ys)?))
}

/// The weights block: `wᵀ` with samples from the properties of `y` and
/// properties from the properties of `x`.
fn weights_block(w: Array, x: &Block, y: &Block) -> Result<Block, OpsError> {
    Ok(Block::new(
        w.transpose()?.make_contiguous()?,
        y.properties().clone(),
        vec![],
        x.properties().clone(),
    )?)
}

/// Least-squares solution of `X w = Y` for every pair of blocks.
///
/// `rcond` is the relative cutoff for small singular values. Leaving it
/// unset emits [`Warning::DefaultRcond`].
///
/// # Errors
/// - [`OpsError::KeyMismatch`] if the keys differ.
/// - [`OpsError::SchemaMismatch`] if samples, components or gradients of
///   paired blocks do not match. Gradients of `y` are ignored when the
///   matching block of `x` has none.
pub fn lstsq(x: &TensorMap, y: &TensorMap, rcond: Option<f64>) -> Result<TensorMap, OpsError> {
    let pairs = paired_blocks("lstsq", x, y)?;
    for (bx, by) in &pairs {
        validate("lstsq", bx, by)?;
    }
    if rcond.is_none() {
        emit(Warning::DefaultRcond);
    }

    let blocks = pairs
        .into_iter()
        .map(|(bx, by)| {
            let (a, b) = system(bx, by)?;
            weights_block(a.lstsq(&b, rcond)?, bx, by)
        })
        .collect::<Result<Vec<_>, OpsError>>()?;
    debug!(blocks = blocks.len(), ?rcond, "solved least-squares systems");
    Ok(TensorMap::new(x.keys().clone(), blocks)?)
}

/// Exact solution of `X w = Y` for every pair of blocks.
///
/// # Errors
/// Same as [`lstsq`], plus [`OpsError::InvalidArgument`] if a block of `x` has
/// gradients or the flattened `X` is not square. A singular system fails
/// with a numeric [`OpsError::Array`] error.
pub fn solve(x: &TensorMap, y: &TensorMap) -> Result<TensorMap, OpsError> {
    let pairs = paired_blocks("solve", x, y)?;
    for (bx, by) in &pairs {
        validate("solve", bx, by)?;
        if bx.gradients().len() > 0 {
            return Err(OpsError::invalid("solve", "blocks must not have gradients"));
        }
        let rows = bx.values().num_elements() / bx.properties().len().max(1);
        if rows != bx.properties().len() {
            return Err(OpsError::invalid(
                "solve",
                format!(
                    "the flattened system has {rows} rows for {} properties, it must be square",
                    bx.properties().len()
                ),
            ));
        }
    }

    let blocks = pairs
        .into_iter()
        .map(|(bx, by)| {
            let (a, b) = system(bx, by)?;
            weights_block(a.solve(&b)?, bx, by)
        })
        .collect::<Result<Vec<_>, OpsError>>()?;
    debug!(blocks = blocks.len(), "solved linear systems");
    Ok(TensorMap::new(x.keys().clone(), blocks)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use array_core::ndarray::{arr2, Array2};
    use tensor_map::Labels;

    /// One-block tensor map whose block carries a gradient per
    /// `(parameter, values)` pair, all referencing sample 0.
    fn with_gradients(
        values: Array2<f64>,
        property: &str,
        gradients: Vec<(&str, Array2<f64>)>,
    ) -> TensorMap {
        let (rows, cols) = values.dim();
        let properties = Labels::range(property, cols).unwrap();
        let mut builder = Block::builder(
            values.into_dyn(),
            Labels::range("s", rows).unwrap(),
            vec![],
            properties.clone(),
        )
        .unwrap();
        for (parameter, gradient) in gradients {
            let n = gradient.nrows() as i32;
            let gradient = Block::new(
                gradient.into_dyn(),
                Labels::from_rows(["sample", "direction"], (0..n).map(|i| vec![0, i]).collect())
                    .unwrap(),
                vec![],
                properties.clone(),
            )
            .unwrap();
            builder.add_gradient(parameter, gradient).unwrap();
        }
        TensorMap::new(Labels::new(["k"], vec![0]).unwrap(), vec![builder.build()]).unwrap()
    }

    fn tensor(values: Array2<f64>, property: &str) -> TensorMap {
        let (rows, cols) = values.dim();
        let block = Block::new(
            values.into_dyn(),
            Labels::range("s", rows).unwrap(),
            vec![],
            Labels::range(property, cols).unwrap(),
        )
        .unwrap();
        TensorMap::new(Labels::new(["k"], vec![0]).unwrap(), vec![block]).unwrap()
    }

    #[test]
    fn test_solve_square() {
        let x = tensor(arr2(&[[2.0, 0.0], [0.0, 4.0]]), "p");
        let y = tensor(arr2(&[[2.0], [8.0]]), "target");
        let w = solve(&x, &y).unwrap();
        let block = w.block(&[0]).unwrap();
        assert_eq!(block.samples().names(), &["target"]);
        assert_eq!(block.properties().names(), &["p"]);
        let values = block.values().to_vec().unwrap();
        assert_abs_diff_eq!(values[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(values[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_rejects_rectangular() {
        let x = tensor(arr2(&[[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]), "p");
        let y = tensor(arr2(&[[1.0], [1.0], [2.0]]), "target");
        assert!(matches!(solve(&x, &y), Err(OpsError::InvalidArgument { .. })));
    }

    #[test]
    fn test_lstsq_overdetermined() {
        // y = 3 x0 - x1, exactly.
        let x = tensor(arr2(&[[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, 1.0]]), "p");
        let y = tensor(arr2(&[[3.0], [-1.0], [2.0], [5.0]]), "target");
        let w = lstsq(&x, &y, Some(1e-12)).unwrap();
        let values = w.block(&[0]).unwrap().values().to_vec().unwrap();
        assert_abs_diff_eq!(values[0], 3.0, epsilon = 1e-10);
        assert_abs_diff_eq!(values[1], -1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_lstsq_sample_mismatch() {
        let x = tensor(arr2(&[[1.0], [2.0]]), "p");
        let y = tensor(arr2(&[[1.0], [2.0], [3.0]]), "target");
        assert!(matches!(
            lstsq(&x, &y, Some(1e-12)),
            Err(OpsError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_lstsq_ignores_target_gradients_without_input_gradients() {
        let x = tensor(arr2(&[[1.0, 0.0], [0.0, 1.0]]), "p");
        let y = with_gradients(arr2(&[[2.0], [3.0]]), "target", vec![("g", arr2(&[[7.0]]))]);
        let w = lstsq(&x, &y, Some(1e-12)).unwrap();
        let block = w.block(&[0]).unwrap();
        assert!(block.gradient_names().is_empty());
        let values = block.values().to_vec().unwrap();
        assert_abs_diff_eq!(values[0], 2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(values[1], 3.0, epsilon = 1e-10);
    }

    // ── Gradients ──────────────────────────────────────────────

    #[test]
    fn test_lstsq_gradient_rows_pin_down_weights() {
        // The value row alone only fixes w0 + w1 = 5; the gradient row fixes w0 = 2.
        let x = with_gradients(arr2(&[[1.0, 1.0]]), "p", vec![("g", arr2(&[[1.0, 0.0]]))]);
        let y = with_gradients(arr2(&[[5.0]]), "target", vec![("g", arr2(&[[2.0]]))]);
        let w = lstsq(&x, &y, Some(1e-12)).unwrap();
        let values = w.block(&[0]).unwrap().values().to_vec().unwrap();
        assert_abs_diff_eq!(values[0], 2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(values[1], 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_lstsq_gradient_name_mismatch() {
        let x = with_gradients(arr2(&[[1.0, 1.0]]), "p", vec![("g", arr2(&[[1.0, 0.0]]))]);
        let y = with_gradients(arr2(&[[5.0]]), "target", vec![("h", arr2(&[[2.0]]))]);
        assert!(matches!(
            lstsq(&x, &y, Some(1e-12)),
            Err(OpsError::SchemaMismatch { .. })
        ));

        let bare = tensor(arr2(&[[5.0]]), "target");
        assert!(matches!(
            lstsq(&x, &bare, Some(1e-12)),
            Err(OpsError::SchemaMismatch { .. })
        ));
    }
}
