// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Operations over tensor maps and blocks.
//!
//! Every operation validates its operands before dispatching any numeric
//! work, and returns a new tensor map or block.

mod arithmetic;
mod contiguous;
mod dot;
mod drop_blocks;
mod equal;
mod join;
mod like;
mod metadata;
mod reduce;
mod slice;
mod solve;
mod unique;

pub use arithmetic::{abs, add, divide, multiply, pow, subtract, Operand};
pub use contiguous::{is_contiguous, is_contiguous_block, make_contiguous, make_contiguous_block};
pub use dot::dot;
pub use drop_blocks::drop_blocks;
pub use equal::{
    allclose, allclose_block, allclose_block_raise, allclose_raise, equal, equal_block,
    equal_block_raise, equal_raise,
};
pub use join::join;
pub use like::{
    block_from_array, ones_like, ones_like_block, random_uniform_like, random_uniform_like_block,
    remove_gradients, remove_gradients_block, zeros_like, zeros_like_block,
};
pub use metadata::{
    equal_metadata, equal_metadata_block, equal_metadata_block_raise, equal_metadata_raise,
    MetadataCheck, MetadataReport, Mismatch, MismatchKind,
};
pub use reduce::{
    mean_over_samples, mean_over_samples_block, std_over_samples, std_over_samples_block,
    sum_over_samples, sum_over_samples_block, var_over_samples, var_over_samples_block,
};
pub use slice::{slice, slice_block, slice_warning};
pub use solve::{lstsq, solve};
pub use unique::{unique_metadata, unique_metadata_block};

use crate::{checks_enabled, OpsError};
use array_core::Array;
use tensor_map::{Block, Labels, TensorMap, GRADIENT_SAMPLE};

/// The block axes that carry a single label set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Samples,
    Properties,
}

impl Axis {
    pub(crate) fn labels(self, block: &Block) -> &Labels {
        match self {
            Axis::Samples => block.samples(),
            Axis::Properties => block.properties(),
        }
    }
}

/// Fails with `KeyMismatch` unless both maps have the same key names and
/// the same set of keys.
pub(crate) fn check_same_keys(
    op: &'static str,
    first: &TensorMap,
    second: &TensorMap,
) -> Result<(), OpsError> {
    if first.keys().names() != second.keys().names() {
        return Err(OpsError::KeyMismatch {
            op,
            detail: format!(
                "key names differ: {:?} vs {:?}",
                first.keys().names(),
                second.keys().names()
            ),
        });
    }
    if !first.keys().is_same_set(second.keys()) {
        return Err(OpsError::KeyMismatch {
            op,
            detail: "the two tensor maps have different keys".into(),
        });
    }
    Ok(())
}

/// Pairs every block of `first` with the block of `second` under the same key.
pub(crate) fn paired_blocks<'a>(
    op: &'static str,
    first: &'a TensorMap,
    second: &'a TensorMap,
) -> Result<Vec<(&'a Block, &'a Block)>, OpsError> {
    check_same_keys(op, first, second)?;
    first
        .iter()
        .map(|(key, block)| Ok((block, second.block(key)?)))
        .collect()
}

/// Order-sensitive label comparison, skipped when checks are disabled.
pub(crate) fn require_identical(
    op: &'static str,
    what: &str,
    first: &Labels,
    second: &Labels,
) -> Result<(), OpsError> {
    if checks_enabled() && !first.is_identical(second) {
        return Err(OpsError::schema(
            op,
            format!("{what} must be identical and in the same order"),
        ));
    }
    Ok(())
}

/// Same as [`require_identical`] for a list of component label sets.
pub(crate) fn require_identical_components(
    op: &'static str,
    what: &str,
    first: &[Labels],
    second: &[Labels],
) -> Result<(), OpsError> {
    if !checks_enabled() {
        return Ok(());
    }
    if first.len() != second.len() {
        return Err(OpsError::schema(
            op,
            format!("{what} have {} and {} component axes", first.len(), second.len()),
        ));
    }
    for (a, b) in first.iter().zip(second) {
        require_identical(op, what, a, b)?;
    }
    Ok(())
}

/// Gradient names of two blocks must be the same set.
pub(crate) fn require_same_gradients(
    op: &'static str,
    first: &Block,
    second: &Block,
) -> Result<(), OpsError> {
    let mut a = first.gradient_names();
    let mut b = second.gradient_names();
    a.sort_unstable();
    b.sort_unstable();
    if a != b {
        return Err(OpsError::schema(
            op,
            format!("blocks have different gradients: {a:?} vs {b:?}"),
        ));
    }
    Ok(())
}

/// Parent sample row referenced by every row of a gradient.
pub(crate) fn gradient_parents(gradient: &Block) -> Result<Vec<usize>, OpsError> {
    Ok(gradient
        .samples()
        .column(GRADIENT_SAMPLE)?
        .into_iter()
        .map(|s| s as usize)
        .collect())
}

/// Gathers `rows` of `values` and inserts unit axes after the first one so
/// that the result broadcasts against an array of rank `rank` whose
/// leading gradient components `values` does not have.
pub(crate) fn gather_rows(values: &Array, rows: &[usize], rank: usize) -> Result<Array, OpsError> {
    let gathered = values.select(0, rows)?;
    let shape = gathered.shape();
    if shape.len() >= rank {
        return Ok(gathered);
    }
    let mut expanded = Vec::with_capacity(rank);
    expanded.push(shape[0]);
    expanded.extend(std::iter::repeat(1).take(rank - shape.len()));
    expanded.extend_from_slice(&shape[1..]);
    Ok(gathered.reshape(&expanded)?)
}

/// A `[values.len(), 1, ..., 1]` array of rank `rank`, same backend as `like`.
pub(crate) fn row_factors(like: &Array, factors: Vec<f64>, rank: usize) -> Result<Array, OpsError> {
    let mut shape = vec![1; rank.max(1)];
    shape[0] = factors.len();
    Ok(like.from_vec_like(&shape, factors)?)
}

/// Rebuilds a block from parts, attaching the given gradients.
pub(crate) fn assemble(
    values: Array,
    samples: Labels,
    components: Vec<Labels>,
    properties: Labels,
    gradients: Vec<(String, Block)>,
) -> Result<Block, OpsError> {
    let mut builder = Block::builder(values, samples, components, properties)?;
    for (parameter, gradient) in gradients {
        builder.add_gradient(&parameter, gradient)?;
    }
    Ok(builder.build())
}
