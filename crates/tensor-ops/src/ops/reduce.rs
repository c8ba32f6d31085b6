// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reductions over sample dimensions.
//!
//! Rows sharing the same values on the sample columns that are kept form a
//! group; every group becomes one output sample. Groups come out sorted.
//! Reducing over every sample column collapses the block to a single
//! sample labelled by [`Labels::single`].
//!
//! Gradients follow in closed form. For the variance,
//! `d var = 2/n Σ (x_i - mean) dx_i`; for the standard deviation,
//! `d std = d var / (2 std)`, taken as zero where `std` is zero.

use super::{assemble, gather_rows, gradient_parents, row_factors};
use crate::OpsError;
use array_core::{Array, BinaryOp, UnaryOp};
use std::collections::{BTreeSet, HashMap};
use tensor_map::{Block, Labels, TensorMap};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reduction {
    Sum,
    Mean,
    Var,
    Std,
}

impl Reduction {
    fn as_str(self) -> &'static str {
        match self {
            Reduction::Sum => "sum_over_samples",
            Reduction::Mean => "mean_over_samples",
            Reduction::Var => "var_over_samples",
            Reduction::Std => "std_over_samples",
        }
    }
}

/// Output rows of a reduction and the group each input row falls in.
struct Grouping {
    samples: Labels,
    groups: Vec<usize>,
    /// `1 / size` for every group, zero for empty groups.
    inverse_counts: Vec<f64>,
}

/// Sorts `rows` into unique output rows, returning them together with the
/// output position of every input row.
fn unique_sorted(rows: &[Vec<i32>]) -> (Vec<Vec<i32>>, Vec<usize>) {
    let unique: Vec<Vec<i32>> = rows
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let index: HashMap<&[i32], usize> = unique
        .iter()
        .enumerate()
        .map(|(i, row)| (row.as_slice(), i))
        .collect();
    let positions = rows.iter().map(|row| index[row.as_slice()]).collect();
    (unique, positions)
}

fn grouping(op: &'static str, samples: &Labels, names: &[&str]) -> Result<Grouping, OpsError> {
    if let Some(name) = names.iter().find(|n| samples.column_index(n).is_none()) {
        return Err(OpsError::schema(
            op,
            format!("'{name}' is not one of the sample names {:?}", samples.names()),
        ));
    }
    let kept: Vec<&str> = samples
        .names()
        .iter()
        .map(String::as_str)
        .filter(|n| !names.contains(n))
        .collect();

    let (output, groups) = if kept.is_empty() {
        (Labels::single(), vec![0; samples.len()])
    } else {
        let (unique, groups) = unique_sorted(&samples.project(&kept)?);
        (Labels::from_rows(kept.iter().copied(), unique)?, groups)
    };

    let mut counts = vec![0usize; output.len()];
    for &g in &groups {
        counts[g] += 1;
    }
    let inverse_counts = counts
        .into_iter()
        .map(|c| if c == 0 { 0.0 } else { 1.0 / c as f64 })
        .collect();
    Ok(Grouping {
        samples: output,
        groups,
        inverse_counts,
    })
}

/// Centered values kept for the variance and standard deviation gradients.
struct Spread {
    diff: Array,
    /// `1 / (2 std)` per group, zero where `std` is zero. Only for `Std`.
    half_inverse_std: Option<Array>,
}

fn reduce_block(block: &Block, names: &[&str], reduction: Reduction) -> Result<Block, OpsError> {
    let grouping = grouping(reduction.as_str(), block.samples(), names)?;
    let n_groups = grouping.samples.len();
    let values = block.values();
    let rank = values.rank();

    let sum = values.index_add(&grouping.groups, n_groups)?;
    let inverse = row_factors(values, grouping.inverse_counts.clone(), rank)?;
    let (reduced, spread) = match reduction {
        Reduction::Sum => (sum, None),
        Reduction::Mean => (sum.binary(BinaryOp::Mul, &inverse)?, None),
        Reduction::Var | Reduction::Std => {
            let mean = sum.binary(BinaryOp::Mul, &inverse)?;
            let diff = values.binary(BinaryOp::Sub, &mean.select(0, &grouping.groups)?)?;
            let var = diff
                .unary(UnaryOp::Square)?
                .index_add(&grouping.groups, n_groups)?
                .binary(BinaryOp::Mul, &inverse)?;
            if reduction == Reduction::Var {
                (var, Some(Spread { diff, half_inverse_std: None }))
            } else {
                let std = var.unary(UnaryOp::Sqrt)?;
                let half_inverse_std = std.unary(UnaryOp::InverseOrZero)?.scalar(BinaryOp::Mul, 0.5)?;
                (
                    std,
                    Some(Spread {
                        diff,
                        half_inverse_std: Some(half_inverse_std),
                    }),
                )
            }
        }
    };

    let mut gradients = Vec::new();
    for (parameter, gradient) in block.gradients() {
        let parents = gradient_parents(gradient)?;
        let rows: Vec<Vec<i32>> = gradient
            .samples()
            .iter()
            .zip(&parents)
            .map(|(row, &parent)| {
                let mut row = row.to_vec();
                row[0] = grouping.groups[parent] as i32;
                row
            })
            .collect();
        let (unique, targets) = unique_sorted(&rows);
        let owners: Vec<usize> = unique.iter().map(|row| row[0] as usize).collect();
        let n_rows = unique.len();

        let dx = gradient.values();
        let g_rank = dx.rank();
        let per_owner = |factors: &[f64]| -> Vec<f64> { owners.iter().map(|&g| factors[g]).collect() };

        let new_values = match &spread {
            None => {
                let summed = dx.index_add(&targets, n_rows)?;
                if reduction == Reduction::Mean {
                    let scale = row_factors(dx, per_owner(&grouping.inverse_counts), g_rank)?;
                    summed.binary(BinaryOp::Mul, &scale)?
                } else {
                    summed
                }
            }
            Some(spread) => {
                let weighted = dx.binary(BinaryOp::Mul, &gather_rows(&spread.diff, &parents, g_rank)?)?;
                let twice: Vec<f64> = per_owner(&grouping.inverse_counts)
                    .into_iter()
                    .map(|f| 2.0 * f)
                    .collect();
                let dvar = weighted
                    .index_add(&targets, n_rows)?
                    .binary(BinaryOp::Mul, &row_factors(dx, twice, g_rank)?)?;
                match &spread.half_inverse_std {
                    Some(half) => dvar.binary(BinaryOp::Mul, &gather_rows(half, &owners, g_rank)?)?,
                    None => dvar,
                }
            }
        };

        let samples = Labels::from_rows(gradient.samples().names().iter().cloned(), unique)?;
        let g = Block::new(
            new_values,
            samples,
            gradient.components().to_vec(),
            gradient.properties().clone(),
        )?;
        gradients.push((parameter.to_string(), g));
    }

    assemble(
        reduced,
        grouping.samples,
        block.components().to_vec(),
        block.properties().clone(),
        gradients,
    )
}

fn reduce(tensor: &TensorMap, names: &[&str], reduction: Reduction) -> Result<TensorMap, OpsError> {
    for block in tensor.blocks() {
        grouping(reduction.as_str(), block.samples(), names)?;
    }
    let blocks = tensor
        .blocks()
        .iter()
        .map(|block| reduce_block(block, names, reduction))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(op = reduction.as_str(), ?names, blocks = blocks.len(), "reduced over samples");
    Ok(TensorMap::new(tensor.keys().clone(), blocks)?)
}

/// Sums over the sample columns `names`.
///
/// # Errors
/// Returns [`OpsError::SchemaMismatch`] if a name is not a sample column.
pub fn sum_over_samples(tensor: &TensorMap, names: &[&str]) -> Result<TensorMap, OpsError> {
    reduce(tensor, names, Reduction::Sum)
}

pub fn sum_over_samples_block(block: &Block, names: &[&str]) -> Result<Block, OpsError> {
    reduce_block(block, names, Reduction::Sum)
}

/// Averages over the sample columns `names`.
pub fn mean_over_samples(tensor: &TensorMap, names: &[&str]) -> Result<TensorMap, OpsError> {
    reduce(tensor, names, Reduction::Mean)
}

pub fn mean_over_samples_block(block: &Block, names: &[&str]) -> Result<Block, OpsError> {
    reduce_block(block, names, Reduction::Mean)
}

/// Population variance over the sample columns `names`.
pub fn var_over_samples(tensor: &TensorMap, names: &[&str]) -> Result<TensorMap, OpsError> {
    reduce(tensor, names, Reduction::Var)
}

pub fn var_over_samples_block(block: &Block, names: &[&str]) -> Result<Block, OpsError> {
    reduce_block(block, names, Reduction::Var)
}

/// Population standard deviation over the sample columns `names`.
pub fn std_over_samples(tensor: &TensorMap, names: &[&str]) -> Result<TensorMap, OpsError> {
    reduce(tensor, names, Reduction::Std)
}

pub fn std_over_samples_block(block: &Block, names: &[&str]) -> Result<Block, OpsError> {
    reduce_block(block, names, Reduction::Std)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use array_core::ndarray::arr2;

    /// Samples (structure, atom): (1,0) (0,0) (1,1) (0,1); one property.
    /// Values 1, 2, 3, 6. Gradient rows for samples 0, 2 and 3.
    fn block() -> Block {
        let samples = Labels::from_rows(
            ["structure", "atom"],
            vec![vec![1, 0], vec![0, 0], vec![1, 1], vec![0, 1]],
        )
        .unwrap();
        let properties = Labels::range("p", 1).unwrap();
        let mut builder = Block::builder(
            arr2(&[[1.0], [2.0], [3.0], [6.0]]).into_dyn(),
            samples,
            vec![],
            properties.clone(),
        )
        .unwrap();
        let gradient = Block::new(
            arr2(&[[1.0], [1.0], [1.0]]).into_dyn(),
            Labels::from_rows(["sample"], vec![vec![0], vec![2], vec![3]]).unwrap(),
            vec![],
            properties,
        )
        .unwrap();
        builder.add_gradient("x", gradient).unwrap();
        builder.build()
    }

    #[test]
    fn test_sum_groups_are_sorted() {
        let summed = sum_over_samples_block(&block(), &["atom"]).unwrap();
        assert_eq!(summed.samples().names(), &["structure"]);
        assert_eq!(summed.samples().to_rows(), vec![vec![0], vec![1]]);
        assert_eq!(summed.values().to_vec().unwrap(), vec![8.0, 4.0]);

        let g = summed.gradient("x").unwrap();
        assert_eq!(g.samples().to_rows(), vec![vec![0], vec![1]]);
        assert_eq!(g.values().to_vec().unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_mean() {
        let mean = mean_over_samples_block(&block(), &["atom"]).unwrap();
        assert_eq!(mean.values().to_vec().unwrap(), vec![4.0, 2.0]);
        assert_eq!(
            mean.gradient("x").unwrap().values().to_vec().unwrap(),
            vec![0.5, 1.0]
        );
    }

    #[test]
    fn test_reduce_all_columns() {
        let sum = sum_over_samples_block(&block(), &["structure", "atom"]).unwrap();
        assert_eq!(sum.samples().names(), &["_"]);
        assert_eq!(sum.values().to_vec().unwrap(), vec![12.0]);
    }

    #[test]
    fn test_var_and_std() {
        // structure 0: {2, 6}, mean 4, var 4; structure 1: {1, 3}, mean 2, var 1.
        let var = var_over_samples_block(&block(), &["atom"]).unwrap();
        assert_eq!(var.values().to_vec().unwrap(), vec![4.0, 1.0]);
        // d var_0 = 2/2 * (6 - 4) * 1; d var_1 = 2/2 * ((1 - 2) + (3 - 2)).
        let dvar = var.gradient("x").unwrap().values().to_vec().unwrap();
        assert_abs_diff_eq!(dvar[0], 2.0);
        assert_abs_diff_eq!(dvar[1], 0.0);

        let std = std_over_samples_block(&block(), &["atom"]).unwrap();
        assert_eq!(std.values().to_vec().unwrap(), vec![2.0, 1.0]);
        let dstd = std.gradient("x").unwrap().values().to_vec().unwrap();
        assert_abs_diff_eq!(dstd[0], 0.5);
        assert_abs_diff_eq!(dstd[1], 0.0);
    }

    #[test]
    fn test_std_gradient_zero_where_std_is_zero() {
        let properties = Labels::range("p", 1).unwrap();
        let mut builder = Block::builder(
            arr2(&[[5.0], [5.0]]).into_dyn(),
            Labels::range("atom", 2).unwrap(),
            vec![],
            properties.clone(),
        )
        .unwrap();
        let gradient = Block::new(
            arr2(&[[1.0], [3.0]]).into_dyn(),
            Labels::from_rows(["sample"], vec![vec![0], vec![1]]).unwrap(),
            vec![],
            properties,
        )
        .unwrap();
        builder.add_gradient("x", gradient).unwrap();
        let std = std_over_samples_block(&builder.build(), &["atom"]).unwrap();
        assert_eq!(std.values().to_vec().unwrap(), vec![0.0]);
        assert_eq!(std.gradient("x").unwrap().values().to_vec().unwrap(), vec![0.0]);
    }

    #[test]
    fn test_unknown_name() {
        assert!(matches!(
            sum_over_samples_block(&block(), &["species"]),
            Err(OpsError::SchemaMismatch { .. })
        ));
    }
}
