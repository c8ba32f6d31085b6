// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

use super::Axis;
use crate::OpsError;
use std::collections::HashSet;
use tensor_map::{Block, Labels, TensorMap};

const OP: &str = "unique_metadata";

/// Adds the distinct projections of `block`'s `axis` labels to `rows`.
fn collect_block(
    block: &Block,
    axis: Axis,
    names: &[&str],
    gradient: Option<&str>,
    seen: &mut HashSet<Vec<i32>>,
    rows: &mut Vec<Vec<i32>>,
) -> Result<(), OpsError> {
    let block = match gradient {
        Some(parameter) => block.gradient(parameter)?,
        None => block,
    };
    let labels = axis.labels(block);
    let projected = labels.project(names).map_err(|_| {
        OpsError::schema(
            OP,
            format!("{names:?} are not all {axis:?} names of {:?}", labels.names()),
        )
    })?;
    for row in projected {
        if seen.insert(row.clone()) {
            rows.push(row);
        }
    }
    Ok(())
}

fn unique(blocks: &[&Block], axis: Axis, names: &[&str], gradient: Option<&str>) -> Result<Labels, OpsError> {
    if names.is_empty() {
        return Err(OpsError::invalid(OP, "provide at least one name"));
    }
    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    for block in blocks {
        collect_block(block, axis, names, gradient, &mut seen, &mut rows)?;
    }
    Ok(Labels::from_rows(names.iter().copied(), rows)?)
}

/// Distinct values of the columns `names` of `axis` over every block, in
/// the order they are first seen.
///
/// With `gradient`, the labels of that gradient of each block are used
/// instead. A tensor map without blocks gives an empty label set.
///
/// # Errors
/// - [`OpsError::SchemaMismatch`] if a name is not a column of the axis.
/// - [`OpsError::TensorMap`] if a block lacks the requested gradient.
pub fn unique_metadata(
    tensor: &TensorMap,
    axis: Axis,
    names: &[&str],
    gradient: Option<&str>,
) -> Result<Labels, OpsError> {
    let blocks: Vec<&Block> = tensor.blocks().iter().collect();
    unique(&blocks, axis, names, gradient)
}

pub fn unique_metadata_block(
    block: &Block,
    axis: Axis,
    names: &[&str],
    gradient: Option<&str>,
) -> Result<Labels, OpsError> {
    unique(&[block], axis, names, gradient)
}
