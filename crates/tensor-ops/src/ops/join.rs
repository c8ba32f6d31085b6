// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Joining tensor maps with the same keys along samples or properties.

use super::{
    assemble, check_same_keys, require_identical, require_identical_components,
    require_same_gradients, Axis,
};
use crate::OpsError;
use array_core::Array;
use std::collections::HashSet;
use tensor_map::{Block, Labels, TensorMap};
use tracing::debug;

const OP: &str = "join";

/// Concatenates label sets with the same names.
///
/// When the concatenation would repeat a row, a leading `tensor` column
/// holding the input index is added to keep rows unique.
fn concat_labels(what: &str, labels: &[&Labels]) -> Result<Labels, OpsError> {
    let names = labels[0].names();
    if let Some(other) = labels.iter().find(|l| l.names() != names) {
        return Err(OpsError::schema(
            OP,
            format!("{what} names differ: {names:?} vs {:?}", other.names()),
        ));
    }

    let mut seen = HashSet::new();
    let mut collides = false;
    for row in labels.iter().flat_map(|&l| l.iter()) {
        if !seen.insert(row) {
            collides = true;
            break;
        }
    }

    if collides {
        let rows: Vec<Vec<i32>> = labels
            .iter()
            .enumerate()
            .flat_map(|(t, &l)| {
                l.iter().map(move |row| {
                    std::iter::once(t as i32)
                        .chain(row.iter().copied())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let names = std::iter::once("tensor".to_string()).chain(names.iter().cloned());
        Ok(Labels::from_rows(names, rows)?)
    } else {
        let rows: Vec<Vec<i32>> = labels
            .iter()
            .flat_map(|&l| l.iter().map(<[i32]>::to_vec))
            .collect();
        Ok(Labels::from_rows(names.iter().cloned(), rows)?)
    }
}

fn last_axis(values: &[&Array]) -> usize {
    values[0].rank() - 1
}

/// Blocks sharing samples and components, glued along properties.
fn join_properties(blocks: &[&Block]) -> Result<Block, OpsError> {
    let first = blocks[0];
    for block in &blocks[1..] {
        require_identical(OP, "samples", first.samples(), block.samples())?;
        require_identical_components(OP, "components", first.components(), block.components())?;
        require_same_gradients(OP, first, block)?;
        for (parameter, gradient) in first.gradients() {
            let other = block.gradient(parameter)?;
            require_identical(OP, "gradient samples", gradient.samples(), other.samples())?;
            require_identical_components(
                OP,
                "gradient components",
                gradient.components(),
                other.components(),
            )?;
        }
    }

    let properties = concat_labels(
        "properties",
        &blocks.iter().map(|b| b.properties()).collect::<Vec<_>>(),
    )?;

    let mut gradients = Vec::new();
    for (parameter, gradient) in first.gradients() {
        let parts = blocks
            .iter()
            .map(|b| Ok(b.gradient(parameter)?.values()))
            .collect::<Result<Vec<_>, OpsError>>()?;
        let g = Block::new(
            Array::concatenate(&parts, last_axis(&parts))?,
            gradient.samples().clone(),
            gradient.components().to_vec(),
            properties.clone(),
        )?;
        gradients.push((parameter.to_string(), g));
    }

    let values: Vec<&Array> = blocks.iter().map(|b| b.values()).collect();
    assemble(
        Array::concatenate(&values, last_axis(&values))?,
        first.samples().clone(),
        first.components().to_vec(),
        properties,
        gradients,
    )
}

/// Blocks sharing components and properties, stacked along samples.
fn join_samples(blocks: &[&Block]) -> Result<Block, OpsError> {
    let first = blocks[0];
    for block in &blocks[1..] {
        require_identical_components(OP, "components", first.components(), block.components())?;
        require_identical(OP, "properties", first.properties(), block.properties())?;
        require_same_gradients(OP, first, block)?;
        for (parameter, gradient) in first.gradients() {
            let other = block.gradient(parameter)?;
            if gradient.samples().names() != other.samples().names() {
                return Err(OpsError::schema(
                    OP,
                    format!("gradient '{parameter}' sample names differ"),
                ));
            }
            require_identical_components(
                OP,
                "gradient components",
                gradient.components(),
                other.components(),
            )?;
        }
    }

    let samples = concat_labels(
        "samples",
        &blocks.iter().map(|b| b.samples()).collect::<Vec<_>>(),
    )?;

    let mut gradients = Vec::new();
    for (parameter, gradient) in first.gradients() {
        let mut parts = Vec::with_capacity(blocks.len());
        let mut rows = Vec::new();
        let mut offset = 0;
        for block in blocks {
            let g = block.gradient(parameter)?;
            parts.push(g.values());
            rows.extend(g.samples().iter().map(|row| {
                let mut row = row.to_vec();
                row[0] += offset;
                row
            }));
            offset += block.samples().len() as i32;
        }
        let names = gradient.samples().names().iter().cloned();
        let g = Block::new(
            Array::vstack(&parts)?,
            Labels::from_rows(names, rows)?,
            gradient.components().to_vec(),
            first.properties().clone(),
        )?;
        gradients.push((parameter.to_string(), g));
    }

    let values: Vec<&Array> = blocks.iter().map(|b| b.values()).collect();
    assemble(
        Array::vstack(&values)?,
        samples,
        first.components().to_vec(),
        first.properties().clone(),
        gradients,
    )
}

/// Joins tensor maps block by block along `axis`.
///
/// Every input must have the same keys; the result follows the key order of
/// the first one. Blocks are glued along properties (samples and
/// components must match) or stacked along samples (components and
/// properties must match, gradient sample references are shifted).
///
/// # Errors
/// - [`OpsError::InvalidArgument`] for an empty input list.
/// - [`OpsError::KeyMismatch`] if any input has different keys.
/// - [`OpsError::SchemaMismatch`] for incompatible blocks.
pub fn join(tensors: &[TensorMap], axis: Axis) -> Result<TensorMap, OpsError> {
    let Some(first) = tensors.first() else {
        return Err(OpsError::invalid(OP, "provide at least one tensor map"));
    };
    if tensors.len() == 1 {
        return Ok(first.clone());
    }
    for tensor in &tensors[1..] {
        check_same_keys(OP, first, tensor)?;
    }

    let mut blocks = Vec::with_capacity(first.len());
    for key in first.keys().iter() {
        let group = tensors
            .iter()
            .map(|t| t.block(key))
            .collect::<Result<Vec<_>, _>>()?;
        let names = axis.labels(group[0]).names();
        if group.iter().any(|b| axis.labels(b).names() != names) {
            return Err(OpsError::schema(
                OP,
                format!("blocks for key {key:?} have different {axis:?} names"),
            ));
        }
        blocks.push(match axis {
            Axis::Properties => join_properties(&group)?,
            Axis::Samples => join_samples(&group)?,
        });
    }

    debug!(inputs = tensors.len(), ?axis, "joined tensor maps");
    Ok(TensorMap::new(first.keys().clone(), blocks)?)
}
