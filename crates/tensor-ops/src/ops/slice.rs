// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Slicing blocks along samples and properties by label selection.

use super::{assemble, gradient_parents};
use crate::warning::{emit, Warning};
use crate::OpsError;
use tensor_map::{Block, Labels, TensorMap};
use tracing::debug;

/// Positions of the rows of `labels` whose projection onto the columns of
/// `selection` is one of the selection rows.
fn selected_rows(what: &str, labels: &Labels, selection: &Labels) -> Result<Vec<usize>, OpsError> {
    let projected = labels.project(selection.names()).map_err(|_| {
        OpsError::schema(
            "slice",
            format!(
                "{what} selection names {:?} are not all in {:?}",
                selection.names(),
                labels.names()
            ),
        )
    })?;
    Ok(projected
        .iter()
        .enumerate()
        .filter(|(_, row)| selection.contains(row))
        .map(|(i, _)| i)
        .collect())
}

/// Keeps only the `kept` samples of `block`, remapping gradient sample
/// references and dropping gradient rows whose parent is gone.
fn keep_samples(block: &Block, kept: &[usize]) -> Result<Block, OpsError> {
    let mut new_index = vec![None; block.samples().len()];
    for (new, &old) in kept.iter().enumerate() {
        new_index[old] = Some(new as i32);
    }

    let mut gradients = Vec::new();
    for (parameter, gradient) in block.gradients() {
        let parents = gradient_parents(gradient)?;
        let mut rows = Vec::new();
        let mut sample_rows = Vec::new();
        for (i, &parent) in parents.iter().enumerate() {
            if let Some(new) = new_index[parent] {
                rows.push(i);
                let mut row = gradient.samples().row(i).to_vec();
                row[0] = new;
                sample_rows.push(row);
            }
        }
        let samples = Labels::from_rows(gradient.samples().names().iter().cloned(), sample_rows)?;
        let g = Block::new(
            gradient.values().select(0, &rows)?,
            samples,
            gradient.components().to_vec(),
            gradient.properties().clone(),
        )?;
        gradients.push((parameter.to_string(), g));
    }

    assemble(
        block.values().select(0, kept)?,
        block.samples().select(kept)?,
        block.components().to_vec(),
        block.properties().clone(),
        gradients,
    )
}

/// Keeps only the `kept` properties of `block` and of its gradients.
fn keep_properties(block: &Block, kept: &[usize]) -> Result<Block, OpsError> {
    let properties = block.properties().select(kept)?;
    let mut gradients = Vec::new();
    for (parameter, gradient) in block.gradients() {
        let last = gradient.values().rank() - 1;
        let g = Block::new(
            gradient.values().select(last, kept)?,
            gradient.samples().clone(),
            gradient.components().to_vec(),
            properties.clone(),
        )?;
        gradients.push((parameter.to_string(), g));
    }

    let last = block.values().rank() - 1;
    assemble(
        block.values().select(last, kept)?,
        block.samples().clone(),
        block.components().to_vec(),
        properties,
        gradients,
    )
}

/// Keeps the samples and properties of `block` matching the selections.
///
/// A selection may name only some of the axis columns; a row is kept when
/// its values on those columns form one of the selection rows. Slicing to
/// zero rows gives a valid empty block. `None` leaves the axis untouched.
///
/// # Errors
/// Returns [`OpsError::SchemaMismatch`] if a selection names a column that
/// the axis does not have.
pub fn slice_block(
    block: &Block,
    samples: Option<&Labels>,
    properties: Option<&Labels>,
) -> Result<Block, OpsError> {
    // Resolve both selections before touching any values.
    let sample_rows = samples
        .map(|s| selected_rows("samples", block.samples(), s))
        .transpose()?;
    let property_rows = properties
        .map(|p| selected_rows("properties", block.properties(), p))
        .transpose()?;

    let mut result = block.clone();
    if let Some(rows) = sample_rows {
        result = keep_samples(&result, &rows)?;
    }
    if let Some(rows) = property_rows {
        result = keep_properties(&result, &rows)?;
    }
    Ok(result)
}

/// Slices every block of `tensor`; see [`slice_block`].
///
/// Emits [`Warning::SomeBlocksEmpty`] or [`Warning::AllBlocksEmpty`] when
/// blocks end up without elements.
pub fn slice(
    tensor: &TensorMap,
    samples: Option<&Labels>,
    properties: Option<&Labels>,
) -> Result<TensorMap, OpsError> {
    // Validate the selections against every block first.
    for block in tensor.blocks() {
        if let Some(s) = samples {
            selected_rows("samples", block.samples(), s)?;
        }
        if let Some(p) = properties {
            selected_rows("properties", block.properties(), p)?;
        }
    }

    let blocks = tensor
        .blocks()
        .iter()
        .map(|block| slice_block(block, samples, properties))
        .collect::<Result<Vec<_>, _>>()?;
    let result = TensorMap::new(tensor.keys().clone(), blocks)?;

    if let Some(warning) = slice_warning(&result) {
        emit(warning);
    }
    debug!(blocks = result.len(), "sliced tensor map");
    Ok(result)
}

/// The diagnostic [`slice`] emits for a sliced tensor map, if any.
pub fn slice_warning(tensor: &TensorMap) -> Option<Warning> {
    let empty = tensor
        .blocks()
        .iter()
        .filter(|block| block.values().num_elements() == 0)
        .count();
    match empty {
        0 => None,
        n if n == tensor.len() => Some(Warning::AllBlocksEmpty),
        _ => Some(Warning::SomeBlocksEmpty),
    }
}
