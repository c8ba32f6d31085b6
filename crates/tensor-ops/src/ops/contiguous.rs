// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

use crate::OpsError;
use tensor_map::{Block, TensorMap};

/// Whether every block (values and gradients) is stored contiguously.
pub fn is_contiguous(tensor: &TensorMap) -> Result<bool, OpsError> {
    for block in tensor.blocks() {
        if !block.is_contiguous()? {
            return Ok(false);
        }
    }
    Ok(true)
}

pub fn is_contiguous_block(block: &Block) -> Result<bool, OpsError> {
    Ok(block.is_contiguous()?)
}

/// A tensor map whose every array is contiguous. Arrays that already are
/// keep sharing storage with the input.
pub fn make_contiguous(tensor: &TensorMap) -> Result<TensorMap, OpsError> {
    let blocks = tensor
        .blocks()
        .iter()
        .map(Block::to_contiguous)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TensorMap::new(tensor.keys().clone(), blocks)?)
}

pub fn make_contiguous_block(block: &Block) -> Result<Block, OpsError> {
    Ok(block.to_contiguous()?)
}
