// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

use crate::OpsError;
use tensor_map::{Labels, TensorMap};
use tracing::debug;

/// Removes the blocks under `keys`.
///
/// The remaining keys come out sorted. With `copy` the remaining blocks are
/// deep copies, otherwise they share storage with `tensor`.
///
/// # Errors
/// - [`OpsError::SchemaMismatch`] if the key names differ.
/// - [`OpsError::UnknownKey`] listing every key of `keys` not in `tensor`.
pub fn drop_blocks(tensor: &TensorMap, keys: &Labels, copy: bool) -> Result<TensorMap, OpsError> {
    if tensor.keys().names() != keys.names() {
        return Err(OpsError::schema(
            "drop_blocks",
            format!(
                "key names {:?} do not match the tensor key names {:?}",
                keys.names(),
                tensor.keys().names()
            ),
        ));
    }

    let unknown: Vec<Vec<i32>> = keys
        .iter()
        .filter(|key| !tensor.keys().contains(key))
        .map(<[i32]>::to_vec)
        .collect();
    if !unknown.is_empty() {
        return Err(OpsError::UnknownKey {
            op: "drop_blocks",
            keys: unknown,
        });
    }

    let remaining = tensor.keys().difference(keys)?.sorted();
    let blocks = remaining
        .iter()
        .map(|key| {
            let block = tensor.block(key)?;
            if copy {
                block.copy()
            } else {
                Ok(block.clone())
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(dropped = keys.len(), remaining = blocks.len(), copy, "dropped blocks");
    Ok(TensorMap::new(remaining, blocks)?)
}
