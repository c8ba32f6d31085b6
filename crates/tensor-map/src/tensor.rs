// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor maps: an ordered mapping from key rows to blocks.

use crate::{Block, Labels, TensorMapError};
use std::fmt;

/// Blocks indexed by the rows of a key label set.
///
/// Blocks under different keys are independent: nothing requires their
/// axes to be compatible. A tensor map is immutable once built; operations
/// return new maps.
#[derive(Debug, Clone)]
pub struct TensorMap {
    keys: Labels,
    blocks: Vec<Block>,
}

impl TensorMap {
    /// Creates a tensor map with one block per key row.
    ///
    /// # Errors
    /// Returns [`TensorMapError::LengthMismatch`] if the counts differ.
    pub fn new(keys: Labels, blocks: Vec<Block>) -> Result<Self, TensorMapError> {
        if keys.len() != blocks.len() {
            return Err(TensorMapError::LengthMismatch {
                keys: keys.len(),
                blocks: blocks.len(),
            });
        }
        Ok(Self { keys, blocks })
    }

    pub fn keys(&self) -> &Labels {
        &self.keys
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The block stored under `key`.
    pub fn block(&self, key: &[i32]) -> Result<&Block, TensorMapError> {
        self.keys
            .position(key)
            .map(|i| &self.blocks[i])
            .ok_or_else(|| TensorMapError::KeyNotFound(key.to_vec()))
    }

    pub fn block_by_index(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Iterates over `(key, block)` pairs in key order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&[i32], &Block)> + '_ {
        self.keys.iter().zip(self.blocks.iter())
    }

    /// Positions of the blocks whose keys match any row of `selection`.
    ///
    /// `selection` may name only a subset of the key columns; the other
    /// columns are free.
    ///
    /// # Errors
    /// Returns [`TensorMapError::SchemaMismatch`] if `selection` names a
    /// column that is not a key name.
    pub fn blocks_matching(&self, selection: &Labels) -> Result<Vec<usize>, TensorMapError> {
        let projected = self.keys.project(selection.names())?;
        Ok(projected
            .iter()
            .enumerate()
            .filter(|(_, row)| selection.contains(row))
            .map(|(i, _)| i)
            .collect())
    }

    /// Deep copy of every block.
    pub fn copy(&self) -> Result<TensorMap, TensorMapError> {
        let blocks = self
            .blocks
            .iter()
            .map(Block::copy)
            .collect::<Result<_, _>>()?;
        Ok(Self {
            keys: self.keys.clone(),
            blocks,
        })
    }

    /// Splits the map into its keys and blocks.
    pub fn into_parts(self) -> (Labels, Vec<Block>) {
        (self.keys, self.blocks)
    }
}

impl fmt::Display for TensorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TensorMap with {} blocks", self.len())?;
        write!(f, "keys: {}", self.keys.names().join(" "))?;
        for key in self.keys.iter() {
            let cells: Vec<String> = key.iter().map(i32::to_string).collect();
            write!(f, "\n      {}", cells.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use array_core::ndarray::{ArrayD, IxDyn};

    fn block(value: f64) -> Block {
        Block::new(
            ArrayD::from_elem(IxDyn(&[1, 1]), value),
            Labels::new(["s"], vec![0]).unwrap(),
            vec![],
            Labels::new(["p"], vec![0]).unwrap(),
        )
        .unwrap()
    }

    fn tensor() -> TensorMap {
        let keys = Labels::new(["a", "b"], vec![0, 0, 0, 1, 1, 0]).unwrap();
        TensorMap::new(keys, vec![block(1.0), block(2.0), block(3.0)]).unwrap()
    }

    #[test]
    fn test_length_mismatch() {
        let keys = Labels::new(["a"], vec![0, 1]).unwrap();
        let err = TensorMap::new(keys, vec![block(1.0)]).unwrap_err();
        assert!(matches!(
            err,
            TensorMapError::LengthMismatch { keys: 2, blocks: 1 }
        ));
    }

    #[test]
    fn test_block_lookup() {
        let t = tensor();
        assert_eq!(t.len(), 3);
        assert_eq!(t.block(&[0, 1]).unwrap().values().to_vec().unwrap(), vec![2.0]);
        assert!(matches!(
            t.block(&[5, 5]),
            Err(TensorMapError::KeyNotFound(key)) if key == vec![5, 5]
        ));
        assert!(t.block_by_index(2).is_some());
        assert!(t.block_by_index(3).is_none());
    }

    #[test]
    fn test_iteration_order() {
        let t = tensor();
        let keys: Vec<Vec<i32>> = t.iter().map(|(k, _)| k.to_vec()).collect();
        assert_eq!(keys, vec![vec![0, 0], vec![0, 1], vec![1, 0]]);
    }

    #[test]
    fn test_blocks_matching() {
        let t = tensor();
        let selection = Labels::new(["a"], vec![0]).unwrap();
        assert_eq!(t.blocks_matching(&selection).unwrap(), vec![0, 1]);

        let selection = Labels::new(["b"], vec![0]).unwrap();
        assert_eq!(t.blocks_matching(&selection).unwrap(), vec![0, 2]);

        let selection = Labels::new(["c"], vec![0]).unwrap();
        assert!(matches!(
            t.blocks_matching(&selection),
            Err(TensorMapError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_copy_is_deep() {
        let t = tensor();
        let c = t.copy().unwrap();
        for (a, b) in t.blocks().iter().zip(c.blocks()) {
            assert!(!a.values().ptr_eq(b.values()));
        }
        let shared = t.clone();
        assert!(shared.blocks()[0].values().ptr_eq(t.blocks()[0].values()));
    }

    #[test]
    fn test_display() {
        let expected = "TensorMap with 3 blocks\nkeys: a b\n      0 0\n      0 1\n      1 0";
        assert_eq!(tensor().to_string(), expected);
    }
}
