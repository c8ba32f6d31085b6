// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

use super::{assemble, paired_blocks, require_identical};
use crate::OpsError;
use tensor_map::{Block, TensorMap};
use tracing::debug;

const OP: &str = "dot";

fn validate(left: &Block, right: &Block) -> Result<(), OpsError> {
    if !right.components().is_empty() {
        return Err(OpsError::invalid(
            OP,
            "the second tensor map must not have components",
        ));
    }
    if right.gradients().len() > 0 {
        return Err(OpsError::invalid(
            OP,
            "the second tensor map must not have gradients",
        ));
    }
    require_identical(OP, "properties", left.properties(), right.properties())
}

fn dot_block(left: &Block, right: &Block) -> Result<Block, OpsError> {
    let weights = right.values();
    let properties = right.samples().clone();

    let mut gradients = Vec::new();
    for (parameter, gradient) in left.gradients() {
        let g = Block::new(
            gradient.values().dot(weights)?,
            gradient.samples().clone(),
            gradient.components().to_vec(),
            properties.clone(),
        )?;
        gradients.push((parameter.to_string(), g));
    }

    assemble(
        left.values().dot(weights)?,
        left.samples().clone(),
        left.components().to_vec(),
        properties,
        gradients,
    )
}

/// Contracts the properties of `first` with the properties of `second`,
/// block by block.
///
/// Each result block keeps the samples and components of `first`; its
/// properties are the samples of `second`. Gradients of `first` are
/// contracted the same way.
///
/// # Errors
/// - [`OpsError::KeyMismatch`] if the keys differ.
/// - [`OpsError::InvalidArgument`] if a block of `second` has components or
///   gradients.
/// - [`OpsError::SchemaMismatch`] if paired properties are not identical.
pub fn dot(first: &TensorMap, second: &TensorMap) -> Result<TensorMap, OpsError> {
    let pairs = paired_blocks(OP, first, second)?;
    for (left, right) in &pairs {
        validate(left, right)?;
    }

    let blocks = pairs
        .into_iter()
        .map(|(left, right)| dot_block(left, right))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(blocks = blocks.len(), "computed dot product");
    Ok(TensorMap::new(first.keys().clone(), blocks)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use array_core::ndarray::{arr2, arr3};
    use tensor_map::Labels;

    fn keys() -> Labels {
        Labels::new(["k"], vec![0]).unwrap()
    }

    #[test]
    fn test_dot_with_gradients() {
        let properties = Labels::range("p", 2).unwrap();
        let mut builder = Block::builder(
            arr2(&[[1.0, 2.0], [3.0, 4.0]]).into_dyn(),
            Labels::range("s", 2).unwrap(),
            vec![],
            properties.clone(),
        )
        .unwrap();
        let gradient = Block::new(
            arr3(&[[[1.0, 0.0]], [[0.0, 1.0]]]).into_dyn(),
            Labels::from_rows(["sample"], vec![vec![0], vec![1]]).unwrap(),
            vec![Labels::range("xyz", 1).unwrap()],
            properties.clone(),
        )
        .unwrap();
        builder.add_gradient("positions", gradient).unwrap();
        let left = TensorMap::new(keys(), vec![builder.build()]).unwrap();

        let right = TensorMap::new(
            keys(),
            vec![Block::new(
                arr2(&[[1.0, 1.0], [2.0, 0.0], [0.0, -1.0]]).into_dyn(),
                Labels::range("t", 3).unwrap(),
                vec![],
                properties,
            )
            .unwrap()],
        )
        .unwrap();

        let result = dot(&left, &right).unwrap();
        let block = result.block(&[0]).unwrap();
        assert_eq!(block.properties().names(), &["t"]);
        assert_eq!(
            block.values().to_vec().unwrap(),
            vec![3.0, 2.0, -2.0, 7.0, 6.0, -4.0]
        );
        let g = block.gradient("positions").unwrap();
        assert_eq!(g.values().shape(), &[2, 1, 3]);
        assert_eq!(g.values().to_vec().unwrap(), vec![1.0, 2.0, 0.0, 1.0, 0.0, -1.0]);
    }

    #[test]
    fn test_right_components_rejected() {
        let block = Block::new(
            arr3(&[[[1.0]]]).into_dyn(),
            Labels::range("s", 1).unwrap(),
            vec![Labels::range("c", 1).unwrap()],
            Labels::range("p", 1).unwrap(),
        )
        .unwrap();
        let t = TensorMap::new(keys(), vec![block]).unwrap();
        assert!(matches!(dot(&t, &t), Err(OpsError::InvalidArgument { .. })));
    }

    #[test]
    fn test_properties_must_match() {
        let make = |name: &str| {
            TensorMap::new(
                keys(),
                vec![Block::new(
                    arr2(&[[1.0]]).into_dyn(),
                    Labels::range("s", 1).unwrap(),
                    vec![],
                    Labels::range(name, 1).unwrap(),
                )
                .unwrap()],
            )
            .unwrap()
        };
        assert!(matches!(
            dot(&make("p"), &make("q")),
            Err(OpsError::SchemaMismatch { .. })
        ));
    }
}
