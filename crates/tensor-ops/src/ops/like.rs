// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Constructors shaped after existing blocks, and gradient removal.

use super::assemble;
use crate::OpsError;
use array_core::{Array, ArrayError};
use tensor_map::{Block, Labels, TensorMap};

/// A block with the metadata of `block` and values (gradients included)
/// produced by `fill` on the original arrays.
fn fill_block<F>(block: &Block, fill: &F) -> Result<Block, OpsError>
where
    F: Fn(&Array) -> Result<Array, ArrayError>,
{
    let gradients = block
        .gradients()
        .map(|(parameter, gradient)| {
            Ok((
                parameter.to_string(),
                gradient.with_values(fill(gradient.values())?)?,
            ))
        })
        .collect::<Result<Vec<_>, OpsError>>()?;
    assemble(
        fill(block.values())?,
        block.samples().clone(),
        block.components().to_vec(),
        block.properties().clone(),
        gradients,
    )
}

fn fill_tensor<F>(tensor: &TensorMap, fill: F) -> Result<TensorMap, OpsError>
where
    F: Fn(&Array) -> Result<Array, ArrayError>,
{
    let blocks = tensor
        .blocks()
        .iter()
        .map(|block| fill_block(block, &fill))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TensorMap::new(tensor.keys().clone(), blocks)?)
}

fn zeros(array: &Array) -> Result<Array, ArrayError> {
    array.zeros_like(array.shape())
}

fn ones(array: &Array) -> Result<Array, ArrayError> {
    array.ones_like(array.shape())
}

fn uniform(array: &Array) -> Result<Array, ArrayError> {
    array.uniform_random_like(array.shape())
}

/// Same keys, metadata and backend as `tensor`, every value set to zero.
pub fn zeros_like(tensor: &TensorMap) -> Result<TensorMap, OpsError> {
    fill_tensor(tensor, zeros)
}

pub fn zeros_like_block(block: &Block) -> Result<Block, OpsError> {
    fill_block(block, &zeros)
}

/// Same keys, metadata and backend as `tensor`, every value set to one.
pub fn ones_like(tensor: &TensorMap) -> Result<TensorMap, OpsError> {
    fill_tensor(tensor, ones)
}

pub fn ones_like_block(block: &Block) -> Result<Block, OpsError> {
    fill_block(block, &ones)
}

/// Same keys, metadata and backend as `tensor`, values drawn from `U[0, 1)`.
pub fn random_uniform_like(tensor: &TensorMap) -> Result<TensorMap, OpsError> {
    fill_tensor(tensor, uniform)
}

pub fn random_uniform_like_block(block: &Block) -> Result<Block, OpsError> {
    fill_block(block, &uniform)
}

/// Wraps a bare array of rank 2 or more in a block with generic labels:
/// `sample`, `component_1`, `component_2`, ... and `property`, each a
/// range over its axis.
///
/// # Errors
/// Returns [`OpsError::InvalidArgument`] for rank 0 or 1.
pub fn block_from_array(array: impl Into<Array>) -> Result<Block, OpsError> {
    let array = array.into();
    let shape = array.shape().to_vec();
    if shape.len() < 2 {
        return Err(OpsError::invalid(
            "block_from_array",
            format!("the array must have at least 2 dimensions, got {}", shape.len()),
        ));
    }
    let last = shape.len() - 1;
    let samples = Labels::range("sample", shape[0])?;
    let components = shape[1..last]
        .iter()
        .enumerate()
        .map(|(i, &n)| Labels::range(&format!("component_{}", i + 1), n))
        .collect::<Result<Vec<_>, _>>()?;
    let properties = Labels::range("property", shape[last])?;
    Ok(Block::new(array, samples, components, properties)?)
}

/// Removes the gradients named in `parameters`, or all of them for `None`.
/// Value storage is shared with the input.
pub fn remove_gradients(
    tensor: &TensorMap,
    parameters: Option<&[&str]>,
) -> Result<TensorMap, OpsError> {
    let blocks = tensor
        .blocks()
        .iter()
        .map(|block| remove_gradients_block(block, parameters))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TensorMap::new(tensor.keys().clone(), blocks)?)
}

pub fn remove_gradients_block(
    block: &Block,
    parameters: Option<&[&str]>,
) -> Result<Block, OpsError> {
    let Some(parameters) = parameters else {
        return Ok(block.without_gradients());
    };
    let kept = block
        .gradients()
        .filter(|(name, _)| !parameters.contains(name))
        .map(|(name, gradient)| (name.to_string(), gradient.clone()))
        .collect();
    assemble(
        block.values().clone(),
        block.samples().clone(),
        block.components().to_vec(),
        block.properties().clone(),
        kept,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use array_core::ndarray::{arr2, Array3, ArrayD, IxDyn};
    use array_core::{DenseArray, Shape};

    fn block() -> Block {
        let properties = Labels::range("p", 2).unwrap();
        let mut builder = Block::builder(
            arr2(&[[1.0, 2.0]]).into_dyn(),
            Labels::range("s", 1).unwrap(),
            vec![],
            properties.clone(),
        )
        .unwrap();
        for parameter in ["a", "b"] {
            let gradient = Block::new(
                arr2(&[[3.0, 4.0]]).into_dyn(),
                Labels::from_rows(["sample"], vec![vec![0]]).unwrap(),
                vec![],
                properties.clone(),
            )
            .unwrap();
            builder.add_gradient(parameter, gradient).unwrap();
        }
        builder.build()
    }

    #[test]
    fn test_zeros_and_ones_like() {
        let zeros = zeros_like_block(&block()).unwrap();
        assert_eq!(zeros.values().to_vec().unwrap(), vec![0.0, 0.0]);
        assert_eq!(zeros.gradient("b").unwrap().values().to_vec().unwrap(), vec![0.0, 0.0]);

        let ones = ones_like_block(&block()).unwrap();
        assert_eq!(ones.values().to_vec().unwrap(), vec![1.0, 1.0]);
        assert_eq!(ones.gradient_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_like_keeps_backend() {
        let dense = DenseArray::full(Shape::from(vec![2, 2]), 1.0);
        let block = block_from_array(dense).unwrap();
        let random = random_uniform_like_block(&block).unwrap();
        assert!(random.values().downcast_ref::<DenseArray>().is_some());
        assert!(random
            .values()
            .to_vec()
            .unwrap()
            .iter()
            .all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn test_block_from_array() {
        let block = block_from_array(Array3::<f64>::zeros((2, 3, 4)).into_dyn()).unwrap();
        assert_eq!(block.samples().names(), &["sample"]);
        assert_eq!(block.components()[0].names(), &["component_1"]);
        assert_eq!(block.components()[0].len(), 3);
        assert_eq!(block.properties().names(), &["property"]);

        let vector = ArrayD::<f64>::zeros(IxDyn(&[3]));
        assert!(matches!(
            block_from_array(vector),
            Err(OpsError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_remove_gradients() {
        let block = block();
        assert!(remove_gradients_block(&block, None).unwrap().gradient_names().is_empty());
        let kept = remove_gradients_block(&block, Some(&["a"][..])).unwrap();
        assert_eq!(kept.gradient_names(), vec!["b"]);
        assert!(kept.values().ptr_eq(block.values()));
    }
}
