// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-map
//!
//! The labeled, block-sparse data model.
//!
//! - [`Labels`]: named columns of unique integer tuples, one per axis entry.
//! - [`Block`]: one array with samples, components and properties axes,
//!   plus gradient sub-blocks attached through a [`BlockBuilder`].
//! - [`TensorMap`]: blocks indexed by the rows of a key label set.
//!
//! # Example
//! ```
//! use array_core::ndarray::{ArrayD, IxDyn};
//! use tensor_map::{Block, Labels, TensorMap};
//!
//! let block = Block::new(
//!     ArrayD::<f64>::zeros(IxDyn(&[2, 3])),
//!     Labels::new(["structure"], vec![0, 1]).unwrap(),
//!     vec![],
//!     Labels::range("n", 3).unwrap(),
//! )
//! .unwrap();
//! let tensor = TensorMap::new(Labels::single(), vec![block]).unwrap();
//! assert_eq!(tensor.block(&[0]).unwrap().samples().len(), 2);
//! ```

pub mod block;
mod error;
pub mod labels;
mod tensor;

pub use block::{Block, BlockBuilder, GRADIENT_SAMPLE};
pub use error::TensorMapError;
pub use labels::{Labels, LabelsComparison};
pub use tensor::TensorMap;
