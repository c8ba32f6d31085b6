// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-ops
//!
//! Operations over labeled tensor maps.
//!
//! Every operation is a pure function: it validates its operands, then
//! dispatches the numeric work to the array backend of the input blocks and
//! returns a new tensor map (or block). Gradients are carried along
//! analytically.
//!
//! - Comparison: [`equal_metadata`], [`equal`], [`allclose`].
//! - Restructuring: [`slice`], [`join`], [`drop_blocks`], [`unique_metadata`].
//! - Linear algebra: [`dot`], [`lstsq`], [`solve`].
//! - Reductions: [`sum_over_samples`], [`mean_over_samples`],
//!   [`var_over_samples`], [`std_over_samples`].
//! - Element-wise: [`add`], [`subtract`], [`multiply`], [`divide`], [`pow`],
//!   [`abs`].
//!
//! # Metadata checks
//! Label comparisons can be switched off process-wide with
//! [`set_checks_enabled`] or [`OpsConfig`], or for one thread with
//! [`with_checks`].
//!
//! # Example
//! ```
//! use array_core::ndarray::arr2;
//! use tensor_map::{Block, Labels, TensorMap};
//!
//! let block = Block::new(
//!     arr2(&[[1.0, 2.0], [3.0, 4.0]]).into_dyn(),
//!     Labels::new(["structure"], vec![0, 1]).unwrap(),
//!     vec![],
//!     Labels::range("n", 2).unwrap(),
//! )
//! .unwrap();
//! let tensor = TensorMap::new(Labels::new(["center"], vec![6]).unwrap(), vec![block]).unwrap();
//!
//! let doubled = tensor_ops::multiply(&tensor, 2.0).unwrap();
//! let summed = tensor_ops::sum_over_samples(&doubled, &["structure"]).unwrap();
//! assert_eq!(summed.block(&[6]).unwrap().values().to_vec().unwrap(), vec![8.0, 12.0]);
//! ```

mod checks;
mod config;
mod error;
pub mod ops;
mod warning;

pub use checks::{checks_enabled, set_checks_enabled, with_checks};
pub use config::OpsConfig;
pub use error::OpsError;
pub use ops::*;
pub use warning::{set_warnings_enabled, warnings_enabled, Warning};
