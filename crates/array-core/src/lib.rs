// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # array-core
//!
//! Backend-agnostic `f64` arrays and the dispatch layer beneath labeled
//! tensor maps.
//!
//! This crate provides:
//! - [`Array`]: a shared, type-erased handle over any [`ArrayData`].
//! - [`Backend`]: the numeric capability contract, one implementation per
//!   concrete array type, selected at runtime through the registry.
//! - Built-in backends for `ndarray::ArrayD<f64>` ([`NdArrayBackend`]) and
//!   the flat-buffer [`DenseArray`] ([`DenseBackend`]).
//! - [`Shape`]: extent descriptors and broadcasting rules.
//!
//! # Design Goals
//! - Nothing above this crate branches on a concrete array type.
//! - Arguments are validated before a backend sees them.
//! - Clean error types via `thiserror`.

mod array;
mod backend;
mod dense;
mod dense_backend;
mod error;
mod kernels;
mod linalg;
mod ndarray_backend;
pub mod registry;
mod shape;

pub use array::{Array, ArrayData};
pub use backend::{Backend, BinaryOp, UnaryOp};
pub use dense::DenseArray;
pub use dense_backend::DenseBackend;
pub use error::ArrayError;
pub use ndarray_backend::NdArrayBackend;
pub use registry::{backend_for, register_backend, registered_backends};
pub use shape::Shape;

pub use ndarray;
