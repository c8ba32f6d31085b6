// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for labels, blocks and tensor maps.

use array_core::ArrayError;

/// Errors that can occur when building or querying the data model.
#[derive(Debug, thiserror::Error)]
pub enum TensorMapError {
    /// Two label sets (or axes) have incompatible column names.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// An array extent disagrees with the length of its label set.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A label set contains the same row twice.
    #[error("duplicate label {row:?} for names {names:?}")]
    DuplicateLabel { names: Vec<String>, row: Vec<i32> },

    /// The number of values does not fit the number of names.
    #[error("arity mismatch: {0}")]
    ArityMismatch(String),

    /// A label name is empty, not a valid identifier, or repeated.
    #[error("invalid label name '{0}'")]
    InvalidName(String),

    /// A gradient with this parameter name is already attached.
    #[error("gradient for parameter '{0}' already exists")]
    DuplicateGradient(String),

    /// The gradient samples are malformed or reference missing parent rows.
    #[error("invalid gradient samples for '{parameter}': {detail}")]
    InvalidGradientSamples { parameter: String, detail: String },

    /// The gradient block itself is not acceptable as a gradient.
    #[error("invalid gradient '{parameter}': {detail}")]
    InvalidGradient { parameter: String, detail: String },

    /// No gradient with this parameter name is attached.
    #[error("no gradient for parameter '{0}'")]
    GradientNotFound(String),

    /// Keys and blocks have different lengths.
    #[error("got {keys} keys but {blocks} blocks")]
    LengthMismatch { keys: usize, blocks: usize },

    /// The requested key does not exist in the tensor map.
    #[error("key {0:?} not found")]
    KeyNotFound(Vec<i32>),

    /// Mutable access was requested to storage shared with another block.
    #[error("values are shared with another block and cannot be mutated")]
    Aliased,

    /// A numeric dispatch failed.
    #[error(transparent)]
    Array(#[from] ArrayError),
}
