// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor map operations.

use crate::MetadataReport;
use array_core::ArrayError;
use tensor_map::TensorMapError;

/// Errors that can occur while running an operation.
#[derive(Debug, thiserror::Error)]
pub enum OpsError {
    /// Operand metadata (names, rows, or their order) is incompatible.
    #[error("schema mismatch in {op}: {detail}")]
    SchemaMismatch { op: &'static str, detail: String },

    /// Two tensor maps do not have the same set of keys.
    #[error("key mismatch in {op}: {detail}")]
    KeyMismatch { op: &'static str, detail: String },

    /// A requested key is not present in the tensor map.
    #[error("unknown keys in {op}: {keys:?}")]
    UnknownKey { op: &'static str, keys: Vec<Vec<i32>> },

    /// An operation-specific precondition does not hold.
    #[error("invalid argument for {op}: {detail}")]
    InvalidArgument { op: &'static str, detail: String },

    /// Values differ in a `_raise` comparison.
    #[error("values are not equal: {0}")]
    NotEqual(String),

    /// Metadata differs in a `_raise` comparison.
    #[error("metadata mismatch: {0}")]
    MetadataMismatch(MetadataReport),

    /// The operations configuration could not be loaded or saved.
    #[error("configuration error: {0}")]
    Config(String),

    /// A numeric dispatch failed.
    #[error("array error: {0}")]
    Array(#[from] ArrayError),

    /// The data model rejected a result.
    #[error("tensor map error: {0}")]
    TensorMap(#[from] TensorMapError),
}

impl OpsError {
    /// Whether the failure comes from a missing or mixed array backend.
    pub fn is_unsupported_backend(&self) -> bool {
        matches!(
            self,
            OpsError::Array(ArrayError::UnsupportedBackend { .. })
                | OpsError::TensorMap(TensorMapError::Array(ArrayError::UnsupportedBackend { .. }))
        )
    }

    pub(crate) fn schema(op: &'static str, detail: impl Into<String>) -> Self {
        OpsError::SchemaMismatch {
            op,
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid(op: &'static str, detail: impl Into<String>) -> Self {
        OpsError::InvalidArgument {
            op,
            detail: detail.into(),
        }
    }
}
