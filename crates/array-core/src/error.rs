// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for array dispatch.

use crate::Shape;

/// Errors that can occur while dispatching numeric work to a backend.
#[derive(Debug, thiserror::Error)]
pub enum ArrayError {
    /// No backend is registered for the array type, or two operands come
    /// from different backends.
    #[error("unsupported backend for {op}: no dispatch available for arrays of type '{origin}'")]
    UnsupportedBackend { op: &'static str, origin: String },

    /// Two arrays have incompatible shapes for the requested operation.
    #[error("incompatible shapes for {op}: {lhs} vs {rhs}")]
    ShapeMismatch {
        op: &'static str,
        lhs: Shape,
        rhs: Shape,
    },

    /// The provided buffer does not hold as many elements as the shape requires.
    #[error("buffer size mismatch: shape needs {expected} elements, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// An axis or index argument is outside the array.
    #[error("invalid argument for {op}: {detail}")]
    InvalidArgument { op: &'static str, detail: String },

    /// A numeric kernel failed (e.g., a singular system).
    #[error("numeric error in {op}: {detail}")]
    Numeric { op: &'static str, detail: String },
}
