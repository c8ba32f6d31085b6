// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Non-fatal diagnostics, reported through `tracing` at `WARN` level.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

static WARNINGS: AtomicBool = AtomicBool::new(true);

/// A diagnostic that never replaces an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    /// Slicing left some, but not all, blocks without elements.
    SomeBlocksEmpty,
    /// Slicing left every block without elements.
    AllBlocksEmpty,
    /// `lstsq` was called without `rcond`.
    DefaultRcond,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::SomeBlocksEmpty => {
                write!(f, "Some TensorBlocks in the sliced TensorMap are now empty")
            }
            Warning::AllBlocksEmpty => {
                write!(f, "All TensorBlocks in the sliced TensorMap are now empty")
            }
            Warning::DefaultRcond => write!(
                f,
                "rcond is not set: the default singular value cutoff depends on the backend"
            ),
        }
    }
}

/// Whether warnings are emitted.
pub fn warnings_enabled() -> bool {
    WARNINGS.load(Ordering::Relaxed)
}

/// Turns warnings on or off for the whole process.
pub fn set_warnings_enabled(enabled: bool) {
    WARNINGS.store(enabled, Ordering::Relaxed);
}

pub(crate) fn emit(warning: Warning) {
    if warnings_enabled() {
        tracing::warn!(kind = ?warning, "{warning}");
    }
}
