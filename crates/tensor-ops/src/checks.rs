// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The metadata checks toggle.
//!
//! Operations compare label sets before doing numeric work. Those
//! comparisons can be skipped for speed: the values of a successful result
//! never change, only whether invalid input is caught early.
//!
//! The process-wide default is set with [`set_checks_enabled`] (or
//! [`OpsConfig::apply`](crate::OpsConfig::apply)). [`with_checks`] overrides
//! it for the current thread only, for the duration of a closure.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};

static CHECKS: AtomicBool = AtomicBool::new(true);

thread_local! {
    static OVERRIDE: Cell<Option<bool>> = const { Cell::new(None) };
}

/// Whether metadata checks run on the current thread.
pub fn checks_enabled() -> bool {
    OVERRIDE
        .with(Cell::get)
        .unwrap_or_else(|| CHECKS.load(Ordering::Relaxed))
}

/// Sets the process-wide default.
pub fn set_checks_enabled(enabled: bool) {
    CHECKS.store(enabled, Ordering::Relaxed);
}

/// Runs `f` with checks forced on or off for the current thread.
///
/// The previous state is restored afterwards, including on panic.
///
/// # Examples
/// ```
/// use tensor_ops::{checks_enabled, with_checks};
/// let inside = with_checks(false, checks_enabled);
/// assert!(!inside);
/// ```
pub fn with_checks<R>(enabled: bool, f: impl FnOnce() -> R) -> R {
    struct Restore(Option<bool>);
    impl Drop for Restore {
        fn drop(&mut self) {
            let previous = self.0;
            OVERRIDE.with(|o| o.set(previous));
        }
    }

    let _restore = Restore(OVERRIDE.with(|o| o.replace(Some(enabled))));
    f()
}
