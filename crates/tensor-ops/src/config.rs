// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Operations configuration loaded from TOML files or constructed
//! programmatically.
//!
//! # TOML Format
//! ```toml
//! checks = true
//! warnings = true
//! ```

use crate::{set_checks_enabled, set_warnings_enabled, OpsError};
use std::path::Path;

/// Process-wide defaults for the operations layer.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OpsConfig {
    /// Whether operations compare label sets before numeric work.
    #[serde(default = "default_true")]
    pub checks: bool,
    /// Whether diagnostics are emitted as `tracing` warnings.
    #[serde(default = "default_true")]
    pub warnings: bool,
}

fn default_true() -> bool {
    true
}

impl OpsConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, OpsError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OpsError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, OpsError> {
        toml::from_str(toml_str).map_err(|e| OpsError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, OpsError> {
        toml::to_string_pretty(self)
            .map_err(|e| OpsError::Config(format!("TOML serialise error: {e}")))
    }

    /// Installs this configuration as the process-wide default.
    ///
    /// Scoped overrides from [`with_checks`](crate::with_checks) still take
    /// precedence on their thread.
    pub fn apply(&self) {
        tracing::debug!(checks = self.checks, warnings = self.warnings, "applying ops config");
        set_checks_enabled(self.checks);
        set_warnings_enabled(self.warnings);
    }
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            checks: true,
            warnings: true,
        }
    }
}
