// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Runtime options loaded from TOML files or constructed
//! programmatically.
//!
//! # TOML Format
//! ```toml
//! reuse_scratch = true
//! audit_bindings = true
//! ```

use crate::RuntimeError;
use std::path::Path;

/// Tunables for context initialization.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RuntimeOptions {
    /// Time-multiplex scratch-class tensors through the shared arena.
    /// Disabling gives every scratch tensor a dedicated buffer; outputs
    /// are bit-identical either way, at a memory cost.
    #[serde(default = "default_true")]
    pub reuse_scratch: bool,

    /// Re-check the planner's aliasing invariant and every node's
    /// input/output disjointness at load time.
    #[serde(default = "default_true")]
    pub audit_bindings: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            reuse_scratch: true,
            audit_bindings: true,
        }
    }
}

impl RuntimeOptions {
    /// Loads options from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RuntimeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::Config(format!("cannot read options '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses options from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, RuntimeError> {
        toml::from_str(toml_str)
            .map_err(|e| RuntimeError::Config(format!("TOML parse error: {e}")))
    }
}
