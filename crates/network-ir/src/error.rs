// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for network description parsing and validation.

/// Errors raised while reading or checking a network description.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// The document is not valid JSON for this schema.
    #[error("cannot parse network description: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document parsed but is structurally inconsistent.
    #[error("network '{network}': {detail}")]
    Validation { network: String, detail: String },

    /// The constants sidecar could not be opened or mapped.
    #[error("cannot read constants sidecar '{path}': {detail}")]
    Sidecar { path: String, detail: String },

    /// A referenced constant key is missing from the sidecar.
    #[error("constant '{key}' not found in sidecar")]
    ConstantNotFound { key: String },

    /// A sidecar tensor disagrees with its variable declaration.
    #[error("constant '{key}': {detail}")]
    ConstantMismatch { key: String, detail: String },
}
