// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Node-level error taxonomy.
//!
//! Everything here is reported by operator setup, before any execution;
//! shape and arity problems are never first discovered mid-forward.

/// Errors surfaced through the operator contract.
#[derive(Debug, thiserror::Error)]
pub enum OpError {
    /// The node wires the wrong number of inputs for its kind.
    #[error("expected {expected} input(s), got {actual}")]
    InputArity { expected: usize, actual: usize },

    /// The node wires the wrong number of outputs for its kind.
    #[error("expected {expected} output(s), got {actual}")]
    OutputArity { expected: usize, actual: usize },

    /// Input/output shapes are incompatible for the kind.
    #[error("shape mismatch: {detail}")]
    ShapeMismatch { detail: String },

    /// The configuration record is missing, of the wrong variant, or
    /// carries invalid values.
    #[error("invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    /// A tensor view rejected its backing region.
    #[error(transparent)]
    Tensor(#[from] tensor_core::TensorError),
}
