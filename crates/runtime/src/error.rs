// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Context-level error taxonomy.
//!
//! Node-level failures ([`op_catalog::OpError`]) arrive wrapped in
//! [`RuntimeError::Function`] with the offending node's name and index.
//! Everything is fail-fast: an `initialize` error tears down all
//! partial state, a `forward` error aborts the remaining node sequence.

use op_catalog::OpError;

/// Errors raised by context initialization, introspection and forward
/// execution.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The description's format version is not consumable by this
    /// runtime. Raised before anything is allocated.
    #[error("network format version {found} is not supported (runtime supports {supported})")]
    VersionMismatch { found: String, supported: String },

    /// The description failed parsing or structural validation.
    #[error(transparent)]
    Network(#[from] network_ir::NetworkError),

    /// The buffer planner rejected the derived liveness windows.
    #[error(transparent)]
    Plan(#[from] buffer_planner::PlanError),

    /// A variable's storage could not be materialized.
    #[error("variable '{name}': {detail}")]
    InitVariable { name: String, detail: String },

    /// A function declares a tag the catalog does not know.
    #[error("unknown operator '{tag}' in function '{function}'")]
    UnknownFunction { function: String, tag: String },

    /// A node's bindings alias each other; executing it would be
    /// unsound.
    #[error("function '{function}' (node {index}) binds aliased buffers: {detail}")]
    BindingAlias {
        function: String,
        index: usize,
        detail: String,
    },

    /// A node-level failure, attributed to its node.
    #[error("function '{function}' (node {index}): {source}")]
    Function {
        function: String,
        index: usize,
        #[source]
        source: OpError,
    },

    /// An introspection call used an out-of-range buffer index.
    #[error("invalid {role} buffer index {index} (count is {count})")]
    InvalidBufferIndex {
        role: &'static str,
        index: usize,
        count: usize,
    },

    /// A forward call supplied the wrong number of buffers.
    #[error("expected {expected} {role} buffer(s), got {actual}")]
    BufferCountMismatch {
        role: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A forward call supplied a buffer of the wrong element count.
    #[error("{role} buffer {index}: expected {expected} elements, got {actual}")]
    BufferSizeMismatch {
        role: &'static str,
        index: usize,
        expected: usize,
        actual: usize,
    },

    /// Options parsing failed.
    #[error("configuration error: {0}")]
    Config(String),
}
