// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # network-ir
//!
//! The serialized network description: the versioned document an
//! external toolchain produces and the runtime consumes.
//!
//! A [`NetworkDescription`] declares:
//! - every tensor variable (shape, element kind, optional quantization
//!   scale, storage-class hint, optional baked constant data),
//! - every function node (operator tag, wired variable ids, per-kind
//!   configuration), in an order that is **trusted** as topological —
//!   the runtime never re-derives it,
//! - the designated input and output variable ids.
//!
//! The wire form is JSON (the graph is metadata-sized); bulky baked
//! constants can live in a SafeTensors sidecar referenced per variable
//! by `constant_key` and resolved with
//! [`NetworkDescription::load_constants`].
//!
//! [`NetworkDescription::validate`] checks structural consistency only.
//! Graph correctness — that the declared order really is a valid
//! schedule — is the producer's contract.

mod constants;
mod description;
mod error;

pub use buffer_planner::StorageClass;
pub use description::{
    FormatVersion, FunctionDecl, NetworkDescription, VariableDecl, FORMAT_MAJOR_VERSION,
    FORMAT_MINOR_VERSION,
};
pub use error::NetworkError;
