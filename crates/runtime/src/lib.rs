// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # runtime
//!
//! The inference-only runtime context for statically scheduled
//! feed-forward networks.
//!
//! [`Context::initialize`] parses a [`network_ir::NetworkDescription`]
//! into typed tensor descriptors and operator nodes, plans every
//! tensor's storage through `buffer-planner` (dedicated buffers, baked
//! constants, a liveness-multiplexed scratch arena, designated I/O
//! endpoints), and instantiates each node's operator from
//! `op-catalog`. [`Context::forward`] then runs the node sequence
//! synchronously, caller buffers in, caller buffers out.
//!
//! # Example
//! ```
//! use network_ir::{FormatVersion, FunctionDecl, NetworkDescription, StorageClass, VariableDecl};
//! use op_catalog::OpConfig;
//! use runtime::Context;
//!
//! let description = NetworkDescription {
//!     version: FormatVersion::supported(),
//!     name: "clamp".into(),
//!     variables: vec![
//!         VariableDecl::new("x", vec![1, 4], StorageClass::Input),
//!         VariableDecl::new("y", vec![1, 4], StorageClass::Output),
//!     ],
//!     functions: vec![FunctionDecl::new("relu0", "relu", vec![0], vec![1], OpConfig::None)],
//!     inputs: vec![0],
//!     outputs: vec![1],
//! };
//!
//! let mut ctx = Context::initialize(description).unwrap();
//! let input = [-2.0f32, 0.0, 3.5, -0.1];
//! let mut output = [0.0f32; 4];
//! ctx.forward(&[&input], &mut [&mut output[..]]).unwrap();
//! assert_eq!(output, [0.0, 0.0, 3.5, 0.0]);
//! ctx.release();
//! ```
//!
//! # Concurrency
//! Execution is single-threaded and synchronous. `forward` takes
//! `&mut self` because scratch storage is reused destructively within a
//! call; run one context per concurrent caller. Contexts share no
//! mutable state with each other.

mod config;
mod context;
mod error;
mod executor;
mod loader;
mod storage;

pub use config::RuntimeOptions;
pub use context::Context;
pub use error::RuntimeError;
pub use storage::StorageReport;
