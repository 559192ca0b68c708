// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for buffer planning.

/// Errors that can occur while planning tensor storage.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// A request's liveness window closes before it opens.
    #[error("request {index}: liveness window closes at {last_use} before opening at {first_use}")]
    InvalidLiveness {
        index: usize,
        first_use: usize,
        last_use: usize,
    },

    /// Two simultaneously live requests were assigned overlapping arena
    /// bytes. Never produced by the planner itself; surfaced by the
    /// post-plan audit.
    #[error("requests {first} and {second} overlap in both bytes and liveness")]
    AliasingViolation { first: usize, second: usize },
}
