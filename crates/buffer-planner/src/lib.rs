// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # buffer-planner
//!
//! Static memory planning for tensor buffers on memory-constrained
//! inference targets.
//!
//! The runtime executes a fixed node sequence, so every tensor's
//! lifetime is known up front as a window of node indices (its
//! [`Liveness`]). This crate turns those windows into a concrete layout:
//!
//! - Tensors declared [`StorageClass::Scratch`] share one byte arena.
//!   A scratch tensor may occupy the same offsets as a previously
//!   retired tensor (one whose window closed strictly before the new
//!   window opens). Freed regions are coalesced and picked best-fit;
//!   when nothing fits, the arena grows by exactly the deficit.
//! - Every other class passes through: dedicated heap buffers, baked
//!   constants, and the designated forward-call inputs/outputs are
//!   never time-multiplexed.
//!
//! # The invariant everything else relies on
//!
//! Two tensors assigned overlapping arena bytes never have overlapping
//! liveness windows. The executor's buffer binding is only sound
//! because of this guarantee; it is property-tested over randomized
//! interval sets in this crate.
//!
//! # Example
//! ```
//! use buffer_planner::{plan, Liveness, PlanRequest, StorageClass};
//!
//! let requests = vec![
//!     PlanRequest::new(64, StorageClass::Scratch, Liveness::new(0, 1)),
//!     // Retired before the next window opens: same bytes are reused.
//!     PlanRequest::new(64, StorageClass::Scratch, Liveness::new(2, 3)),
//! ];
//! let plan = plan(&requests, true).unwrap();
//! assert_eq!(plan.arena_bytes, 64);
//! ```

mod error;
mod liveness;
mod planner;
mod stats;

pub use error::PlanError;
pub use liveness::{Liveness, PlanRequest, StorageClass};
pub use planner::{plan, BufferPlan, Placement};
pub use stats::PlanStats;
