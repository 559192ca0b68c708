// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Plan accounting for profiling and diagnostics.
//!
//! [`PlanStats`] records how much memory each storage class asked for
//! and how much the arena actually holds after reuse. The spread
//! between `scratch_requested_bytes` and `arena_bytes` is the saving
//! the liveness analysis bought.

use crate::StorageClass;

/// Cumulative accounting for one buffer plan.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct PlanStats {
    /// Number of requests per class.
    pub dedicated_count: u64,
    pub constant_count: u64,
    pub scratch_count: u64,
    pub input_count: u64,
    pub output_count: u64,
    /// Bytes requested by scratch-class tensors.
    pub scratch_requested_bytes: u64,
    /// Bytes requested by pass-through classes.
    pub resident_bytes: u64,
    /// Bytes served from previously retired regions.
    pub reused_bytes: u64,
    /// Final arena size.
    pub arena_bytes: usize,
}

impl PlanStats {
    /// Records one request against its class.
    pub(crate) fn record(&mut self, class: StorageClass, size_bytes: usize) {
        match class {
            StorageClass::Dedicated => {
                self.dedicated_count += 1;
                self.resident_bytes += size_bytes as u64;
            }
            StorageClass::Constant => {
                self.constant_count += 1;
                self.resident_bytes += size_bytes as u64;
            }
            StorageClass::Scratch => {
                self.scratch_count += 1;
                self.scratch_requested_bytes += size_bytes as u64;
            }
            StorageClass::Input => {
                self.input_count += 1;
                self.resident_bytes += size_bytes as u64;
            }
            StorageClass::Output => {
                self.output_count += 1;
                self.resident_bytes += size_bytes as u64;
            }
        }
    }

    /// Bytes the arena saved over giving every scratch tensor its own
    /// buffer. Zero when reuse is disabled.
    pub fn saved_bytes(&self) -> u64 {
        self.scratch_requested_bytes
            .saturating_sub(self.arena_bytes as u64)
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        let arena_kb = self.arena_bytes as f64 / 1024.0;
        let saved_kb = self.saved_bytes() as f64 / 1024.0;
        format!(
            "{} scratch tensors in {:.1} KB arena ({:.1} KB saved by reuse), \
             {} dedicated, {} constant, {} inputs, {} outputs",
            self.scratch_count,
            arena_kb,
            saved_kb,
            self.dedicated_count,
            self.constant_count,
            self.input_count,
            self.output_count,
        )
    }
}
