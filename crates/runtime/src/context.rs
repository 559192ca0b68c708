// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The runtime context: the loaded graph, its storage, and the public
//! introspection surface.
//!
//! A context is only ever obtained from a successful
//! [`Context::initialize`]; there is no unloaded-but-alive state.
//! Dropping it (or calling [`Context::release`]) releases every owned
//! buffer and every node's local state; move semantics make a second
//! teardown unrepresentable.

use crate::storage::{Region, StorageReport, TensorStorage};
use crate::{loader, RuntimeError, RuntimeOptions};
use buffer_planner::PlanStats;
use network_ir::NetworkDescription;
use op_catalog::{OpKind, Operator};
use tensor_core::{Shape, TensorMeta, TensorView, TensorViewMut};

/// One loaded tensor descriptor: typed metadata plus its storage region.
pub(crate) struct Variable {
    pub(crate) name: String,
    pub(crate) meta: TensorMeta,
    pub(crate) region: Region,
}

/// One loaded operator node with its exclusively owned local state.
pub(crate) struct Node {
    pub(crate) name: String,
    pub(crate) kind: OpKind,
    pub(crate) inputs: Vec<usize>,
    pub(crate) outputs: Vec<usize>,
    pub(crate) op: Box<dyn Operator>,
}

/// A fully loaded network, ready for forward execution.
///
/// `forward` takes `&mut self`: one forward call at a time per context,
/// enforced at compile time, because scratch regions are reused
/// destructively within a call. Run concurrent inference with one
/// context per thread.
pub struct Context {
    pub(crate) name: String,
    pub(crate) variables: Vec<Variable>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) storage: TensorStorage,
    /// Designated input variable ids, in caller binding order.
    pub(crate) inputs: Vec<usize>,
    /// Designated output variable ids, in caller binding order.
    pub(crate) outputs: Vec<usize>,
    pub(crate) plan_stats: PlanStats,
    pub(crate) options: RuntimeOptions,
}

impl Context {
    /// Loads a network with default options.
    ///
    /// See [`Context::initialize_with`].
    pub fn initialize(description: NetworkDescription) -> Result<Self, RuntimeError> {
        Self::initialize_with(description, RuntimeOptions::default())
    }

    /// Loads a network: version gate, structural validation, liveness
    /// derivation, buffer planning, storage materialization, node
    /// instantiation. Any failure aborts the load; partially built
    /// state unwinds through ownership, leaving nothing allocated.
    pub fn initialize_with(
        description: NetworkDescription,
        options: RuntimeOptions,
    ) -> Result<Self, RuntimeError> {
        loader::build(description, options)
    }

    /// The network's declared name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of designated input buffers.
    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Number of designated output buffers.
    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Number of loaded operator nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Total element count of input `index`.
    pub fn input_size(&self, index: usize) -> Result<usize, RuntimeError> {
        Ok(self.input_meta(index)?.num_elements())
    }

    /// Rank of input `index`.
    pub fn input_rank(&self, index: usize) -> Result<usize, RuntimeError> {
        Ok(self.input_meta(index)?.shape().rank())
    }

    /// Shape of input `index`.
    pub fn input_shape(&self, index: usize) -> Result<&Shape, RuntimeError> {
        Ok(self.input_meta(index)?.shape())
    }

    /// Total element count of output `index`.
    pub fn output_size(&self, index: usize) -> Result<usize, RuntimeError> {
        Ok(self.output_meta(index)?.num_elements())
    }

    /// Rank of output `index`.
    pub fn output_rank(&self, index: usize) -> Result<usize, RuntimeError> {
        Ok(self.output_meta(index)?.shape().rank())
    }

    /// Shape of output `index`.
    pub fn output_shape(&self, index: usize) -> Result<&Shape, RuntimeError> {
        Ok(self.output_meta(index)?.shape())
    }

    /// Read access to input `index`'s backing storage.
    pub fn input_view(&self, index: usize) -> Result<TensorView<'_>, RuntimeError> {
        let var = self.io_variable("input", &self.inputs, index)?;
        TensorView::new(&var.meta, self.storage.bytes(&var.region)).map_err(|e| {
            RuntimeError::InitVariable {
                name: var.name.clone(),
                detail: e.to_string(),
            }
        })
    }

    /// Write access to input `index`'s backing storage, for callers that
    /// fill inputs in place instead of passing buffers to `forward`.
    pub fn input_view_mut(&mut self, index: usize) -> Result<TensorViewMut<'_>, RuntimeError> {
        let count = self.inputs.len();
        if index >= count {
            return Err(RuntimeError::InvalidBufferIndex {
                role: "input",
                index,
                count,
            });
        }
        let var = &self.variables[self.inputs[index]];
        TensorViewMut::new(&var.meta, self.storage.bytes_mut(&var.region)).map_err(|e| {
            RuntimeError::InitVariable {
                name: var.name.clone(),
                detail: e.to_string(),
            }
        })
    }

    /// Read access to output `index`'s backing storage, valid after a
    /// forward call.
    pub fn output_view(&self, index: usize) -> Result<TensorView<'_>, RuntimeError> {
        let var = self.io_variable("output", &self.outputs, index)?;
        TensorView::new(&var.meta, self.storage.bytes(&var.region)).map_err(|e| {
            RuntimeError::InitVariable {
                name: var.name.clone(),
                detail: e.to_string(),
            }
        })
    }

    /// Buffer-plan accounting from load time.
    pub fn plan_stats(&self) -> &PlanStats {
        &self.plan_stats
    }

    /// Storage accounting: what the context owns right now.
    pub fn storage_report(&self) -> StorageReport {
        self.storage.report()
    }

    /// The options the context was loaded with.
    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// Tears the context down: every owned buffer and every node's
    /// local state is released, in reverse dependency order, exactly
    /// once. Equivalent to dropping; spelled out for callers mirroring
    /// an explicit-release API.
    pub fn release(self) {
        tracing::debug!("releasing context '{}'", self.name);
        drop(self);
    }

    // ── Private helpers ────────────────────────────────────────

    fn input_meta(&self, index: usize) -> Result<&TensorMeta, RuntimeError> {
        Ok(&self.io_variable("input", &self.inputs, index)?.meta)
    }

    fn output_meta(&self, index: usize) -> Result<&TensorMeta, RuntimeError> {
        Ok(&self.io_variable("output", &self.outputs, index)?.meta)
    }

    fn io_variable(
        &self,
        role: &'static str,
        ids: &[usize],
        index: usize,
    ) -> Result<&Variable, RuntimeError> {
        let &id = ids.get(index).ok_or(RuntimeError::InvalidBufferIndex {
            role,
            index,
            count: ids.len(),
        })?;
        Ok(&self.variables[id])
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("name", &self.name)
            .field("variables", &self.variables.len())
            .field("nodes", &self.nodes.len())
            .field("inputs", &self.inputs.len())
            .field("outputs", &self.outputs.len())
            .field("storage", &self.storage)
            .finish()
    }
}
