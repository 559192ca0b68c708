// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Context-owned tensor storage and the per-node binder.
//!
//! All tensor bytes live here, split by storage class:
//! - one shared scratch arena (time-multiplexed per the buffer plan),
//! - dedicated buffers,
//! - baked constant buffers,
//! - designated forward-call input and output buffers.
//!
//! Every variable resolves to a [`Region`] into exactly one of these.
//! The binder hands a node disjoint views over its wired regions; the
//! disjointness is the planner's invariant plus the loader's per-node
//! audit, which together justify the single `unsafe` block below.

use crate::context::Variable;
use op_catalog::NodeIo;
use tensor_core::{TensorError, TensorView, TensorViewMut};

/// Where one variable's bytes live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Region {
    /// `len` bytes at `offset` in the scratch arena.
    Arena { offset: usize, len: usize },
    /// A whole dedicated buffer.
    Dedicated { index: usize },
    /// A whole baked-constant buffer.
    Constant { index: usize },
    /// The designated input buffer at this binding position.
    Input { index: usize },
    /// The designated output buffer at this binding position.
    Output { index: usize },
}

impl Region {
    /// Whether two regions can refer to the same bytes.
    pub(crate) fn overlaps(&self, other: &Region) -> bool {
        match (self, other) {
            (
                Region::Arena { offset: a, len: la },
                Region::Arena { offset: b, len: lb },
            ) => *la > 0 && *lb > 0 && a < &(b + lb) && b < &(a + la),
            (Region::Dedicated { index: a }, Region::Dedicated { index: b })
            | (Region::Constant { index: a }, Region::Constant { index: b })
            | (Region::Input { index: a }, Region::Input { index: b })
            | (Region::Output { index: a }, Region::Output { index: b }) => a == b,
            _ => false,
        }
    }
}

/// Accounting snapshot for diagnostics and teardown tests.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StorageReport {
    pub arena_bytes: usize,
    pub dedicated_buffers: usize,
    pub dedicated_bytes: usize,
    pub constant_buffers: usize,
    pub constant_bytes: usize,
    pub input_buffers: usize,
    pub output_buffers: usize,
}

/// The context's owned byte storage.
pub(crate) struct TensorStorage {
    arena: Vec<u8>,
    dedicated: Vec<Vec<u8>>,
    constants: Vec<Vec<u8>>,
    inputs: Vec<Vec<u8>>,
    outputs: Vec<Vec<u8>>,
}

impl TensorStorage {
    pub(crate) fn new(arena_bytes: usize) -> Self {
        Self {
            arena: vec![0u8; arena_bytes],
            dedicated: Vec::new(),
            constants: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Adds a zero-filled dedicated buffer, returning its region.
    pub(crate) fn add_dedicated(&mut self, size_bytes: usize) -> Region {
        self.dedicated.push(vec![0u8; size_bytes]);
        Region::Dedicated {
            index: self.dedicated.len() - 1,
        }
    }

    /// Adds a baked constant buffer, returning its region.
    pub(crate) fn add_constant(&mut self, bytes: Vec<u8>) -> Region {
        self.constants.push(bytes);
        Region::Constant {
            index: self.constants.len() - 1,
        }
    }

    /// Adds a designated input buffer at the next binding position.
    pub(crate) fn add_input(&mut self, size_bytes: usize) -> Region {
        self.inputs.push(vec![0u8; size_bytes]);
        Region::Input {
            index: self.inputs.len() - 1,
        }
    }

    /// Adds a designated output buffer at the next binding position.
    pub(crate) fn add_output(&mut self, size_bytes: usize) -> Region {
        self.outputs.push(vec![0u8; size_bytes]);
        Region::Output {
            index: self.outputs.len() - 1,
        }
    }

    /// Read access to a region's bytes.
    pub(crate) fn bytes(&self, region: &Region) -> &[u8] {
        match *region {
            Region::Arena { offset, len } => &self.arena[offset..offset + len],
            Region::Dedicated { index } => &self.dedicated[index],
            Region::Constant { index } => &self.constants[index],
            Region::Input { index } => &self.inputs[index],
            Region::Output { index } => &self.outputs[index],
        }
    }

    /// Write access to a region's bytes.
    pub(crate) fn bytes_mut(&mut self, region: &Region) -> &mut [u8] {
        match *region {
            Region::Arena { offset, len } => &mut self.arena[offset..offset + len],
            Region::Dedicated { index } => &mut self.dedicated[index],
            Region::Constant { index } => &mut self.constants[index],
            Region::Input { index } => &mut self.inputs[index],
            Region::Output { index } => &mut self.outputs[index],
        }
    }

    /// Resolves one node's wired variables into bound views.
    ///
    /// The exclusive borrow of `self` keeps any other storage access out
    /// for as long as the returned `NodeIo` lives; disjointness *within*
    /// the node is the loader's audited invariant.
    pub(crate) fn bind_node<'a>(
        &'a mut self,
        variables: &'a [Variable],
        input_ids: &[usize],
        output_ids: &[usize],
    ) -> Result<NodeIo<'a>, TensorError> {
        // Gather raw region extents first so no slice borrows overlap
        // the collection phase.
        let in_raw: Vec<(*const u8, usize)> = input_ids
            .iter()
            .map(|&id| {
                let b = self.bytes(&variables[id].region);
                (b.as_ptr(), b.len())
            })
            .collect();
        let out_raw: Vec<(*mut u8, usize)> = output_ids
            .iter()
            .map(|&id| {
                let b = self.bytes_mut(&variables[id].region);
                (b.as_mut_ptr(), b.len())
            })
            .collect();

        // SAFETY: `self` is exclusively borrowed for 'a, so nothing else
        // can touch the storage while the views live. Output regions are
        // pairwise disjoint and disjoint from input regions (checked at
        // load by the binding audit; guaranteed across nodes by the
        // planner's liveness invariant), so the mutable slices alias
        // neither each other nor the shared ones.
        unsafe {
            let mut inputs = Vec::with_capacity(in_raw.len());
            for (&id, (ptr, len)) in input_ids.iter().zip(in_raw) {
                let data = std::slice::from_raw_parts(ptr, len);
                inputs.push(TensorView::new(&variables[id].meta, data)?);
            }
            let mut outputs = Vec::with_capacity(out_raw.len());
            for (&id, (ptr, len)) in output_ids.iter().zip(out_raw) {
                let data = std::slice::from_raw_parts_mut(ptr, len);
                outputs.push(TensorViewMut::new(&variables[id].meta, data)?);
            }
            Ok(NodeIo::new(inputs, outputs))
        }
    }

    /// Accounting snapshot.
    pub(crate) fn report(&self) -> StorageReport {
        StorageReport {
            arena_bytes: self.arena.len(),
            dedicated_buffers: self.dedicated.len(),
            dedicated_bytes: self.dedicated.iter().map(Vec::len).sum(),
            constant_buffers: self.constants.len(),
            constant_bytes: self.constants.iter().map(Vec::len).sum(),
            input_buffers: self.inputs.len(),
            output_buffers: self.outputs.len(),
        }
    }
}

impl std::fmt::Debug for TensorStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let r = self.report();
        f.debug_struct("TensorStorage")
            .field("arena_bytes", &r.arena_bytes)
            .field("dedicated", &r.dedicated_buffers)
            .field("constants", &r.constant_buffers)
            .field("inputs", &r.input_buffers)
            .field("outputs", &r.output_buffers)
            .finish()
    }
}
