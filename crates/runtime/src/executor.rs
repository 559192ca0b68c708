// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Synchronous forward execution.
//!
//! One forward call: bind caller inputs, run every node in the order
//! fixed at load time, hand back the designated outputs. Strictly
//! sequential, no suspension points; the node order is both the
//! data-dependency order and the liveness order the buffer plan was
//! computed against, so reordering would be unsound.

use crate::context::Context;
use crate::RuntimeError;
use op_catalog::OpError;
use std::time::Instant;

impl Context {
    /// Runs the network: `inputs` are copied into the designated input
    /// tensors, every node executes in stored order, and the designated
    /// output tensors are copied into `outputs`.
    ///
    /// Buffer counts and element counts are checked before anything
    /// executes; a mismatch fails the call with no partial computation.
    /// A node failure aborts the remaining sequence — buffers already
    /// written keep their last state and the whole call's output is
    /// undefined, but the context stays structurally valid for another
    /// call or teardown.
    pub fn forward(
        &mut self,
        inputs: &[&[f32]],
        outputs: &mut [&mut [f32]],
    ) -> Result<(), RuntimeError> {
        let start = Instant::now();

        // Pre-execution gate: counts, then exact element sizes.
        if inputs.len() != self.inputs.len() {
            return Err(RuntimeError::BufferCountMismatch {
                role: "input",
                expected: self.inputs.len(),
                actual: inputs.len(),
            });
        }
        if outputs.len() != self.outputs.len() {
            return Err(RuntimeError::BufferCountMismatch {
                role: "output",
                expected: self.outputs.len(),
                actual: outputs.len(),
            });
        }
        for (index, buf) in inputs.iter().enumerate() {
            let expected = self.input_size(index)?;
            if buf.len() != expected {
                return Err(RuntimeError::BufferSizeMismatch {
                    role: "input",
                    index,
                    expected,
                    actual: buf.len(),
                });
            }
        }
        for (index, buf) in outputs.iter().enumerate() {
            let expected = self.output_size(index)?;
            if buf.len() != expected {
                return Err(RuntimeError::BufferSizeMismatch {
                    role: "output",
                    index,
                    expected,
                    actual: buf.len(),
                });
            }
        }

        // Bind caller inputs.
        for (index, buf) in inputs.iter().enumerate() {
            let mut view = self.input_view_mut(index)?;
            view.copy_from_f32(buf).map_err(|e| RuntimeError::InitVariable {
                name: format!("input[{index}]"),
                detail: e.to_string(),
            })?;
        }

        // Execute every node in stored order.
        let Context {
            nodes,
            storage,
            variables,
            ..
        } = self;
        for (index, node) in nodes.iter_mut().enumerate() {
            tracing::trace!("node {index}: {} ({})", node.name, node.kind);

            let mut io = storage
                .bind_node(variables, &node.inputs, &node.outputs)
                .map_err(|e| RuntimeError::Function {
                    function: node.name.clone(),
                    index,
                    source: OpError::Tensor(e),
                })?;

            node.op.execute(&mut io).map_err(|e| RuntimeError::Function {
                function: node.name.clone(),
                index,
                source: e,
            })?;
        }

        // Hand back the designated outputs.
        for (index, buf) in outputs.iter_mut().enumerate() {
            let view = self.output_view(index)?;
            view.copy_to_f32(buf).map_err(|e| RuntimeError::InitVariable {
                name: format!("output[{index}]"),
                detail: e.to_string(),
            })?;
        }

        tracing::debug!(
            "forward pass over {} node(s) in {:?}",
            self.nodes.len(),
            start.elapsed(),
        );
        Ok(())
    }
}
