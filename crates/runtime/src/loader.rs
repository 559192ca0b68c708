// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Builds a [`Context`] from a validated network description.
//!
//! Load order, each step a hard failure point:
//! 1. Version gate, before anything is allocated.
//! 2. Structural validation of the description.
//! 3. Liveness derivation from the serialized (trusted) node order.
//! 4. Buffer planning.
//! 5. Storage materialization, constants encoded into their buffers.
//! 6. Node materialization: tag resolution and operator instantiation,
//!    in serialized order.
//! 7. Per-node binding audit (when enabled).
//!
//! A failure anywhere returns the typed error; everything built so far
//! unwinds through ownership, so a failed load leaks nothing.

use crate::context::{Context, Node, Variable};
use crate::storage::{Region, TensorStorage};
use crate::{RuntimeError, RuntimeOptions};
use buffer_planner::{Liveness, Placement, PlanRequest};
use network_ir::{FormatVersion, NetworkDescription};
use op_catalog::{Catalog, NodeSignature, OpKind};
use tensor_core::TensorViewMut;

pub(crate) fn build(
    description: NetworkDescription,
    options: RuntimeOptions,
) -> Result<Context, RuntimeError> {
    // 1. Version gate.
    if !description.version.is_supported() {
        return Err(RuntimeError::VersionMismatch {
            found: description.version.to_string(),
            supported: FormatVersion::supported().to_string(),
        });
    }

    // 2. Structural validation.
    description.validate()?;

    // 3. Liveness from the serialized order.
    let liveness = derive_liveness(&description);

    // 4. Buffer plan.
    let metas: Vec<tensor_core::TensorMeta> =
        description.variables.iter().map(|v| v.meta()).collect();
    let requests: Vec<PlanRequest> = description
        .variables
        .iter()
        .zip(&metas)
        .zip(&liveness)
        .map(|((decl, meta), &live)| PlanRequest::new(meta.size_bytes(), decl.allocation, live))
        .collect();
    let plan = buffer_planner::plan(&requests, options.reuse_scratch)?;
    if options.audit_bindings {
        plan.check_aliasing(&requests)?;
    }

    // 5. Storage materialization. Designated I/O buffers are allocated
    // in binding order so `Region::Input { index }` is the caller's
    // binding position.
    let mut storage = TensorStorage::new(plan.arena_bytes);
    for &id in &description.inputs {
        storage.add_input(metas[id].size_bytes());
    }
    for &id in &description.outputs {
        storage.add_output(metas[id].size_bytes());
    }

    let mut variables = Vec::with_capacity(description.variables.len());
    for (id, (decl, meta)) in description.variables.iter().zip(metas).enumerate() {
        let region = match plan.placements[id] {
            Placement::Arena { offset, .. } => Region::Arena {
                offset,
                len: meta.size_bytes(),
            },
            Placement::Dedicated => storage.add_dedicated(meta.size_bytes()),
            Placement::Constant => {
                let data = decl.data.as_ref().ok_or_else(|| RuntimeError::InitVariable {
                    name: decl.name.clone(),
                    detail: "constant data unresolved; load the sidecar first".into(),
                })?;
                let mut bytes = vec![0u8; meta.size_bytes()];
                let mut view =
                    TensorViewMut::new(&meta, &mut bytes).map_err(|e| init_err(&decl.name, e))?;
                view.copy_from_f32(data).map_err(|e| init_err(&decl.name, e))?;
                storage.add_constant(bytes)
            }
            Placement::Input => {
                let position = description
                    .inputs
                    .iter()
                    .position(|&v| v == id)
                    .ok_or_else(|| RuntimeError::InitVariable {
                        name: decl.name.clone(),
                        detail: "input-class variable is not a designated input".into(),
                    })?;
                Region::Input { index: position }
            }
            Placement::Output => {
                let position = description
                    .outputs
                    .iter()
                    .position(|&v| v == id)
                    .ok_or_else(|| RuntimeError::InitVariable {
                        name: decl.name.clone(),
                        detail: "output-class variable is not a designated output".into(),
                    })?;
                Region::Output { index: position }
            }
        };
        variables.push(Variable {
            name: decl.name.clone(),
            meta,
            region,
        });
    }

    // 6. Nodes, in serialized order.
    let mut nodes = Vec::with_capacity(description.functions.len());
    for (index, func) in description.functions.iter().enumerate() {
        let kind = OpKind::parse(&func.kind).ok_or_else(|| RuntimeError::UnknownFunction {
            function: func.name.clone(),
            tag: func.kind.clone(),
        })?;

        let input_metas: Vec<&tensor_core::TensorMeta> =
            func.inputs.iter().map(|&id| &variables[id].meta).collect();
        let output_metas: Vec<&tensor_core::TensorMeta> =
            func.outputs.iter().map(|&id| &variables[id].meta).collect();
        let sig = NodeSignature::new(&input_metas, &output_metas);

        let op = Catalog::instantiate(kind, &func.config, &sig).map_err(|e| {
            RuntimeError::Function {
                function: func.name.clone(),
                index,
                source: e,
            }
        })?;

        // 7. Within-node disjointness backs the executor's binder.
        if options.audit_bindings {
            audit_node_bindings(&variables, func, index)?;
        }

        nodes.push(Node {
            name: func.name.clone(),
            kind,
            inputs: func.inputs.clone(),
            outputs: func.outputs.clone(),
            op,
        });
    }

    tracing::info!(
        "loaded network '{}': {} variables, {} nodes, {}",
        description.name,
        variables.len(),
        nodes.len(),
        plan.stats.summary(),
    );

    Ok(Context {
        name: description.name,
        variables,
        nodes,
        storage,
        inputs: description.inputs,
        outputs: description.outputs,
        plan_stats: plan.stats,
        options,
    })
}

/// First/last node-index touch per variable, from the serialized order.
///
/// Only scratch-class variables compete for arena offsets, but windows
/// are derived uniformly; unreferenced variables get the empty window
/// at index 0.
fn derive_liveness(description: &NetworkDescription) -> Vec<Liveness> {
    let mut first = vec![usize::MAX; description.variables.len()];
    let mut last = vec![0usize; description.variables.len()];

    for (index, func) in description.functions.iter().enumerate() {
        for &id in func.inputs.iter().chain(&func.outputs) {
            if first[id] == usize::MAX {
                first[id] = index;
            }
            last[id] = index;
        }
    }

    first
        .into_iter()
        .zip(last)
        .map(|(f, l)| {
            if f == usize::MAX {
                Liveness::new(0, 0)
            } else {
                Liveness::new(f, l)
            }
        })
        .collect()
}

/// No output region of a node may overlap another of its outputs or any
/// of its inputs.
fn audit_node_bindings(
    variables: &[Variable],
    func: &network_ir::FunctionDecl,
    index: usize,
) -> Result<(), RuntimeError> {
    for (oi, &out_id) in func.outputs.iter().enumerate() {
        let out_region = &variables[out_id].region;

        for &other_id in &func.outputs[oi + 1..] {
            if out_region.overlaps(&variables[other_id].region) {
                return Err(RuntimeError::BindingAlias {
                    function: func.name.clone(),
                    index,
                    detail: format!(
                        "outputs '{}' and '{}' share storage",
                        variables[out_id].name, variables[other_id].name
                    ),
                });
            }
        }
        for &in_id in &func.inputs {
            if out_region.overlaps(&variables[in_id].region) {
                return Err(RuntimeError::BindingAlias {
                    function: func.name.clone(),
                    index,
                    detail: format!(
                        "output '{}' shares storage with input '{}'",
                        variables[out_id].name, variables[in_id].name
                    ),
                });
            }
        }
    }
    Ok(())
}

fn init_err(name: &str, e: tensor_core::TensorError) -> RuntimeError {
    RuntimeError::InitVariable {
        name: name.to_string(),
        detail: e.to_string(),
    }
}
