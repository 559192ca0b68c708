// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Array manipulation kernels: reshape, transpose, concatenate.

use super::same_elements;
use crate::{NodeIo, NodeSignature, OpError, Operator};
use tensor_core::Shape;

/// Element-order-preserving copy into a differently shaped output.
#[derive(Debug)]
pub(crate) struct Reshape {
    size: usize,
}

impl Reshape {
    pub(crate) fn new(target: &[usize], sig: &NodeSignature<'_>) -> Result<Self, OpError> {
        sig.expect_arity(1, 1)?;
        let size = same_elements(sig.input(0), sig.output(0))?;

        let declared = Shape::new(target.to_vec());
        if declared != *sig.output(0).shape() {
            return Err(OpError::InvalidConfig {
                detail: format!(
                    "configured shape {declared} does not match output {}",
                    sig.output(0).shape()
                ),
            });
        }
        Ok(Self { size })
    }
}

impl Operator for Reshape {
    fn execute(&mut self, io: &mut NodeIo<'_>) -> Result<(), OpError> {
        let x = &io.inputs[0];
        let y = &mut io.outputs[0];
        if let (Some(src), Some(dst)) = (x.as_f32(), y.as_f32_mut()) {
            dst.copy_from_slice(src);
        } else {
            for i in 0..self.size {
                y.set(i, x.get(i));
            }
        }
        Ok(())
    }
}

/// Axis permutation. The output walk uses a counter vector allocated at
/// setup so execution stays allocation-free.
#[derive(Debug)]
pub(crate) struct Transpose {
    size: usize,
    out_dims: Vec<usize>,
    /// Input stride for each output axis: `in_strides[axes[d]]`.
    mapped_strides: Vec<usize>,
    counter: Vec<usize>,
}

impl Transpose {
    pub(crate) fn new(axes: &[usize], sig: &NodeSignature<'_>) -> Result<Self, OpError> {
        sig.expect_arity(1, 1)?;
        let x = sig.input(0);
        let y = sig.output(0);
        let size = same_elements(x, y)?;

        let rank = x.shape().rank();
        if axes.len() != rank {
            return Err(OpError::InvalidConfig {
                detail: format!("permutation {:?} does not cover rank {rank}", axes),
            });
        }
        let mut seen = vec![false; rank];
        for &a in axes {
            if a >= rank || seen[a] {
                return Err(OpError::InvalidConfig {
                    detail: format!("{:?} is not a permutation of 0..{rank}", axes),
                });
            }
            seen[a] = true;
        }
        for (d, &a) in axes.iter().enumerate() {
            if y.shape().dim(d) != x.shape().dim(a) {
                return Err(OpError::ShapeMismatch {
                    detail: format!(
                        "output {} is not input {} permuted by {:?}",
                        y.shape(),
                        x.shape(),
                        axes
                    ),
                });
            }
        }

        let in_strides = x.shape().strides();
        let mapped_strides = axes.iter().map(|&a| in_strides[a]).collect();
        Ok(Self {
            size,
            out_dims: y.shape().dims().to_vec(),
            mapped_strides,
            counter: vec![0; rank],
        })
    }
}

impl Operator for Transpose {
    fn execute(&mut self, io: &mut NodeIo<'_>) -> Result<(), OpError> {
        let x = &io.inputs[0];
        let y = &mut io.outputs[0];
        let rank = self.out_dims.len();

        self.counter.fill(0);
        for out_idx in 0..self.size {
            let in_idx: usize = self
                .counter
                .iter()
                .zip(&self.mapped_strides)
                .map(|(&c, &s)| c * s)
                .sum();
            y.set(out_idx, x.get(in_idx));

            // Odometer increment over the output multi-index.
            for d in (0..rank).rev() {
                self.counter[d] += 1;
                if self.counter[d] < self.out_dims[d] {
                    break;
                }
                self.counter[d] = 0;
            }
        }
        Ok(())
    }
}

/// Joins equal-shaped-except-axis inputs along one axis.
#[derive(Debug)]
pub(crate) struct Concatenate {
    outer: usize,
    /// Per input: its axis extent × inner (elements per outer step).
    blocks: Vec<usize>,
    out_block: usize,
}

impl Concatenate {
    pub(crate) fn new(axis: usize, sig: &NodeSignature<'_>) -> Result<Self, OpError> {
        if sig.inputs.is_empty() {
            return Err(OpError::InputArity {
                expected: 1,
                actual: 0,
            });
        }
        if sig.outputs.len() != 1 {
            return Err(OpError::OutputArity {
                expected: 1,
                actual: sig.outputs.len(),
            });
        }

        let y = sig.output(0);
        let rank = y.shape().rank();
        if axis >= rank {
            return Err(OpError::InvalidConfig {
                detail: format!("axis {axis} exceeds rank {rank}"),
            });
        }

        let mut axis_total = 0usize;
        for (i, x) in sig.inputs.iter().enumerate() {
            if x.shape().rank() != rank {
                return Err(OpError::ShapeMismatch {
                    detail: format!("input {i} rank differs from output rank {rank}"),
                });
            }
            for d in 0..rank {
                if d != axis && x.shape().dim(d) != y.shape().dim(d) {
                    return Err(OpError::ShapeMismatch {
                        detail: format!(
                            "input {i} shape {} differs from output {} outside axis {axis}",
                            x.shape(),
                            y.shape()
                        ),
                    });
                }
            }
            axis_total += x.shape().dim(axis).unwrap_or(0);
        }
        if y.shape().dim(axis) != Some(axis_total) {
            return Err(OpError::ShapeMismatch {
                detail: format!(
                    "output axis extent {:?} is not the sum {axis_total} of the inputs",
                    y.shape().dim(axis)
                ),
            });
        }

        let inner = y.shape().inner_size(axis + 1);
        let blocks = sig
            .inputs
            .iter()
            .map(|x| x.shape().dim(axis).unwrap_or(0) * inner)
            .collect();
        Ok(Self {
            outer: y.shape().outer_size(axis),
            blocks,
            out_block: axis_total * inner,
        })
    }
}

impl Operator for Concatenate {
    fn execute(&mut self, io: &mut NodeIo<'_>) -> Result<(), OpError> {
        let y = &mut io.outputs[0];

        for o in 0..self.outer {
            let mut dst_pos = o * self.out_block;
            for (x, &block) in io.inputs.iter().zip(&self.blocks) {
                let src_base = o * block;
                for j in 0..block {
                    y.set(dst_pos + j, x.get(src_base + j));
                }
                dst_pos += block;
            }
        }
        Ok(())
    }
}
