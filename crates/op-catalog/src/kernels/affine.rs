// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Affine transform: `y = x · W (+ b)` folded at a base axis.
//!
//! Dimensions before `base_axis` form the batch; the rest are input
//! features. The weight may be any shape whose element count is
//! `in_features × out_features`; it is read as that matrix.

use crate::{NodeIo, NodeSignature, OpError, Operator};
use ndarray::linalg::general_mat_mul;
use ndarray::{ArrayView2, ArrayViewMut2};

#[derive(Debug)]
pub(crate) struct Affine {
    outer: usize,
    in_features: usize,
    out_features: usize,
    has_bias: bool,
}

impl Affine {
    pub(crate) fn new(base_axis: usize, sig: &NodeSignature<'_>) -> Result<Self, OpError> {
        sig.expect_inputs_between(2, 3)?;
        if sig.outputs.len() != 1 {
            return Err(OpError::OutputArity {
                expected: 1,
                actual: sig.outputs.len(),
            });
        }

        let x = sig.input(0);
        let w = sig.input(1);
        let y = sig.output(0);

        if base_axis > x.shape().rank() {
            return Err(OpError::InvalidConfig {
                detail: format!(
                    "base_axis {base_axis} exceeds input rank {}",
                    x.shape().rank()
                ),
            });
        }

        let outer = x.shape().outer_size(base_axis);
        let in_features = x.shape().inner_size(base_axis);
        if y.shape().outer_size(base_axis) != outer {
            return Err(OpError::ShapeMismatch {
                detail: format!(
                    "output {} does not preserve the batch fold of input {} at axis {base_axis}",
                    y.shape(),
                    x.shape()
                ),
            });
        }
        let out_features = y.shape().inner_size(base_axis);

        if w.num_elements() != in_features * out_features {
            return Err(OpError::ShapeMismatch {
                detail: format!(
                    "weight {} holds {} elements, expected {in_features}x{out_features}",
                    w.shape(),
                    w.num_elements()
                ),
            });
        }

        let has_bias = sig.inputs.len() == 3;
        if has_bias {
            let b = sig.input(2);
            if b.num_elements() != out_features {
                return Err(OpError::ShapeMismatch {
                    detail: format!(
                        "bias {} holds {} elements, expected {out_features}",
                        b.shape(),
                        b.num_elements()
                    ),
                });
            }
        }

        Ok(Self {
            outer,
            in_features,
            out_features,
            has_bias,
        })
    }

    fn execute_generic(&self, io: &mut NodeIo<'_>) {
        let (k, n) = (self.in_features, self.out_features);
        let x = &io.inputs[0];
        let w = &io.inputs[1];
        let y = &mut io.outputs[0];
        for o in 0..self.outer {
            for j in 0..n {
                let mut acc = if self.has_bias {
                    io.inputs[2].get(j)
                } else {
                    0.0
                };
                for i in 0..k {
                    acc += x.get(o * k + i) * w.get(i * n + j);
                }
                y.set(o * n + j, acc);
            }
        }
    }
}

impl Operator for Affine {
    fn execute(&mut self, io: &mut NodeIo<'_>) -> Result<(), OpError> {
        let fast = io.inputs[0].as_f32().is_some()
            && io.inputs[1].as_f32().is_some()
            && (!self.has_bias || io.inputs[2].as_f32().is_some());

        if fast {
            let xs = io.inputs[0].as_f32().expect("checked above");
            let ws = io.inputs[1].as_f32().expect("checked above");
            if let Some(ys) = io.outputs[0].as_f32_mut() {
                let x = ArrayView2::from_shape((self.outer, self.in_features), xs)
                    .expect("shape validated at setup");
                let w = ArrayView2::from_shape((self.in_features, self.out_features), ws)
                    .expect("shape validated at setup");
                let mut y = ArrayViewMut2::from_shape((self.outer, self.out_features), ys)
                    .expect("shape validated at setup");

                general_mat_mul(1.0, &x, &w, 0.0, &mut y);

                if self.has_bias {
                    let bs = io.inputs[2].as_f32().expect("checked above");
                    for mut row in y.rows_mut() {
                        for (v, &b) in row.iter_mut().zip(bs) {
                            *v += b;
                        }
                    }
                }
                return Ok(());
            }
        }

        self.execute_generic(io);
        Ok(())
    }
}
