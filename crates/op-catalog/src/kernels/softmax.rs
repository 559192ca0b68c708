// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Softmax along a configured axis, numerically stabilised by
//! subtracting the per-slice maximum before exponentiation.

use super::same_elements;
use crate::{NodeIo, NodeSignature, OpError, Operator};

#[derive(Debug)]
pub(crate) struct Softmax {
    outer: usize,
    axis_dim: usize,
    inner: usize,
}

impl Softmax {
    pub(crate) fn new(axis: usize, sig: &NodeSignature<'_>) -> Result<Self, OpError> {
        sig.expect_arity(1, 1)?;
        let x = sig.input(0);
        same_elements(x, sig.output(0))?;
        if x.shape() != sig.output(0).shape() {
            return Err(OpError::ShapeMismatch {
                detail: format!(
                    "softmax input {} and output {} differ",
                    x.shape(),
                    sig.output(0).shape()
                ),
            });
        }

        let Some(axis_dim) = x.shape().dim(axis) else {
            return Err(OpError::InvalidConfig {
                detail: format!("axis {axis} exceeds input rank {}", x.shape().rank()),
            });
        };

        Ok(Self {
            outer: x.shape().outer_size(axis),
            axis_dim,
            inner: x.shape().inner_size(axis + 1),
        })
    }
}

/// One stabilised softmax over the strided slice `base + k * stride`
/// for `k < axis_dim`, in place.
fn slice_softmax(dst: &mut [f32], base: usize, axis_dim: usize, stride: usize) {
    let mut max_val = f32::NEG_INFINITY;
    for k in 0..axis_dim {
        max_val = max_val.max(dst[base + k * stride]);
    }

    let mut sum = 0.0f32;
    for k in 0..axis_dim {
        let e = (dst[base + k * stride] - max_val).exp();
        dst[base + k * stride] = e;
        sum += e;
    }

    if sum > 0.0 {
        let inv = 1.0 / sum;
        for k in 0..axis_dim {
            dst[base + k * stride] *= inv;
        }
    }
}

impl Operator for Softmax {
    fn execute(&mut self, io: &mut NodeIo<'_>) -> Result<(), OpError> {
        let x = &io.inputs[0];
        let y = &mut io.outputs[0];

        if let (Some(src), Some(dst)) = (x.as_f32(), y.as_f32_mut()) {
            dst.copy_from_slice(src);
            for o in 0..self.outer {
                for i in 0..self.inner {
                    let base = o * self.axis_dim * self.inner + i;
                    slice_softmax(dst, base, self.axis_dim, self.inner);
                }
            }
        } else {
            let stride = self.inner;
            for o in 0..self.outer {
                for i in 0..self.inner {
                    let base = o * self.axis_dim * stride + i;
                    let mut max_val = f32::NEG_INFINITY;
                    for k in 0..self.axis_dim {
                        max_val = max_val.max(x.get(base + k * stride));
                    }
                    let mut sum = 0.0f32;
                    for k in 0..self.axis_dim {
                        let e = (x.get(base + k * stride) - max_val).exp();
                        y.set(base + k * stride, e);
                        sum += e;
                    }
                    if sum > 0.0 {
                        let inv = 1.0 / sum;
                        for k in 0..self.axis_dim {
                            let idx = base + k * stride;
                            let v = y.get(idx);
                            y.set(idx, v * inv);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::testutil::{approx_eq, f32_bytes, read_f32};
    use tensor_core::{ElementKind, Shape, TensorMeta, TensorView, TensorViewMut};

    fn meta(dims: Vec<usize>) -> TensorMeta {
        TensorMeta::new(Shape::new(dims), ElementKind::Float32)
    }

    fn run(axis: usize, dims: Vec<usize>, input: &[f32]) -> Vec<f32> {
        let m = meta(dims);
        let inputs = [&m];
        let outputs = [&m];
        let sig = NodeSignature::new(&inputs, &outputs);
        let mut op = Softmax::new(axis, &sig).unwrap();

        let in_bytes = f32_bytes(input);
        let mut out_bytes = vec![0u8; in_bytes.len()];
        let mut io = NodeIo::new(
            vec![TensorView::new(&m, &in_bytes).unwrap()],
            vec![TensorViewMut::new(&m, &mut out_bytes).unwrap()],
        );
        op.execute(&mut io).unwrap();
        read_f32(&out_bytes)
    }

    #[test]
    fn test_uniform_rows() {
        let out = run(1, vec![1, 4], &[1.0, 1.0, 1.0, 1.0]);
        assert!(approx_eq(&out, &[0.25; 4], 1e-6));
    }

    #[test]
    fn test_rows_sum_to_one() {
        let out = run(1, vec![2, 3], &[1.0, 2.0, 3.0, -1.0, 0.0, 1.0]);
        let s0: f32 = out[0..3].iter().sum();
        let s1: f32 = out[3..6].iter().sum();
        assert!((s0 - 1.0).abs() < 1e-5);
        assert!((s1 - 1.0).abs() < 1e-5);
        assert!(out[0] < out[1] && out[1] < out[2]);
    }

    #[test]
    fn test_axis_zero_strided() {
        // Softmax across rows: each column normalises independently.
        let out = run(0, vec![2, 2], &[0.0, 10.0, 0.0, -10.0]);
        assert!((out[0] + out[2] - 1.0).abs() < 1e-5);
        assert!((out[1] + out[3] - 1.0).abs() < 1e-5);
        assert!((out[0] - 0.5).abs() < 1e-5);
        assert!(out[1] > 0.99);
    }

    #[test]
    fn test_numerical_stability() {
        let out = run(1, vec![1, 3], &[1000.0, 1001.0, 1002.0]);
        assert!(out.iter().all(|v| v.is_finite()));
        let s: f32 = out.iter().sum();
        assert!((s - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_rejects_axis_out_of_range() {
        let m = meta(vec![2, 2]);
        let inputs = [&m];
        let outputs = [&m];
        let sig = NodeSignature::new(&inputs, &outputs);
        assert!(matches!(
            Softmax::new(2, &sig),
            Err(OpError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_rejects_shape_mismatch() {
        let a = meta(vec![2, 2]);
        let b = meta(vec![4]);
        let inputs = [&a];
        let outputs = [&b];
        let sig = NodeSignature::new(&inputs, &outputs);
        assert!(Softmax::new(0, &sig).is_err());
    }
}
