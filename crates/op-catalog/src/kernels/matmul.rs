// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Batched matrix multiply over the two trailing axes.

use crate::{NodeIo, NodeSignature, OpError, Operator};
use ndarray::linalg::general_mat_mul;
use ndarray::{ArrayView2, ArrayViewMut2};

#[derive(Debug)]
pub(crate) struct BatchMatmul {
    batch: usize,
    m: usize,
    k: usize,
    n: usize,
    /// Raw (row, col) of the stored operands, before transposition.
    a_dims: (usize, usize),
    b_dims: (usize, usize),
    transpose_a: bool,
    transpose_b: bool,
}

impl BatchMatmul {
    pub(crate) fn new(
        transpose_a: bool,
        transpose_b: bool,
        sig: &NodeSignature<'_>,
    ) -> Result<Self, OpError> {
        sig.expect_arity(2, 1)?;
        let a = sig.input(0);
        let b = sig.input(1);
        let y = sig.output(0);

        for (name, meta) in [("lhs", a), ("rhs", b), ("output", y)] {
            if meta.shape().rank() < 2 {
                return Err(OpError::ShapeMismatch {
                    detail: format!("{name} {} must have rank >= 2", meta.shape()),
                });
            }
        }

        let fold = |m: &tensor_core::TensorMeta| {
            let r = m.shape().rank();
            (
                m.shape().outer_size(r - 2),
                m.shape().dim(r - 2).unwrap_or(0),
                m.shape().dim(r - 1).unwrap_or(0),
            )
        };
        let (batch_a, ra, ca) = fold(a);
        let (batch_b, rb, cb) = fold(b);
        let (batch_y, ry, cy) = fold(y);

        let (m, k) = if transpose_a { (ca, ra) } else { (ra, ca) };
        let (k2, n) = if transpose_b { (cb, rb) } else { (rb, cb) };

        if k != k2 {
            return Err(OpError::ShapeMismatch {
                detail: format!("inner dimensions differ: lhs folds to {m}x{k}, rhs to {k2}x{n}"),
            });
        }
        if batch_a != batch_b || batch_a != batch_y {
            return Err(OpError::ShapeMismatch {
                detail: format!(
                    "batch counts differ: lhs {batch_a}, rhs {batch_b}, output {batch_y}"
                ),
            });
        }
        if (ry, cy) != (m, n) {
            return Err(OpError::ShapeMismatch {
                detail: format!("output folds to {ry}x{cy}, expected {m}x{n}"),
            });
        }

        Ok(Self {
            batch: batch_a,
            m,
            k,
            n,
            a_dims: (ra, ca),
            b_dims: (rb, cb),
            transpose_a,
            transpose_b,
        })
    }

    fn execute_generic(&self, io: &mut NodeIo<'_>) {
        let ca = self.a_dims.1;
        let cb = self.b_dims.1;
        let a = &io.inputs[0];
        let b = &io.inputs[1];
        let y = &mut io.outputs[0];

        for t in 0..self.batch {
            let a_base = t * self.a_dims.0 * self.a_dims.1;
            let b_base = t * self.b_dims.0 * self.b_dims.1;
            let y_base = t * self.m * self.n;
            for i in 0..self.m {
                for j in 0..self.n {
                    let mut acc = 0.0f32;
                    for l in 0..self.k {
                        let av = if self.transpose_a {
                            a.get(a_base + l * ca + i)
                        } else {
                            a.get(a_base + i * ca + l)
                        };
                        let bv = if self.transpose_b {
                            b.get(b_base + j * cb + l)
                        } else {
                            b.get(b_base + l * cb + j)
                        };
                        acc += av * bv;
                    }
                    y.set(y_base + i * self.n + j, acc);
                }
            }
        }
    }
}

impl Operator for BatchMatmul {
    fn execute(&mut self, io: &mut NodeIo<'_>) -> Result<(), OpError> {
        if let (Some(sa), Some(sb)) = (io.inputs[0].as_f32(), io.inputs[1].as_f32()) {
            if let Some(sy) = io.outputs[0].as_f32_mut() {
                let (ra, ca) = self.a_dims;
                let (rb, cb) = self.b_dims;
                for t in 0..self.batch {
                    let a = ArrayView2::from_shape((ra, ca), &sa[t * ra * ca..(t + 1) * ra * ca])
                        .expect("shape validated at setup");
                    let b = ArrayView2::from_shape((rb, cb), &sb[t * rb * cb..(t + 1) * rb * cb])
                        .expect("shape validated at setup");
                    let mut y = ArrayViewMut2::from_shape(
                        (self.m, self.n),
                        &mut sy[t * self.m * self.n..(t + 1) * self.m * self.n],
                    )
                    .expect("shape validated at setup");

                    let a = if self.transpose_a { a.reversed_axes() } else { a };
                    let b = if self.transpose_b { b.reversed_axes() } else { b };
                    general_mat_mul(1.0, &a, &b, 0.0, &mut y);
                }
                return Ok(());
            }
        }

        self.execute_generic(io);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::testutil::{f32_bytes, read_f32};
    use tensor_core::{ElementKind, Shape, TensorMeta, TensorView, TensorViewMut};

    fn meta(dims: Vec<usize>) -> TensorMeta {
        TensorMeta::new(Shape::new(dims), ElementKind::Float32)
    }

    fn run(
        transpose_a: bool,
        transpose_b: bool,
        a_dims: Vec<usize>,
        a: &[f32],
        b_dims: Vec<usize>,
        b: &[f32],
        y_dims: Vec<usize>,
    ) -> Vec<f32> {
        let a_m = meta(a_dims);
        let b_m = meta(b_dims);
        let y_m = meta(y_dims);
        let inputs = [&a_m, &b_m];
        let outputs = [&y_m];
        let sig = NodeSignature::new(&inputs, &outputs);
        let mut op = BatchMatmul::new(transpose_a, transpose_b, &sig).unwrap();

        let a_bytes = f32_bytes(a);
        let b_bytes = f32_bytes(b);
        let mut y_bytes = vec![0u8; y_m.size_bytes()];
        let mut io = NodeIo::new(
            vec![
                TensorView::new(&a_m, &a_bytes).unwrap(),
                TensorView::new(&b_m, &b_bytes).unwrap(),
            ],
            vec![TensorViewMut::new(&y_m, &mut y_bytes).unwrap()],
        );
        op.execute(&mut io).unwrap();
        read_f32(&y_bytes)
    }

    #[test]
    fn test_plain_2x2() {
        let y = run(
            false,
            false,
            vec![2, 2],
            &[1.0, 2.0, 3.0, 4.0],
            vec![2, 2],
            &[5.0, 6.0, 7.0, 8.0],
            vec![2, 2],
        );
        assert_eq!(y, vec![19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_batched() {
        // Two batches of 1x2 · 2x1.
        let y = run(
            false,
            false,
            vec![2, 1, 2],
            &[1.0, 2.0, 3.0, 4.0],
            vec![2, 2, 1],
            &[1.0, 1.0, 2.0, 2.0],
            vec![2, 1, 1],
        );
        assert_eq!(y, vec![3.0, 14.0]);
    }

    #[test]
    fn test_transpose_b() {
        // a: 1x2, b stored 3x2, transposed to 2x3.
        let y = run(
            false,
            true,
            vec![1, 2],
            &[1.0, 2.0],
            vec![3, 2],
            &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0],
            vec![1, 3],
        );
        assert_eq!(y, vec![9.0, 12.0, 15.0]);
    }

    #[test]
    fn test_transpose_a() {
        // a stored 2x1, transposed to 1x2.
        let y = run(
            true,
            false,
            vec![2, 1],
            &[1.0, 2.0],
            vec![2, 2],
            &[1.0, 0.0, 0.0, 1.0],
            vec![1, 2],
        );
        assert_eq!(y, vec![1.0, 2.0]);
    }

    #[test]
    fn test_rejects_inner_mismatch() {
        let a_m = meta(vec![2, 3]);
        let b_m = meta(vec![2, 2]);
        let y_m = meta(vec![2, 2]);
        let inputs = [&a_m, &b_m];
        let outputs = [&y_m];
        let sig = NodeSignature::new(&inputs, &outputs);
        assert!(matches!(
            BatchMatmul::new(false, false, &sig),
            Err(OpError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_rank_1() {
        let a_m = meta(vec![4]);
        let b_m = meta(vec![2, 2]);
        let y_m = meta(vec![2, 2]);
        let inputs = [&a_m, &b_m];
        let outputs = [&y_m];
        let sig = NodeSignature::new(&inputs, &outputs);
        assert!(BatchMatmul::new(false, false, &sig).is_err());
    }
}
