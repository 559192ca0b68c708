// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! 2-D pooling over the two trailing axes, shared by the max, average
//! and sum kinds. Leading axes are treated as independent maps.
//!
//! Output spatial size per axis: with `ignore_border` the window must
//! fit inside the padded extent (`(in + 2·pad - kernel) / stride + 1`);
//! without it, partial windows at the border produce an extra ceil'd
//! position.

use crate::{NodeIo, NodeSignature, OpError, Operator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PoolMode {
    Max,
    Average,
    Sum,
}

#[derive(Debug)]
pub(crate) struct Pooling {
    mode: PoolMode,
    maps: usize,
    in_h: usize,
    in_w: usize,
    out_h: usize,
    out_w: usize,
    kernel: (usize, usize),
    stride: (usize, usize),
    pad: (usize, usize),
    including_pad: bool,
}

impl Pooling {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        mode: PoolMode,
        kernel: &[usize],
        stride: &[usize],
        pad: &[usize],
        ignore_border: bool,
        including_pad: bool,
        sig: &NodeSignature<'_>,
    ) -> Result<Self, OpError> {
        sig.expect_arity(1, 1)?;
        let x = sig.input(0);
        let y = sig.output(0);

        if kernel.len() != 2 || stride.len() != 2 || pad.len() != 2 {
            return Err(OpError::InvalidConfig {
                detail: format!(
                    "pooling geometry must be 2-D (kernel {:?}, stride {:?}, pad {:?})",
                    kernel, stride, pad
                ),
            });
        }
        if kernel.contains(&0) || stride.contains(&0) {
            return Err(OpError::InvalidConfig {
                detail: "pooling kernel and stride entries must be non-zero".into(),
            });
        }
        if x.shape().rank() < 2 || y.shape().rank() < 2 {
            return Err(OpError::ShapeMismatch {
                detail: format!(
                    "pooling needs rank >= 2, got input {} output {}",
                    x.shape(),
                    y.shape()
                ),
            });
        }

        let xr = x.shape().rank();
        let yr = y.shape().rank();
        let maps = x.shape().outer_size(xr - 2);
        if y.shape().outer_size(yr - 2) != maps {
            return Err(OpError::ShapeMismatch {
                detail: format!(
                    "map counts differ between input {} and output {}",
                    x.shape(),
                    y.shape()
                ),
            });
        }

        let in_h = x.shape().dim(xr - 2).unwrap_or(0);
        let in_w = x.shape().dim(xr - 1).unwrap_or(0);
        let expect_h = out_extent(in_h, kernel[0], stride[0], pad[0], ignore_border)?;
        let expect_w = out_extent(in_w, kernel[1], stride[1], pad[1], ignore_border)?;
        let out_h = y.shape().dim(yr - 2).unwrap_or(0);
        let out_w = y.shape().dim(yr - 1).unwrap_or(0);
        if (out_h, out_w) != (expect_h, expect_w) {
            return Err(OpError::ShapeMismatch {
                detail: format!(
                    "output spatial extent {out_h}x{out_w} does not match computed {expect_h}x{expect_w}"
                ),
            });
        }

        Ok(Self {
            mode,
            maps,
            in_h,
            in_w,
            out_h,
            out_w,
            kernel: (kernel[0], kernel[1]),
            stride: (stride[0], stride[1]),
            pad: (pad[0], pad[1]),
            including_pad,
        })
    }
}

/// Output positions along one axis.
fn out_extent(
    input: usize,
    kernel: usize,
    stride: usize,
    pad: usize,
    ignore_border: bool,
) -> Result<usize, OpError> {
    let padded = input + 2 * pad;
    if padded < kernel {
        return Err(OpError::InvalidConfig {
            detail: format!("kernel {kernel} exceeds padded extent {padded}"),
        });
    }
    let span = padded - kernel;
    Ok(if ignore_border {
        span / stride + 1
    } else {
        span.div_ceil(stride) + 1
    })
}

impl Operator for Pooling {
    fn execute(&mut self, io: &mut NodeIo<'_>) -> Result<(), OpError> {
        let x = &io.inputs[0];
        let y = &mut io.outputs[0];
        let (kh, kw) = self.kernel;
        let (sh, sw) = self.stride;
        let (ph, pw) = self.pad;

        for m in 0..self.maps {
            let in_base = m * self.in_h * self.in_w;
            let out_base = m * self.out_h * self.out_w;
            for oy in 0..self.out_h {
                for ox in 0..self.out_w {
                    let y0 = (oy * sh) as isize - ph as isize;
                    let x0 = (ox * sw) as isize - pw as isize;

                    let mut acc = f32::NEG_INFINITY;
                    let mut sum = 0.0f32;
                    let mut valid = 0usize;
                    for dy in 0..kh {
                        for dx in 0..kw {
                            let iy = y0 + dy as isize;
                            let ix = x0 + dx as isize;
                            if iy < 0
                                || ix < 0
                                || iy >= self.in_h as isize
                                || ix >= self.in_w as isize
                            {
                                continue;
                            }
                            let v = x.get(in_base + iy as usize * self.in_w + ix as usize);
                            acc = acc.max(v);
                            sum += v;
                            valid += 1;
                        }
                    }

                    let result = match self.mode {
                        PoolMode::Max => {
                            if valid == 0 {
                                0.0
                            } else {
                                acc
                            }
                        }
                        PoolMode::Sum => sum,
                        PoolMode::Average => {
                            let divisor = if self.including_pad {
                                kh * kw
                            } else {
                                valid.max(1)
                            };
                            sum / divisor as f32
                        }
                    };
                    y.set(out_base + oy * self.out_w + ox, result);
                }
            }
        }
        Ok(())
    }
}
