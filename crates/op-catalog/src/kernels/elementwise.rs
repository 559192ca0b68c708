// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Shared elementwise kernels.
//!
//! Three skeletons cover most of the catalog:
//! - [`Map1`] — one input, one output, `y[i] = f(x[i])`.
//! - [`Map1Param`] — the same with one configured scalar,
//!   `y[i] = f(x[i], p)`.
//! - [`Map2`] — two equal-shaped inputs, `y[i] = f(a[i], b[i])`.
//!
//! Each setup validates arity and equal element counts; each execute
//! takes the raw `f32` path when every bound view allows it and the
//! kind-aware accessor path otherwise.

use super::same_elements;
use crate::{NodeIo, NodeSignature, OpError, Operator};

/// `y[i] = f(x[i])`.
pub(crate) struct Map1 {
    label: &'static str,
    f: fn(f32) -> f32,
    size: usize,
}

impl Map1 {
    pub(crate) fn new(
        label: &'static str,
        f: fn(f32) -> f32,
        sig: &NodeSignature<'_>,
    ) -> Result<Self, OpError> {
        sig.expect_arity(1, 1)?;
        let size = same_elements(sig.input(0), sig.output(0))?;
        Ok(Self { label, f, size })
    }
}

impl Operator for Map1 {
    fn execute(&mut self, io: &mut NodeIo<'_>) -> Result<(), OpError> {
        let x = &io.inputs[0];
        let y = &mut io.outputs[0];
        if let (Some(src), Some(dst)) = (x.as_f32(), y.as_f32_mut()) {
            for (d, &s) in dst.iter_mut().zip(src) {
                *d = (self.f)(s);
            }
        } else {
            for i in 0..self.size {
                y.set(i, (self.f)(x.get(i)));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Map1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Map1")
            .field("op", &self.label)
            .field("size", &self.size)
            .finish()
    }
}

/// `y[i] = f(x[i], p)` with `p` fixed at setup from the node config.
pub(crate) struct Map1Param {
    label: &'static str,
    f: fn(f32, f32) -> f32,
    param: f32,
    size: usize,
}

impl Map1Param {
    pub(crate) fn new(
        label: &'static str,
        f: fn(f32, f32) -> f32,
        param: f32,
        sig: &NodeSignature<'_>,
    ) -> Result<Self, OpError> {
        sig.expect_arity(1, 1)?;
        let size = same_elements(sig.input(0), sig.output(0))?;
        Ok(Self {
            label,
            f,
            param,
            size,
        })
    }
}

impl Operator for Map1Param {
    fn execute(&mut self, io: &mut NodeIo<'_>) -> Result<(), OpError> {
        let x = &io.inputs[0];
        let y = &mut io.outputs[0];
        if let (Some(src), Some(dst)) = (x.as_f32(), y.as_f32_mut()) {
            for (d, &s) in dst.iter_mut().zip(src) {
                *d = (self.f)(s, self.param);
            }
        } else {
            for i in 0..self.size {
                y.set(i, (self.f)(x.get(i), self.param));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Map1Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Map1Param")
            .field("op", &self.label)
            .field("param", &self.param)
            .field("size", &self.size)
            .finish()
    }
}

/// `y[i] = f(a[i], b[i])` over equal-shaped inputs.
pub(crate) struct Map2 {
    label: &'static str,
    f: fn(f32, f32) -> f32,
    size: usize,
}

impl Map2 {
    pub(crate) fn new(
        label: &'static str,
        f: fn(f32, f32) -> f32,
        sig: &NodeSignature<'_>,
    ) -> Result<Self, OpError> {
        sig.expect_arity(2, 1)?;
        same_elements(sig.input(0), sig.input(1))?;
        let size = same_elements(sig.input(0), sig.output(0))?;
        Ok(Self { label, f, size })
    }
}

impl Operator for Map2 {
    fn execute(&mut self, io: &mut NodeIo<'_>) -> Result<(), OpError> {
        let (a, b) = (&io.inputs[0], &io.inputs[1]);
        let y = &mut io.outputs[0];
        if let (Some(sa), Some(sb), Some(dst)) = (a.as_f32(), b.as_f32(), y.as_f32_mut()) {
            for (i, d) in dst.iter_mut().enumerate() {
                *d = (self.f)(sa[i], sb[i]);
            }
        } else {
            for i in 0..self.size {
                y.set(i, (self.f)(a.get(i), b.get(i)));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Map2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Map2")
            .field("op", &self.label)
            .field("size", &self.size)
            .finish()
    }
}

/// Selu carries two coefficients, so it sits outside the map family.
#[derive(Debug)]
pub(crate) struct Selu {
    scale: f32,
    alpha: f32,
    size: usize,
}

impl Selu {
    pub(crate) fn new(scale: f32, alpha: f32, sig: &NodeSignature<'_>) -> Result<Self, OpError> {
        sig.expect_arity(1, 1)?;
        let size = same_elements(sig.input(0), sig.output(0))?;
        Ok(Self { scale, alpha, size })
    }

    fn apply(&self, x: f32) -> f32 {
        if x > 0.0 {
            self.scale * x
        } else {
            self.scale * self.alpha * (x.exp() - 1.0)
        }
    }
}

impl Operator for Selu {
    fn execute(&mut self, io: &mut NodeIo<'_>) -> Result<(), OpError> {
        let x = &io.inputs[0];
        let y = &mut io.outputs[0];
        if let (Some(src), Some(dst)) = (x.as_f32(), y.as_f32_mut()) {
            for (d, &s) in dst.iter_mut().zip(src) {
                *d = self.apply(s);
            }
        } else {
            for i in 0..self.size {
                y.set(i, self.apply(x.get(i)));
            }
        }
        Ok(())
    }
}
