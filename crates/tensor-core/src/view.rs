// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Typed views over planned tensor storage.
//!
//! The runtime context owns all tensor bytes (arena slots, dedicated
//! buffers, baked constants, forward-call endpoints). Operator kernels
//! never see that ownership: they receive [`TensorView`]s and
//! [`TensorViewMut`]s resolved per node, and read/write elements through
//! the kind-aware accessors.
//!
//! Two access paths exist, selected per call site:
//! - `as_f32` / `as_f32_mut` — the raw-slice fast path, available when
//!   the kind is `Float32` and the region is 4-byte aligned.
//! - `get` / `set` — the generic path that decodes and encodes through
//!   the element kind and quantization scale.

use crate::{ElementKind, Shape, TensorError};

/// The typed half of a tensor descriptor: shape, element kind, scale.
///
/// Passed to operator setup so arity and shape checks happen before any
/// execution, and borrowed by every view into the tensor's bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorMeta {
    shape: Shape,
    kind: ElementKind,
    scale: f32,
}

impl TensorMeta {
    /// Creates a descriptor with the scale derived from the element kind.
    pub fn new(shape: Shape, kind: ElementKind) -> Self {
        let scale = kind.default_scale();
        Self { shape, kind, scale }
    }

    /// Creates a descriptor with an explicit quantization scale.
    ///
    /// The network description may carry a scale that overrides the
    /// power-of-two default; the conversion contract is unchanged.
    pub fn with_scale(shape: Shape, kind: ElementKind, scale: f32) -> Self {
        Self { shape, kind, scale }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Total element count implied by the shape.
    pub fn num_elements(&self) -> usize {
        self.shape.num_elements()
    }

    /// Total byte footprint of the tensor's storage.
    pub fn size_bytes(&self) -> usize {
        self.shape.size_bytes(self.kind)
    }
}

/// Immutable view over one tensor's bytes.
#[derive(Debug)]
pub struct TensorView<'a> {
    meta: &'a TensorMeta,
    data: &'a [u8],
}

impl<'a> TensorView<'a> {
    /// Wraps a byte region as a view of `meta`.
    ///
    /// The region must hold exactly `meta.size_bytes()` bytes; the
    /// element count implied by the shape must equal the buffer's
    /// allocated element count at all times.
    pub fn new(meta: &'a TensorMeta, data: &'a [u8]) -> Result<Self, TensorError> {
        if data.len() != meta.size_bytes() {
            return Err(TensorError::BufferSizeMismatch {
                shape: meta.shape().clone(),
                kind: meta.kind(),
                expected: meta.size_bytes(),
                actual: data.len(),
            });
        }
        Ok(Self { meta, data })
    }

    pub fn meta(&self) -> &TensorMeta {
        self.meta
    }

    pub fn shape(&self) -> &Shape {
        self.meta.shape()
    }

    pub fn kind(&self) -> ElementKind {
        self.meta.kind()
    }

    /// Number of elements in the view.
    pub fn len(&self) -> usize {
        self.meta.num_elements()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decodes element `i` as a float.
    pub fn get(&self, i: usize) -> f32 {
        decode(self.data, self.meta.kind(), self.meta.scale(), i)
    }

    /// Raw-slice fast path. `None` unless the kind is `Float32` and the
    /// region is 4-byte aligned (arena offsets are aligned by the
    /// planner; misaligned regions fall back to `get`).
    pub fn as_f32(&self) -> Option<&'a [f32]> {
        if self.meta.kind() != ElementKind::Float32 {
            return None;
        }
        // SAFETY: f32 has no invalid bit patterns; align_to guarantees
        // the mid slice is correctly aligned.
        let (head, mid, tail) = unsafe { self.data.align_to::<f32>() };
        if head.is_empty() && tail.is_empty() {
            Some(mid)
        } else {
            None
        }
    }

    /// Decodes the whole tensor into a caller-supplied float slice.
    pub fn copy_to_f32(&self, dest: &mut [f32]) -> Result<(), TensorError> {
        if dest.len() != self.len() {
            return Err(TensorError::CopyLengthMismatch {
                expected: self.len(),
                actual: dest.len(),
            });
        }
        if let Some(src) = self.as_f32() {
            dest.copy_from_slice(src);
        } else {
            for (i, d) in dest.iter_mut().enumerate() {
                *d = self.get(i);
            }
        }
        Ok(())
    }
}

/// Mutable view over one tensor's bytes.
#[derive(Debug)]
pub struct TensorViewMut<'a> {
    meta: &'a TensorMeta,
    data: &'a mut [u8],
}

impl<'a> TensorViewMut<'a> {
    /// Wraps a mutable byte region as a view of `meta`.
    ///
    /// Same length contract as [`TensorView::new`].
    pub fn new(meta: &'a TensorMeta, data: &'a mut [u8]) -> Result<Self, TensorError> {
        if data.len() != meta.size_bytes() {
            return Err(TensorError::BufferSizeMismatch {
                shape: meta.shape().clone(),
                kind: meta.kind(),
                expected: meta.size_bytes(),
                actual: data.len(),
            });
        }
        Ok(Self { meta, data })
    }

    pub fn meta(&self) -> &TensorMeta {
        self.meta
    }

    pub fn shape(&self) -> &Shape {
        self.meta.shape()
    }

    pub fn kind(&self) -> ElementKind {
        self.meta.kind()
    }

    pub fn len(&self) -> usize {
        self.meta.num_elements()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decodes element `i` as a float.
    pub fn get(&self, i: usize) -> f32 {
        decode(self.data, self.meta.kind(), self.meta.scale(), i)
    }

    /// Encodes a float into element `i`.
    ///
    /// Fixed-point kinds round to nearest and saturate at the integer
    /// range limits.
    pub fn set(&mut self, i: usize, value: f32) {
        let scale = self.meta.scale();
        match self.meta.kind() {
            ElementKind::Float32 => {
                self.data[i * 4..i * 4 + 4].copy_from_slice(&value.to_le_bytes());
            }
            ElementKind::Fixed16 { .. } => {
                let q = (value / scale)
                    .round()
                    .clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16;
                self.data[i * 2..i * 2 + 2].copy_from_slice(&q.to_le_bytes());
            }
            ElementKind::Fixed8 { .. } => {
                let q = (value / scale)
                    .round()
                    .clamp(f32::from(i8::MIN), f32::from(i8::MAX)) as i8;
                self.data[i] = q as u8;
            }
        }
    }

    /// Mutable raw-slice fast path; see [`TensorView::as_f32`].
    pub fn as_f32_mut(&mut self) -> Option<&mut [f32]> {
        if self.meta.kind() != ElementKind::Float32 {
            return None;
        }
        // SAFETY: f32 has no invalid bit patterns; align_to_mut
        // guarantees the mid slice is correctly aligned.
        let (head, mid, tail) = unsafe { self.data.align_to_mut::<f32>() };
        if head.is_empty() && tail.is_empty() {
            Some(mid)
        } else {
            None
        }
    }

    /// Encodes a caller-supplied float slice into the whole tensor.
    pub fn copy_from_f32(&mut self, src: &[f32]) -> Result<(), TensorError> {
        if src.len() != self.len() {
            return Err(TensorError::CopyLengthMismatch {
                expected: self.len(),
                actual: src.len(),
            });
        }
        if let Some(dest) = self.as_f32_mut() {
            dest.copy_from_slice(src);
        } else {
            for (i, &v) in src.iter().enumerate() {
                self.set(i, v);
            }
        }
        Ok(())
    }

    /// Reborrows as an immutable view.
    pub fn as_view(&self) -> TensorView<'_> {
        TensorView {
            meta: self.meta,
            data: self.data,
        }
    }
}

/// Shared element decode for both view flavors.
fn decode(data: &[u8], kind: ElementKind, scale: f32, i: usize) -> f32 {
    match kind {
        ElementKind::Float32 => {
            let b: [u8; 4] = data[i * 4..i * 4 + 4].try_into().unwrap();
            f32::from_le_bytes(b)
        }
        ElementKind::Fixed16 { .. } => {
            let b: [u8; 2] = data[i * 2..i * 2 + 2].try_into().unwrap();
            f32::from(i16::from_le_bytes(b)) * scale
        }
        ElementKind::Fixed8 { .. } => f32::from(data[i] as i8) * scale,
    }
}
