// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Operator kernel implementations.
//!
//! Kernels validate everything they can at setup and keep execute
//! branch-light. Families sharing a calculation skeleton share a struct
//! (the elementwise maps, the pooling modes); operators with real
//! geometry get their own module.

pub(crate) mod affine;
pub(crate) mod elementwise;
pub(crate) mod manipulation;
pub(crate) mod matmul;
pub(crate) mod pooling;
pub(crate) mod softmax;

use crate::OpError;
use tensor_core::TensorMeta;

/// Checks that two descriptors agree on total element count and returns it.
pub(crate) fn same_elements(a: &TensorMeta, b: &TensorMeta) -> Result<usize, OpError> {
    let na = a.num_elements();
    let nb = b.num_elements();
    if na != nb {
        return Err(OpError::ShapeMismatch {
            detail: format!(
                "element counts differ: {} has {na}, {} has {nb}",
                a.shape(),
                b.shape()
            ),
        });
    }
    Ok(na)
}
