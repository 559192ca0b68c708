// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor descriptors and views.

use crate::{ElementKind, Shape};

/// Errors that can occur constructing or accessing tensor views.
#[derive(Debug, thiserror::Error)]
pub enum TensorError {
    /// The backing buffer does not hold exactly the bytes the shape and
    /// element kind imply.
    #[error("buffer holds {actual} bytes but shape {shape} with kind {kind} needs {expected}")]
    BufferSizeMismatch {
        shape: Shape,
        kind: ElementKind,
        expected: usize,
        actual: usize,
    },

    /// The serialized fractional bit position exceeds the 4-bit field range.
    #[error("fractional bit position {frac_bits} is out of range (0-15)")]
    FracBitsOutOfRange { frac_bits: u8 },

    /// A bulk copy was attempted with a slice of the wrong element count.
    #[error("copy of {actual} elements into a tensor of {expected} elements")]
    CopyLengthMismatch { expected: usize, actual: usize },
}
