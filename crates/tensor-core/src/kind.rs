// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Supported tensor element encodings.

use crate::TensorError;

/// The serialized fractional-position field is four bits wide.
const MAX_FRAC_BITS: u8 = 15;

/// Enumerates the element encodings a tensor buffer can hold.
///
/// Fixed-point kinds store signed integers; the runtime converts through
/// `float_value = stored_integer × scale`, where the default scale is
/// `2^-frac_bits`. The network description may override the scale per
/// variable, so `frac_bits` is kept as data rather than folded away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// 32-bit IEEE 754 floating point.
    Float32,
    /// 16-bit signed fixed point.
    Fixed16 { frac_bits: u8 },
    /// 8-bit signed fixed point.
    Fixed8 { frac_bits: u8 },
}

impl ElementKind {
    /// Returns the size of a single element in bytes.
    pub fn size_bytes(self) -> usize {
        match self {
            ElementKind::Float32 => 4,
            ElementKind::Fixed16 { .. } => 2,
            ElementKind::Fixed8 { .. } => 1,
        }
    }

    /// Returns the quantization scale derived from the fractional bit
    /// position: `2^-frac_bits`. For `Float32` this is 1.0.
    pub fn default_scale(self) -> f32 {
        match self {
            ElementKind::Float32 => 1.0,
            ElementKind::Fixed16 { frac_bits } | ElementKind::Fixed8 { frac_bits } => {
                (2f32).powi(-i32::from(frac_bits))
            }
        }
    }

    /// Checks the fractional bit position against the format's 4-bit range.
    pub fn validate(self) -> Result<(), TensorError> {
        match self {
            ElementKind::Float32 => Ok(()),
            ElementKind::Fixed16 { frac_bits } | ElementKind::Fixed8 { frac_bits } => {
                if frac_bits > MAX_FRAC_BITS {
                    Err(TensorError::FracBitsOutOfRange { frac_bits })
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Returns a human-readable label for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Float32 => "float32",
            ElementKind::Fixed16 { .. } => "fixed16",
            ElementKind::Fixed8 { .. } => "fixed8",
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementKind::Float32 => f.write_str("float32"),
            ElementKind::Fixed16 { frac_bits } => write!(f, "fixed16(frac_bits={frac_bits})"),
            ElementKind::Fixed8 { frac_bits } => write!(f, "fixed8(frac_bits={frac_bits})"),
        }
    }
}
