// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor shape descriptors and dimension utilities.

use std::fmt;

/// Describes the dimensionality of a tensor.
///
/// Shapes are immutable once created. Equality is value equality on the
/// dimension sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a new shape from the given dimensions.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// let s = Shape::new(vec![2, 3, 4]);
    /// assert_eq!(s.rank(), 3);
    /// assert_eq!(s.num_elements(), 24);
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Creates a scalar shape (rank 0).
    pub fn scalar() -> Self {
        Self { dims: vec![] }
    }

    /// Creates a 1-D shape.
    pub fn vector(len: usize) -> Self {
        Self { dims: vec![len] }
    }

    /// Creates a 2-D shape (matrix).
    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self {
            dims: vec![rows, cols],
        }
    }

    /// Returns the number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the total number of elements.
    ///
    /// For a scalar shape (rank 0), returns 1. A zero-sized dimension
    /// makes the whole count 0; such tensors are legal and execute as
    /// no-ops.
    pub fn num_elements(&self) -> usize {
        if self.dims.is_empty() {
            1
        } else {
            self.dims.iter().product()
        }
    }

    /// Returns the dimensions as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the size of a specific dimension, or `None` if out of bounds.
    pub fn dim(&self, index: usize) -> Option<usize> {
        self.dims.get(index).copied()
    }

    /// Computes the memory footprint in bytes for a given [`crate::ElementKind`].
    pub fn size_bytes(&self, kind: super::ElementKind) -> usize {
        self.num_elements() * kind.size_bytes()
    }

    /// Computes row-major (C-order) strides for this shape.
    pub fn strides(&self) -> Vec<usize> {
        let rank = self.dims.len();
        if rank == 0 {
            return vec![];
        }
        let mut strides = vec![0usize; rank];
        strides[rank - 1] = 1;
        for i in (0..rank - 1).rev() {
            strides[i] = strides[i + 1] * self.dims[i + 1];
        }
        strides
    }

    /// Product of the dimensions before `axis`.
    ///
    /// This is the number of independent "rows" when the shape is folded
    /// at `axis`, the way base-axis operators treat their input. An axis
    /// of 0 yields 1; an axis ≥ rank yields `num_elements()`.
    pub fn outer_size(&self, axis: usize) -> usize {
        self.dims[..axis.min(self.dims.len())].iter().product()
    }

    /// Product of the dimensions from `axis` onward.
    ///
    /// The complementary fold: `outer_size(a) * inner_size(a) ==
    /// num_elements()` for every `a ≤ rank`.
    pub fn inner_size(&self, axis: usize) -> usize {
        self.dims[axis.min(self.dims.len())..].iter().product()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

/// Convenience: `Shape::from(vec![2, 3])`.
impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

/// Convenience: `Shape::from(&[2, 3][..])`.
impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ElementKind;

    #[test]
    fn test_scalar_shape() {
        let s = Shape::scalar();
        assert_eq!(s.rank(), 0);
        assert_eq!(s.num_elements(), 1);
        assert!(s.strides().is_empty());
    }

    #[test]
    fn test_vector_shape() {
        let s = Shape::vector(5);
        assert_eq!(s.rank(), 1);
        assert_eq!(s.num_elements(), 5);
        assert_eq!(s.strides(), vec![1]);
    }

    #[test]
    fn test_matrix_shape() {
        let s = Shape::matrix(3, 4);
        assert_eq!(s.rank(), 2);
        assert_eq!(s.num_elements(), 12);
        assert_eq!(s.strides(), vec![4, 1]);
        assert_eq!(s.size_bytes(ElementKind::Float32), 48);
    }

    #[test]
    fn test_zero_dimension() {
        let s = Shape::new(vec![4, 0, 2]);
        assert_eq!(s.num_elements(), 0);
        assert_eq!(s.size_bytes(ElementKind::Float32), 0);
    }

    #[test]
    fn test_product_matches_dims() {
        let s = Shape::new(vec![2, 3, 4, 5]);
        assert_eq!(s.num_elements(), 120);
        assert_eq!(s.strides(), vec![60, 20, 5, 1]);
    }

    #[test]
    fn test_outer_inner_split() {
        let s = Shape::new(vec![2, 3, 4]);
        assert_eq!(s.outer_size(0), 1);
        assert_eq!(s.outer_size(1), 2);
        assert_eq!(s.outer_size(2), 6);
        assert_eq!(s.inner_size(1), 12);
        assert_eq!(s.inner_size(3), 1);
        for axis in 0..=s.rank() {
            assert_eq!(s.outer_size(axis) * s.inner_size(axis), s.num_elements());
        }
    }

    #[test]
    fn test_display() {
        let s = Shape::new(vec![2, 3, 4]);
        assert_eq!(format!("{s}"), "[2, 3, 4]");
        assert_eq!(format!("{}", Shape::scalar()), "[]");
    }

    #[test]
    fn test_from_conversions() {
        let s1: Shape = vec![2, 3].into();
        let s2: Shape = (&[2, 3][..]).into();
        assert_eq!(s1, s2);
    }

    #[test]
    fn test_serde_roundtrip() {
        let s = Shape::new(vec![1, 4]);
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "[1,4]");
        let back: Shape = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
