// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Planner input vocabulary: storage classes and liveness windows.

/// How a tensor's storage is obtained.
///
/// Declared per variable in the network description; only `Scratch`
/// tensors compete for arena offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageClass {
    /// Context-owned heap buffer, live for the whole context lifetime.
    Dedicated,
    /// Baked constant data (weights, biases); never pooled, never
    /// zeroed, released with the context.
    Constant,
    /// A slot in the shared scratch arena, reusable across
    /// non-overlapping liveness windows.
    Scratch,
    /// Designated forward-call input endpoint.
    Input,
    /// Designated forward-call output endpoint.
    Output,
}

impl StorageClass {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageClass::Dedicated => "dedicated",
            StorageClass::Constant => "constant",
            StorageClass::Scratch => "scratch",
            StorageClass::Input => "input",
            StorageClass::Output => "output",
        }
    }
}

impl std::fmt::Display for StorageClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The window of node-order indices during which a tensor's value must
/// remain valid, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Liveness {
    /// Index of the node that first touches the tensor.
    pub first_use: usize,
    /// Index of the node that last touches the tensor.
    pub last_use: usize,
}

impl Liveness {
    pub fn new(first_use: usize, last_use: usize) -> Self {
        Self {
            first_use,
            last_use,
        }
    }

    /// Returns `true` if the two windows share any node index.
    pub fn overlaps(&self, other: &Liveness) -> bool {
        self.first_use <= other.last_use && other.first_use <= self.last_use
    }
}

/// One tensor's planning input: byte footprint, declared class, window.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub size_bytes: usize,
    pub class: StorageClass,
    pub liveness: Liveness,
}

impl PlanRequest {
    pub fn new(size_bytes: usize, class: StorageClass, liveness: Liveness) -> Self {
        Self {
            size_bytes,
            class,
            liveness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_is_inclusive() {
        let a = Liveness::new(0, 2);
        let b = Liveness::new(2, 4);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_disjoint_windows() {
        let a = Liveness::new(0, 1);
        let b = Liveness::new(2, 3);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_nested_windows_overlap() {
        let outer = Liveness::new(0, 10);
        let inner = Liveness::new(3, 4);
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn test_class_labels() {
        assert_eq!(StorageClass::Scratch.as_str(), "scratch");
        assert_eq!(format!("{}", StorageClass::Input), "input");
    }
}
