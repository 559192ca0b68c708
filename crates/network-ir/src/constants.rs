// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Baked-constant resolution from a SafeTensors sidecar.
//!
//! Graph topology travels as JSON; weight data that would bloat the
//! document lives in a SafeTensors file next to it. Each constant
//! variable names its tensor with `constant_key`; this module
//! memory-maps the sidecar once and fills every pending key.

use crate::{NetworkDescription, NetworkError};
use std::path::Path;
use tensor_core::Shape;

impl NetworkDescription {
    /// Resolves every pending `constant_key` against a SafeTensors file.
    ///
    /// Only the referenced tensors are decoded; the file is mapped, not
    /// read whole. Inline `data` already present is left untouched.
    pub fn load_constants(&mut self, path: &Path) -> Result<(), NetworkError> {
        let file = std::fs::File::open(path).map_err(|e| NetworkError::Sidecar {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;

        // Map the file for zero-copy header parsing; tensor payloads
        // are only touched for the keys the description references.
        let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| NetworkError::Sidecar {
            path: path.display().to_string(),
            detail: format!("mmap failed: {e}"),
        })?;

        let tensors =
            safetensors::SafeTensors::deserialize(&mmap).map_err(|e| NetworkError::Sidecar {
                path: path.display().to_string(),
                detail: format!("SafeTensors parse error: {e}"),
            })?;

        let mut resolved = 0usize;
        for var in &mut self.variables {
            if var.data.is_some() {
                continue;
            }
            let Some(key) = &var.constant_key else {
                continue;
            };

            let view = tensors
                .tensor(key)
                .map_err(|_| NetworkError::ConstantNotFound { key: key.clone() })?;

            if view.dtype() != safetensors::Dtype::F32 {
                return Err(NetworkError::ConstantMismatch {
                    key: key.clone(),
                    detail: format!("sidecar dtype {:?}, expected F32", view.dtype()),
                });
            }
            if view.shape() != var.shape.as_slice() {
                return Err(NetworkError::ConstantMismatch {
                    key: key.clone(),
                    detail: format!(
                        "sidecar shape {}, variable declares {}",
                        Shape::new(view.shape().to_vec()),
                        Shape::new(var.shape.clone())
                    ),
                });
            }

            let values: Vec<f32> = view
                .data()
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes(c.try_into().expect("chunks_exact yields 4 bytes")))
                .collect();
            var.data = Some(values);
            resolved += 1;
        }

        tracing::debug!(
            "resolved {resolved} sidecar constant(s) from '{}'",
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FormatVersion, FunctionDecl, StorageClass, VariableDecl};
    use op_catalog::OpConfig;
    use std::collections::HashMap;

    fn write_sidecar(name: &str, tensors: &[(&str, Vec<usize>, Vec<f32>)]) -> std::path::PathBuf {
        let store: Vec<(String, Vec<usize>, Vec<u8>)> = tensors
            .iter()
            .map(|(key, shape, values)| {
                let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
                (key.to_string(), shape.clone(), bytes)
            })
            .collect();
        let views: HashMap<String, safetensors::tensor::TensorView<'_>> = store
            .iter()
            .map(|(key, shape, bytes)| {
                (
                    key.clone(),
                    safetensors::tensor::TensorView::new(
                        safetensors::Dtype::F32,
                        shape.clone(),
                        bytes,
                    )
                    .unwrap(),
                )
            })
            .collect();

        let bytes = safetensors::serialize(&views, &None).unwrap();
        let path = std::env::temp_dir().join(format!("network_ir_test_{name}.safetensors"));
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn affine_description() -> NetworkDescription {
        NetworkDescription {
            version: FormatVersion::supported(),
            name: "affine_net".into(),
            variables: vec![
                VariableDecl::new("x", vec![1, 2], StorageClass::Input),
                VariableDecl::new("w", vec![2, 2], StorageClass::Constant)
                    .with_constant_key("w"),
                VariableDecl::new("y", vec![1, 2], StorageClass::Output),
            ],
            functions: vec![FunctionDecl::new(
                "affine0",
                "affine",
                vec![0, 1],
                vec![2],
                OpConfig::Affine { base_axis: 1 },
            )],
            inputs: vec![0],
            outputs: vec![2],
        }
    }

    #[test]
    fn test_load_constants() {
        let path = write_sidecar("ok", &[("w", vec![2, 2], vec![1.0, 0.0, 0.0, 1.0])]);
        let mut net = affine_description();
        net.load_constants(&path).unwrap();

        assert_eq!(net.variables[1].data, Some(vec![1.0, 0.0, 0.0, 1.0]));
        assert!(!net.needs_sidecar());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_key() {
        let path = write_sidecar("missing", &[("other", vec![2, 2], vec![0.0; 4])]);
        let mut net = affine_description();
        assert!(matches!(
            net.load_constants(&path),
            Err(NetworkError::ConstantNotFound { .. })
        ));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_shape_disagreement() {
        let path = write_sidecar("shape", &[("w", vec![4], vec![0.0; 4])]);
        let mut net = affine_description();
        assert!(matches!(
            net.load_constants(&path),
            Err(NetworkError::ConstantMismatch { .. })
        ));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file() {
        let mut net = affine_description();
        let bogus = std::env::temp_dir().join("network_ir_test_does_not_exist.safetensors");
        assert!(matches!(
            net.load_constants(&bogus),
            Err(NetworkError::Sidecar { .. })
        ));
    }

    #[test]
    fn test_inline_data_untouched() {
        let path = write_sidecar("inline", &[("w", vec![2, 2], vec![9.0; 4])]);
        let mut net = affine_description();
        net.variables[1].data = Some(vec![1.0, 2.0, 3.0, 4.0]);
        net.load_constants(&path).unwrap();
        // Inline wins; the sidecar copy is not consulted.
        assert_eq!(net.variables[1].data, Some(vec![1.0, 2.0, 3.0, 4.0]));
        std::fs::remove_file(path).ok();
    }
}
