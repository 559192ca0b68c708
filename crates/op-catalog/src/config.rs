// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-kind operator configuration records.

/// The configuration record attached to a function node.
///
/// Which variant a kind expects is part of the catalog contract; a
/// kernel's setup rejects any other variant with
/// [`crate::OpError::InvalidConfig`]. Kinds without parameters use
/// `None`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpConfig {
    /// No configuration.
    None,
    /// A single scalar value (the scalar-arithmetic family, leaky-relu
    /// alpha, elu alpha).
    Scalar { val: f32 },
    /// An axis index (softmax, concatenate).
    Axis { axis: usize },
    /// Affine fold point: dimensions before `base_axis` are the batch,
    /// the rest are the input features.
    Affine { base_axis: usize },
    /// Selu's two coefficients.
    Selu { scale: f32, alpha: f32 },
    /// 2-D pooling window geometry.
    Pooling {
        kernel: Vec<usize>,
        stride: Vec<usize>,
        pad: Vec<usize>,
        ignore_border: bool,
        #[serde(default)]
        including_pad: bool,
    },
    /// Target shape for reshape.
    Reshape { shape: Vec<usize> },
    /// Axis permutation for transpose.
    Transpose { axes: Vec<usize> },
    /// Batch matrix multiply transposition flags.
    BatchMatmul {
        #[serde(default)]
        transpose_a: bool,
        #[serde(default)]
        transpose_b: bool,
    },
}

impl Default for OpConfig {
    fn default() -> Self {
        OpConfig::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_forms() {
        let json = serde_json::to_string(&OpConfig::Scalar { val: 2.5 }).unwrap();
        assert_eq!(json, "{\"scalar\":{\"val\":2.5}}");

        let json = serde_json::to_string(&OpConfig::None).unwrap();
        assert_eq!(json, "\"none\"");

        let back: OpConfig = serde_json::from_str("{\"axis\":{\"axis\":1}}").unwrap();
        assert_eq!(back, OpConfig::Axis { axis: 1 });
    }

    #[test]
    fn test_pooling_defaults() {
        let json = r#"{"pooling":{"kernel":[2,2],"stride":[2,2],"pad":[0,0],"ignore_border":true}}"#;
        let cfg: OpConfig = serde_json::from_str(json).unwrap();
        match cfg {
            OpConfig::Pooling { including_pad, .. } => assert!(!including_pad),
            other => panic!("unexpected config: {other:?}"),
        }
    }

    #[test]
    fn test_default_is_none() {
        assert_eq!(OpConfig::default(), OpConfig::None);
    }
}
