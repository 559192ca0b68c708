// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The tag → implementation table.

use crate::kernels::{
    affine::Affine,
    elementwise::{Map1, Map1Param, Map2, Selu},
    manipulation::{Concatenate, Reshape, Transpose},
    matmul::BatchMatmul,
    pooling::{PoolMode, Pooling},
    softmax::Softmax,
};
use crate::{NodeSignature, OpConfig, OpError, OpKind, Operator};

/// The operator catalog.
///
/// One closed dispatch table covers every [`OpKind`]; the mapping is
/// total, so a kind that parses always instantiates or fails with a
/// node-level validation error.
pub struct Catalog;

impl Catalog {
    /// The allocate-local-state step of the operator contract.
    ///
    /// Validates the node's configuration record, arity and shapes for
    /// `kind`, precomputes derived execution parameters, and returns
    /// the node's exclusively owned operator instance. Must succeed
    /// before the node may execute.
    pub fn instantiate(
        kind: OpKind,
        config: &OpConfig,
        sig: &NodeSignature<'_>,
    ) -> Result<Box<dyn Operator>, OpError> {
        let op: Box<dyn Operator> = match kind {
            // Neural network layers.
            OpKind::Affine => {
                let base_axis = affine_axis(kind, config)?;
                Box::new(Affine::new(base_axis, sig)?)
            }
            OpKind::MaxPooling => Box::new(pooling(PoolMode::Max, kind, config, sig)?),
            OpKind::AveragePooling => Box::new(pooling(PoolMode::Average, kind, config, sig)?),
            OpKind::SumPooling => Box::new(pooling(PoolMode::Sum, kind, config, sig)?),

            // Activations.
            OpKind::Relu => {
                no_config(kind, config)?;
                Box::new(Map1::new("relu", |x| x.max(0.0), sig)?)
            }
            OpKind::LeakyRelu => {
                let alpha = scalar(kind, config)?;
                Box::new(Map1Param::new(
                    "leaky_relu",
                    |x, a| if x >= 0.0 { x } else { a * x },
                    alpha,
                    sig,
                )?)
            }
            OpKind::Sigmoid => {
                no_config(kind, config)?;
                Box::new(Map1::new("sigmoid", |x| 1.0 / (1.0 + (-x).exp()), sig)?)
            }
            OpKind::Tanh => {
                no_config(kind, config)?;
                Box::new(Map1::new("tanh", f32::tanh, sig)?)
            }
            OpKind::Swish => {
                no_config(kind, config)?;
                Box::new(Map1::new("swish", |x| x / (1.0 + (-x).exp()), sig)?)
            }
            OpKind::Elu => {
                let alpha = scalar(kind, config)?;
                Box::new(Map1Param::new(
                    "elu",
                    |x, a| if x > 0.0 { x } else { a * (x.exp() - 1.0) },
                    alpha,
                    sig,
                )?)
            }
            OpKind::Selu => match config {
                OpConfig::Selu { scale, alpha } => Box::new(Selu::new(*scale, *alpha, sig)?),
                other => return Err(bad_config(kind, "selu { scale, alpha }", other)),
            },
            OpKind::Softmax => {
                let axis = axis(kind, config)?;
                Box::new(Softmax::new(axis, sig)?)
            }

            // Elementwise arithmetic.
            OpKind::Add2 => {
                no_config(kind, config)?;
                Box::new(Map2::new("add2", |a, b| a + b, sig)?)
            }
            OpKind::Sub2 => {
                no_config(kind, config)?;
                Box::new(Map2::new("sub2", |a, b| a - b, sig)?)
            }
            OpKind::Mul2 => {
                no_config(kind, config)?;
                Box::new(Map2::new("mul2", |a, b| a * b, sig)?)
            }
            OpKind::Div2 => {
                no_config(kind, config)?;
                Box::new(Map2::new("div2", |a, b| a / b, sig)?)
            }
            OpKind::Pow2 => {
                no_config(kind, config)?;
                Box::new(Map2::new("pow2", f32::powf, sig)?)
            }
            OpKind::Maximum2 => {
                no_config(kind, config)?;
                Box::new(Map2::new("maximum2", f32::max, sig)?)
            }
            OpKind::Minimum2 => {
                no_config(kind, config)?;
                Box::new(Map2::new("minimum2", f32::min, sig)?)
            }

            // Scalar arithmetic.
            OpKind::AddScalar => {
                let v = scalar(kind, config)?;
                Box::new(Map1Param::new("add_scalar", |x, p| x + p, v, sig)?)
            }
            OpKind::MulScalar => {
                let v = scalar(kind, config)?;
                Box::new(Map1Param::new("mul_scalar", |x, p| x * p, v, sig)?)
            }
            OpKind::PowScalar => {
                let v = scalar(kind, config)?;
                Box::new(Map1Param::new("pow_scalar", f32::powf, v, sig)?)
            }
            OpKind::RSubScalar => {
                let v = scalar(kind, config)?;
                Box::new(Map1Param::new("r_sub_scalar", |x, p| p - x, v, sig)?)
            }
            OpKind::RDivScalar => {
                let v = scalar(kind, config)?;
                Box::new(Map1Param::new("r_div_scalar", |x, p| p / x, v, sig)?)
            }
            OpKind::RPowScalar => {
                let v = scalar(kind, config)?;
                Box::new(Map1Param::new("r_pow_scalar", |x, p| p.powf(x), v, sig)?)
            }
            OpKind::MaximumScalar => {
                let v = scalar(kind, config)?;
                Box::new(Map1Param::new("maximum_scalar", f32::max, v, sig)?)
            }
            OpKind::MinimumScalar => {
                let v = scalar(kind, config)?;
                Box::new(Map1Param::new("minimum_scalar", f32::min, v, sig)?)
            }

            // Math.
            OpKind::Abs => {
                no_config(kind, config)?;
                Box::new(Map1::new("abs", f32::abs, sig)?)
            }
            OpKind::Exp => {
                no_config(kind, config)?;
                Box::new(Map1::new("exp", f32::exp, sig)?)
            }
            OpKind::Log => {
                no_config(kind, config)?;
                Box::new(Map1::new("log", f32::ln, sig)?)
            }
            OpKind::Identity => {
                no_config(kind, config)?;
                Box::new(Map1::new("identity", |x| x, sig)?)
            }
            OpKind::BatchMatmul => {
                let (ta, tb) = match config {
                    OpConfig::None => (false, false),
                    OpConfig::BatchMatmul {
                        transpose_a,
                        transpose_b,
                    } => (*transpose_a, *transpose_b),
                    other => return Err(bad_config(kind, "batch_matmul { transpose_a, transpose_b }", other)),
                };
                Box::new(BatchMatmul::new(ta, tb, sig)?)
            }

            // Array manipulation.
            OpKind::Reshape => match config {
                OpConfig::Reshape { shape } => Box::new(Reshape::new(shape, sig)?),
                other => return Err(bad_config(kind, "reshape { shape }", other)),
            },
            OpKind::Transpose => match config {
                OpConfig::Transpose { axes } => Box::new(Transpose::new(axes, sig)?),
                other => return Err(bad_config(kind, "transpose { axes }", other)),
            },
            OpKind::Concatenate => {
                let axis = axis(kind, config)?;
                Box::new(Concatenate::new(axis, sig)?)
            }
        };
        Ok(op)
    }
}

fn bad_config(kind: OpKind, expected: &str, got: &OpConfig) -> OpError {
    OpError::InvalidConfig {
        detail: format!("{kind} expects {expected}, got {got:?}"),
    }
}

fn no_config(kind: OpKind, config: &OpConfig) -> Result<(), OpError> {
    match config {
        OpConfig::None => Ok(()),
        other => Err(bad_config(kind, "no configuration", other)),
    }
}

fn scalar(kind: OpKind, config: &OpConfig) -> Result<f32, OpError> {
    match config {
        OpConfig::Scalar { val } => Ok(*val),
        other => Err(bad_config(kind, "scalar { val }", other)),
    }
}

fn axis(kind: OpKind, config: &OpConfig) -> Result<usize, OpError> {
    match config {
        OpConfig::Axis { axis } => Ok(*axis),
        other => Err(bad_config(kind, "axis { axis }", other)),
    }
}

fn affine_axis(kind: OpKind, config: &OpConfig) -> Result<usize, OpError> {
    match config {
        OpConfig::Affine { base_axis } => Ok(*base_axis),
        other => Err(bad_config(kind, "affine { base_axis }", other)),
    }
}

fn pooling(
    mode: PoolMode,
    kind: OpKind,
    config: &OpConfig,
    sig: &NodeSignature<'_>,
) -> Result<Pooling, OpError> {
    match config {
        OpConfig::Pooling {
            kernel,
            stride,
            pad,
            ignore_border,
            including_pad,
        } => Pooling::new(
            mode,
            kernel,
            stride,
            pad,
            *ignore_border,
            *including_pad,
            sig,
        ),
        other => Err(bad_config(kind, "pooling { kernel, stride, pad, .. }", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensor_core::{ElementKind, Shape, TensorMeta};

    fn meta(dims: Vec<usize>) -> TensorMeta {
        TensorMeta::new(Shape::new(dims), ElementKind::Float32)
    }

    #[test]
    fn test_instantiate_relu() {
        let m = meta(vec![1, 4]);
        let inputs = [&m];
        let outputs = [&m];
        let sig = NodeSignature::new(&inputs, &outputs);
        assert!(Catalog::instantiate(OpKind::Relu, &OpConfig::None, &sig).is_ok());
    }

    #[test]
    fn test_instantiate_rejects_wrong_config_variant() {
        let m = meta(vec![1, 4]);
        let inputs = [&m];
        let outputs = [&m];
        let sig = NodeSignature::new(&inputs, &outputs);
        assert!(matches!(
            Catalog::instantiate(OpKind::Relu, &OpConfig::Scalar { val: 1.0 }, &sig),
            Err(OpError::InvalidConfig { .. })
        ));
        assert!(matches!(
            Catalog::instantiate(OpKind::AddScalar, &OpConfig::None, &sig),
            Err(OpError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_instantiate_rejects_bad_arity_at_setup() {
        // Arity and shape problems surface here, never at execute.
        let m = meta(vec![1, 4]);
        let inputs = [&m, &m];
        let outputs = [&m];
        let sig = NodeSignature::new(&inputs, &outputs);
        assert!(matches!(
            Catalog::instantiate(OpKind::Relu, &OpConfig::None, &sig),
            Err(OpError::InputArity { .. })
        ));
    }

    #[test]
    fn test_instantiate_every_map_kind() {
        let m = meta(vec![2, 2]);
        let unary = [&m];
        let outputs = [&m];

        for kind in [
            OpKind::Relu,
            OpKind::Sigmoid,
            OpKind::Tanh,
            OpKind::Swish,
            OpKind::Abs,
            OpKind::Exp,
            OpKind::Log,
            OpKind::Identity,
        ] {
            let sig = NodeSignature::new(&unary, &outputs);
            assert!(
                Catalog::instantiate(kind, &OpConfig::None, &sig).is_ok(),
                "{kind} failed"
            );
        }

        for kind in [
            OpKind::LeakyRelu,
            OpKind::Elu,
            OpKind::AddScalar,
            OpKind::MulScalar,
            OpKind::PowScalar,
            OpKind::RSubScalar,
            OpKind::RDivScalar,
            OpKind::RPowScalar,
            OpKind::MaximumScalar,
            OpKind::MinimumScalar,
        ] {
            let sig = NodeSignature::new(&unary, &outputs);
            assert!(
                Catalog::instantiate(kind, &OpConfig::Scalar { val: 0.5 }, &sig).is_ok(),
                "{kind} failed"
            );
        }

        let binary = [&m, &m];
        for kind in [
            OpKind::Add2,
            OpKind::Sub2,
            OpKind::Mul2,
            OpKind::Div2,
            OpKind::Pow2,
            OpKind::Maximum2,
            OpKind::Minimum2,
        ] {
            let sig = NodeSignature::new(&binary, &outputs);
            assert!(
                Catalog::instantiate(kind, &OpConfig::None, &sig).is_ok(),
                "{kind} failed"
            );
        }
    }

    #[test]
    fn test_instantiate_selu_requires_both_coefficients() {
        let m = meta(vec![4]);
        let inputs = [&m];
        let outputs = [&m];
        let sig = NodeSignature::new(&inputs, &outputs);
        assert!(Catalog::instantiate(
            OpKind::Selu,
            &OpConfig::Selu {
                scale: 1.0507,
                alpha: 1.67326
            },
            &sig
        )
        .is_ok());
        assert!(Catalog::instantiate(OpKind::Selu, &OpConfig::Scalar { val: 1.0 }, &sig).is_err());
    }

    #[test]
    fn test_instantiate_batch_matmul_defaults() {
        let a = meta(vec![2, 2]);
        let inputs = [&a, &a];
        let outputs = [&a];
        let sig = NodeSignature::new(&inputs, &outputs);
        assert!(Catalog::instantiate(OpKind::BatchMatmul, &OpConfig::None, &sig).is_ok());
    }
}
