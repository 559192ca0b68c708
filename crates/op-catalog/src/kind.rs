// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Operator-kind tags.

/// Enumerates every operator kind the catalog implements.
///
/// The serialized network carries the tag as a string; [`OpKind::parse`]
/// resolves it at load time, and an unrecognized tag is a hard
/// load-time error — never deferred to execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    // Neural network layers.
    Affine,
    MaxPooling,
    AveragePooling,
    SumPooling,
    // Activations.
    Relu,
    LeakyRelu,
    Sigmoid,
    Tanh,
    Swish,
    Elu,
    Selu,
    Softmax,
    // Elementwise arithmetic (two tensors, equal shapes).
    Add2,
    Sub2,
    Mul2,
    Div2,
    Pow2,
    Maximum2,
    Minimum2,
    // Scalar arithmetic (one tensor, one configured value).
    AddScalar,
    MulScalar,
    PowScalar,
    RSubScalar,
    RDivScalar,
    RPowScalar,
    MaximumScalar,
    MinimumScalar,
    // Math.
    Abs,
    Exp,
    Log,
    Identity,
    BatchMatmul,
    // Array manipulation.
    Reshape,
    Transpose,
    Concatenate,
}

impl OpKind {
    /// Resolves a serialized tag string, or `None` for an unknown tag.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "affine" => Some(Self::Affine),
            "max_pooling" => Some(Self::MaxPooling),
            "average_pooling" => Some(Self::AveragePooling),
            "sum_pooling" => Some(Self::SumPooling),
            "relu" => Some(Self::Relu),
            "leaky_relu" => Some(Self::LeakyRelu),
            "sigmoid" => Some(Self::Sigmoid),
            "tanh" => Some(Self::Tanh),
            "swish" => Some(Self::Swish),
            "elu" => Some(Self::Elu),
            "selu" => Some(Self::Selu),
            "softmax" => Some(Self::Softmax),
            "add2" => Some(Self::Add2),
            "sub2" => Some(Self::Sub2),
            "mul2" => Some(Self::Mul2),
            "div2" => Some(Self::Div2),
            "pow2" => Some(Self::Pow2),
            "maximum2" => Some(Self::Maximum2),
            "minimum2" => Some(Self::Minimum2),
            "add_scalar" => Some(Self::AddScalar),
            "mul_scalar" => Some(Self::MulScalar),
            "pow_scalar" => Some(Self::PowScalar),
            "r_sub_scalar" => Some(Self::RSubScalar),
            "r_div_scalar" => Some(Self::RDivScalar),
            "r_pow_scalar" => Some(Self::RPowScalar),
            "maximum_scalar" => Some(Self::MaximumScalar),
            "minimum_scalar" => Some(Self::MinimumScalar),
            "abs" => Some(Self::Abs),
            "exp" => Some(Self::Exp),
            "log" => Some(Self::Log),
            "identity" => Some(Self::Identity),
            "batch_matmul" => Some(Self::BatchMatmul),
            "reshape" => Some(Self::Reshape),
            "transpose" => Some(Self::Transpose),
            "concatenate" => Some(Self::Concatenate),
            _ => None,
        }
    }

    /// Returns the serialized tag string for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Affine => "affine",
            Self::MaxPooling => "max_pooling",
            Self::AveragePooling => "average_pooling",
            Self::SumPooling => "sum_pooling",
            Self::Relu => "relu",
            Self::LeakyRelu => "leaky_relu",
            Self::Sigmoid => "sigmoid",
            Self::Tanh => "tanh",
            Self::Swish => "swish",
            Self::Elu => "elu",
            Self::Selu => "selu",
            Self::Softmax => "softmax",
            Self::Add2 => "add2",
            Self::Sub2 => "sub2",
            Self::Mul2 => "mul2",
            Self::Div2 => "div2",
            Self::Pow2 => "pow2",
            Self::Maximum2 => "maximum2",
            Self::Minimum2 => "minimum2",
            Self::AddScalar => "add_scalar",
            Self::MulScalar => "mul_scalar",
            Self::PowScalar => "pow_scalar",
            Self::RSubScalar => "r_sub_scalar",
            Self::RDivScalar => "r_div_scalar",
            Self::RPowScalar => "r_pow_scalar",
            Self::MaximumScalar => "maximum_scalar",
            Self::MinimumScalar => "minimum_scalar",
            Self::Abs => "abs",
            Self::Exp => "exp",
            Self::Log => "log",
            Self::Identity => "identity",
            Self::BatchMatmul => "batch_matmul",
            Self::Reshape => "reshape",
            Self::Transpose => "transpose",
            Self::Concatenate => "concatenate",
        }
    }
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
