// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The network description document and its structural validation.

use crate::NetworkError;
use buffer_planner::StorageClass;
use op_catalog::OpConfig;
use tensor_core::{ElementKind, Shape, TensorMeta};

/// Format major version this runtime consumes. A document with a
/// different major version is rejected before anything is allocated.
pub const FORMAT_MAJOR_VERSION: u32 = 1;

/// Highest minor version this runtime understands. Newer minors may
/// carry fields this runtime would silently ignore, so they are
/// rejected too; older minors are fine.
pub const FORMAT_MINOR_VERSION: u32 = 0;

/// The document's format version stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FormatVersion {
    pub major: u32,
    pub minor: u32,
}

impl FormatVersion {
    /// The version this runtime supports.
    pub fn supported() -> Self {
        Self {
            major: FORMAT_MAJOR_VERSION,
            minor: FORMAT_MINOR_VERSION,
        }
    }

    /// Whether this runtime can consume a document of this version.
    pub fn is_supported(&self) -> bool {
        self.major == FORMAT_MAJOR_VERSION && self.minor <= FORMAT_MINOR_VERSION
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// One declared tensor variable.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VariableDecl {
    /// Human-readable name, used in diagnostics.
    pub name: String,
    /// Dimension sizes.
    pub shape: Vec<usize>,
    /// Element encoding; defaults to f32.
    #[serde(default = "default_kind")]
    pub kind: ElementKind,
    /// Explicit quantization scale overriding the kind's power-of-two
    /// default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    /// Storage-class hint consumed by the buffer planner.
    pub allocation: StorageClass,
    /// Inline baked constant data (row-major f32 values).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<f32>>,
    /// Key into the SafeTensors sidecar for out-of-line constants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant_key: Option<String>,
}

fn default_kind() -> ElementKind {
    ElementKind::Float32
}

impl VariableDecl {
    /// Creates a plain f32 variable.
    pub fn new(name: impl Into<String>, shape: Vec<usize>, allocation: StorageClass) -> Self {
        Self {
            name: name.into(),
            shape,
            kind: ElementKind::Float32,
            scale: None,
            allocation,
            data: None,
            constant_key: None,
        }
    }

    /// Sets the element kind.
    pub fn with_kind(mut self, kind: ElementKind) -> Self {
        self.kind = kind;
        self
    }

    /// Attaches inline baked constant data.
    pub fn with_data(mut self, data: Vec<f32>) -> Self {
        self.data = Some(data);
        self
    }

    /// References a sidecar constant by key.
    pub fn with_constant_key(mut self, key: impl Into<String>) -> Self {
        self.constant_key = Some(key.into());
        self
    }

    /// Builds the typed descriptor for this variable.
    pub fn meta(&self) -> TensorMeta {
        let shape = Shape::new(self.shape.clone());
        match self.scale {
            Some(scale) => TensorMeta::with_scale(shape, self.kind, scale),
            None => TensorMeta::new(shape, self.kind),
        }
    }
}

/// One function node: an operator instance wired to variable ids.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FunctionDecl {
    /// Instance name, used in diagnostics.
    pub name: String,
    /// Operator tag, resolved against the catalog at load time.
    pub kind: String,
    /// Input variable ids, in wire order.
    pub inputs: Vec<usize>,
    /// Output variable ids, in wire order.
    pub outputs: Vec<usize>,
    /// Per-kind configuration record.
    #[serde(default)]
    pub config: OpConfig,
}

impl FunctionDecl {
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        inputs: Vec<usize>,
        outputs: Vec<usize>,
        config: OpConfig,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            inputs,
            outputs,
            config,
        }
    }
}

/// The complete serialized network.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NetworkDescription {
    pub version: FormatVersion,
    pub name: String,
    pub variables: Vec<VariableDecl>,
    /// Function nodes in execution order. The order is trusted as a
    /// valid topological schedule; it also fixes every liveness window
    /// the buffer planner reasons about.
    pub functions: Vec<FunctionDecl>,
    /// Designated input variable ids, in caller binding order.
    pub inputs: Vec<usize>,
    /// Designated output variable ids, in caller binding order.
    pub outputs: Vec<usize>,
}

impl NetworkDescription {
    /// Parses a JSON document.
    pub fn from_json(json: &str) -> Result<Self, NetworkError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parses a JSON document from raw bytes.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, NetworkError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serializes back to pretty JSON (toolchain and test aid).
    pub fn to_json(&self) -> Result<String, NetworkError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks structural consistency. Does not judge graph correctness:
    /// the declared order and wiring are the producer's contract.
    pub fn validate(&self) -> Result<(), NetworkError> {
        if self.functions.is_empty() {
            return Err(self.invalid("network declares no functions"));
        }
        if self.inputs.is_empty() {
            return Err(self.invalid("network declares no inputs"));
        }
        if self.outputs.is_empty() {
            return Err(self.invalid("network declares no outputs"));
        }

        for (i, var) in self.variables.iter().enumerate() {
            var.kind.validate().map_err(|e| {
                self.invalid(format!("variable '{}' (id {i}): {e}", var.name))
            })?;

            if let Some(scale) = var.scale {
                if !scale.is_finite() || scale == 0.0 {
                    return Err(self.invalid(format!(
                        "variable '{}' (id {i}): scale {scale} must be finite and non-zero",
                        var.name
                    )));
                }
            }

            if let Some(data) = &var.data {
                let expected = Shape::new(var.shape.clone()).num_elements();
                if data.len() != expected {
                    return Err(self.invalid(format!(
                        "variable '{}' (id {i}): {} data values for {} elements",
                        var.name,
                        data.len(),
                        expected
                    )));
                }
            }

            if var.allocation == StorageClass::Constant
                && var.data.is_none()
                && var.constant_key.is_none()
            {
                return Err(self.invalid(format!(
                    "constant variable '{}' (id {i}) carries neither data nor a constant key",
                    var.name
                )));
            }
        }

        for (i, func) in self.functions.iter().enumerate() {
            for &id in func.inputs.iter().chain(&func.outputs) {
                if id >= self.variables.len() {
                    return Err(self.invalid(format!(
                        "function '{}' (index {i}) references variable id {id}, but only {} exist",
                        func.name,
                        self.variables.len()
                    )));
                }
            }
            if func.outputs.is_empty() {
                return Err(self.invalid(format!(
                    "function '{}' (index {i}) produces no outputs",
                    func.name
                )));
            }
        }

        for (role, ids, class) in [
            ("input", &self.inputs, StorageClass::Input),
            ("output", &self.outputs, StorageClass::Output),
        ] {
            for &id in ids {
                let Some(var) = self.variables.get(id) else {
                    return Err(self.invalid(format!(
                        "designated {role} id {id} is out of range"
                    )));
                };
                if var.allocation != class {
                    return Err(self.invalid(format!(
                        "designated {role} '{}' (id {id}) is declared as {}",
                        var.name, var.allocation
                    )));
                }
            }
        }

        Ok(())
    }

    /// Whether any constant still waits for its sidecar data.
    pub fn needs_sidecar(&self) -> bool {
        self.variables
            .iter()
            .any(|v| v.data.is_none() && v.constant_key.is_some())
    }

    fn invalid(&self, detail: impl Into<String>) -> NetworkError {
        NetworkError::Validation {
            network: self.name.clone(),
            detail: detail.into(),
        }
    }
}
