use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StrideError;

/// Scalar element types supported by stride tensors.
///
/// `DType` is a plain `Copy` enum, so two independently obtained handles for
/// the same scalar type always compare and hash equal. Per-type metadata is
/// served from the static [`DTYPE_TABLE`], never from a mutable cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum DType {
    /// Boolean, stored as one byte.
    #[serde(rename = "bool")]
    Bool,
    /// 8-bit signed integer
    #[serde(rename = "int8")]
    I8,
    /// 16-bit signed integer
    #[serde(rename = "int16")]
    I16,
    /// 32-bit signed integer
    #[serde(rename = "int32", alias = "int")]
    I32,
    /// 64-bit signed integer
    #[serde(rename = "int64", alias = "long")]
    I64,
    /// 16-bit IEEE 754 half-precision float
    #[serde(rename = "float16", alias = "half")]
    F16,
    /// 32-bit IEEE 754 single-precision float (the default float type)
    #[default]
    #[serde(rename = "float32", alias = "float")]
    F32,
    /// 64-bit IEEE 754 double-precision float
    #[serde(rename = "float64", alias = "double")]
    F64,
}

/// Broad classification of a dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DTypeClass {
    Integral,
    FloatingPoint,
}

/// Static metadata for one dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DTypeInfo {
    pub dtype: DType,
    pub name: &'static str,
    pub itemsize: usize,
    pub class: DTypeClass,
}

/// One entry per dtype, indexed by `DType as usize`.
pub static DTYPE_TABLE: [DTypeInfo; 8] = [
    DTypeInfo { dtype: DType::Bool, name: "bool", itemsize: 1, class: DTypeClass::Integral },
    DTypeInfo { dtype: DType::I8, name: "int8", itemsize: 1, class: DTypeClass::Integral },
    DTypeInfo { dtype: DType::I16, name: "int16", itemsize: 2, class: DTypeClass::Integral },
    DTypeInfo { dtype: DType::I32, name: "int32", itemsize: 4, class: DTypeClass::Integral },
    DTypeInfo { dtype: DType::I64, name: "int64", itemsize: 8, class: DTypeClass::Integral },
    DTypeInfo { dtype: DType::F16, name: "float16", itemsize: 2, class: DTypeClass::FloatingPoint },
    DTypeInfo { dtype: DType::F32, name: "float32", itemsize: 4, class: DTypeClass::FloatingPoint },
    DTypeInfo { dtype: DType::F64, name: "float64", itemsize: 8, class: DTypeClass::FloatingPoint },
];

impl DType {
    /// Every dtype, in tag order.
    pub const ALL: [DType; 8] = [
        DType::Bool,
        DType::I8,
        DType::I16,
        DType::I32,
        DType::I64,
        DType::F16,
        DType::F32,
        DType::F64,
    ];

    /// Look up a dtype by name.
    ///
    /// Accepts the canonical names (`float32`, `int64`, ...) and the short
    /// aliases `int`, `long`, `half`, `float` and `double`.
    pub fn from_name(name: &str) -> Result<DType, StrideError> {
        let dtype = match name {
            "bool" => DType::Bool,
            "int8" => DType::I8,
            "int16" => DType::I16,
            "int32" | "int" => DType::I32,
            "int64" | "long" => DType::I64,
            "float16" | "half" => DType::F16,
            "float32" | "float" => DType::F32,
            "float64" | "double" => DType::F64,
            other => return Err(StrideError::UnknownDType(other.to_string())),
        };
        Ok(dtype)
    }

    /// Static metadata record.
    pub fn info(&self) -> &'static DTypeInfo {
        &DTYPE_TABLE[*self as usize]
    }

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        self.info().name
    }

    /// Size in bytes of a single element.
    pub fn itemsize(&self) -> usize {
        self.info().itemsize
    }

    /// Number of bytes needed to store `n` elements of this dtype.
    pub fn storage_bytes(&self, n: usize) -> usize {
        self.itemsize() * n
    }

    /// Whether this dtype is integral. `Bool` counts as integral.
    pub fn is_integral(&self) -> bool {
        self.info().class == DTypeClass::Integral
    }

    /// Whether this dtype is a floating-point type.
    pub fn is_floating_point(&self) -> bool {
        self.info().class == DTypeClass::FloatingPoint
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DType {
    type Err = StrideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DType::from_name(s)
    }
}
