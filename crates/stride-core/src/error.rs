//! Error types for stride-core.

use thiserror::Error;

use crate::dtype::DType;

/// Errors produced by tensor and view operations.
///
/// Every error is reported at the failing call; the tensor is left
/// unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrideError {
    /// A negative (or otherwise unrepresentable) dimension was supplied.
    #[error("Invalid shape {dims:?}: {reason}")]
    InvalidShape { dims: Vec<i64>, reason: String },

    /// Flat data length does not match the declared shape.
    #[error("Shape {shape:?} requires {expected} elements, got {got}")]
    DataLengthMismatch {
        shape: Vec<usize>,
        expected: usize,
        got: usize,
    },

    /// Index count does not match the expected (full or view-relative) rank.
    #[error("Expected {expected} indices, got {got}")]
    RankMismatch { expected: usize, got: usize },

    /// An index value is outside its dimension's bound.
    #[error("Index {index} out of range for dimension {dim} of size {size}")]
    IndexOutOfRange { index: i64, dim: usize, size: usize },

    /// Permutation order is not a bijection over `[0, rank)`.
    #[error("Invalid permutation {order:?} for rank {rank}")]
    InvalidPermutation { order: Vec<usize>, rank: usize },

    /// Reshape target has a different total size.
    #[error("Cannot reshape {numel} elements into {shape:?}")]
    SizeMismatch { numel: usize, shape: Vec<i64> },

    /// Reshape requested on a tensor whose storage order is not row-major.
    #[error("Cannot reshape non-contiguous tensor with shape {shape:?} and strides {strides:?} (call .contiguous() first)")]
    NonContiguousReshape {
        shape: Vec<usize>,
        strides: Vec<usize>,
    },

    /// Unrecognised scalar type name.
    #[error("Unknown dtype '{0}'")]
    UnknownDType(String),

    /// The element function failed or produced a value the dtype cannot hold.
    #[error("Transform failed at storage index {index}: {reason}")]
    TransformError { index: usize, reason: String },

    /// A typed accessor was used with the wrong element type.
    #[error("DType mismatch: tensor is {expected}, requested {got}")]
    DTypeMismatch { expected: DType, got: DType },

    /// Unrecognised device string.
    #[error("Invalid device '{0}'")]
    InvalidDevice(String),

    /// An argument combination that no operation accepts.
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument { arg: &'static str, reason: String },

    /// The view's owner changed shape after the view was taken.
    #[error("Stale view: owner layout changed (view generation {view}, owner generation {owner})")]
    StaleView { view: u64, owner: u64 },

    /// The view's owner has been dropped.
    #[error("View used after its owning tensor was dropped")]
    DetachedView,
}

/// Coarse error classification for host binding layers.
///
/// Bindings translate these into host-idiomatic signals (exceptions,
/// result codes) without matching on every field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidShape,
    DataLengthMismatch,
    RankMismatch,
    IndexOutOfRange,
    InvalidPermutation,
    SizeMismatch,
    NonContiguousReshape,
    UnknownDType,
    TransformError,
    DTypeMismatch,
    InvalidDevice,
    InvalidArgument,
    StaleView,
    DetachedView,
}

impl StrideError {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StrideError::InvalidShape { .. } => ErrorKind::InvalidShape,
            StrideError::DataLengthMismatch { .. } => ErrorKind::DataLengthMismatch,
            StrideError::RankMismatch { .. } => ErrorKind::RankMismatch,
            StrideError::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            StrideError::InvalidPermutation { .. } => ErrorKind::InvalidPermutation,
            StrideError::SizeMismatch { .. } => ErrorKind::SizeMismatch,
            StrideError::NonContiguousReshape { .. } => ErrorKind::NonContiguousReshape,
            StrideError::UnknownDType(_) => ErrorKind::UnknownDType,
            StrideError::TransformError { .. } => ErrorKind::TransformError,
            StrideError::DTypeMismatch { .. } => ErrorKind::DTypeMismatch,
            StrideError::InvalidDevice(_) => ErrorKind::InvalidDevice,
            StrideError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            StrideError::StaleView { .. } => ErrorKind::StaleView,
            StrideError::DetachedView => ErrorKind::DetachedView,
        }
    }

    /// Whether this is an index error (rank or bounds).
    pub fn is_index_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::RankMismatch | ErrorKind::IndexOutOfRange
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let e = StrideError::RankMismatch { expected: 2, got: 1 };
        assert_eq!(e.kind(), ErrorKind::RankMismatch);
        assert!(e.is_index_error());

        let e = StrideError::UnknownDType("complex32".into());
        assert_eq!(e.kind(), ErrorKind::UnknownDType);
        assert!(!e.is_index_error());
    }

    #[test]
    fn test_display() {
        let e = StrideError::IndexOutOfRange { index: 2, dim: 0, size: 2 };
        assert_eq!(
            e.to_string(),
            "Index 2 out of range for dimension 0 of size 2"
        );
        let e = StrideError::DTypeMismatch {
            expected: DType::F32,
            got: DType::I64,
        };
        assert_eq!(e.to_string(), "DType mismatch: tensor is float32, requested int64");
    }
}
