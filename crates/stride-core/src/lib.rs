//! # stride-core
//!
//! Dense, strided tensor engine.
//!
//! Provides the foundational `Tensor` type with:
//! - A fixed dtype registry (bool, int8..int64, float16/32/64)
//! - Shape/stride layout with in-place reshape and permute
//! - Aliasing views from partial indexing, invalidated on layout change
//! - CPU and CUDA device tags

pub mod config;
pub mod device;
pub mod dtype;
pub mod error;
pub mod logging;
pub mod prelude;
pub mod scalar;
pub mod shape;
pub mod storage;
pub mod tensor;
pub mod view;

pub use config::{LogConfig, TensorOptions};
pub use device::{Device, DeviceKind};
pub use dtype::DType;
pub use error::{ErrorKind, StrideError};
pub use scalar::{Element, Scalar};
pub use shape::{Shape, Strides};
pub use storage::Storage;
pub use tensor::Tensor;
pub use view::{Indexed, TensorView};

pub type Result<T> = std::result::Result<T, StrideError>;
