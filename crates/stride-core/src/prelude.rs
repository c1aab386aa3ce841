//! Convenience re-exports for common stride-core types.
//!
//! ```rust
//! use stride_core::prelude::*;
//! ```

pub use crate::DType;
pub use crate::Device;
pub use crate::Indexed;
pub use crate::Result;
pub use crate::Scalar;
pub use crate::Shape;
pub use crate::StrideError;
pub use crate::Tensor;
pub use crate::TensorOptions;
pub use crate::TensorView;
