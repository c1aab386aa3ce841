//! Construction and logging options.

use serde::{Deserialize, Serialize};

use crate::device::Device;
use crate::dtype::DType;

/// Options applied when a tensor is constructed.
///
/// Defaults to `float32` on the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TensorOptions {
    /// Element type of the new tensor.
    pub dtype: DType,
    /// Device tag of the new tensor.
    pub device: Device,
}

impl TensorOptions {
    pub fn new(dtype: DType) -> Self {
        Self {
            dtype,
            device: Device::Cpu,
        }
    }

    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }
}

impl From<DType> for TensorOptions {
    fn from(dtype: DType) -> Self {
        TensorOptions::new(dtype)
    }
}

/// Configuration for the `tracing` subscriber installed by
/// [`crate::logging::init`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `stride_core=debug`.
    /// The `STRIDE_LOG` environment variable takes precedence.
    pub level: String,
    /// Colourise output.
    pub ansi: bool,
    /// Include the event target (module path) in each line.
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            ansi: true,
            with_target: true,
        }
    }
}

impl LogConfig {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tensor_options_default() {
        let opts = TensorOptions::default();
        assert_eq!(opts.dtype, DType::F32);
        assert_eq!(opts.device, Device::Cpu);

        let opts = TensorOptions::new(DType::I64).with_device(Device::Cuda(1));
        assert_eq!(opts.dtype, DType::I64);
        assert_eq!(opts.device, Device::Cuda(1));
    }

    #[test]
    fn test_tensor_options_serde() {
        let opts: TensorOptions = serde_json::from_str(r#"{"dtype": "double"}"#).unwrap();
        assert_eq!(opts.dtype, DType::F64);
        assert_eq!(opts.device, Device::Cpu);

        let json = serde_json::to_string(&TensorOptions::new(DType::I8)).unwrap();
        assert_eq!(json, r#"{"dtype":"int8","device":"cpu"}"#);
    }

    #[test]
    fn test_log_config_serde_defaults() {
        let cfg: LogConfig = serde_json::from_str(r#"{"level": "debug"}"#).unwrap();
        assert_eq!(cfg.level, "debug");
        assert!(cfg.ansi);
        assert!(cfg.with_target);
    }
}
