use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StrideError;

/// Kind of execution device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Cpu,
    Cuda,
}

/// Intended execution placement of a tensor.
///
/// This is metadata only: retagging a tensor never moves its storage.
/// Execution backends read the tag to decide placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Host CPU
    #[default]
    Cpu,
    /// CUDA GPU with device index
    Cuda(usize),
}

impl Device {
    pub fn kind(&self) -> DeviceKind {
        match self {
            Device::Cpu => DeviceKind::Cpu,
            Device::Cuda(_) => DeviceKind::Cuda,
        }
    }

    /// Device ordinal; always 0 for the CPU.
    pub fn index(&self) -> usize {
        match self {
            Device::Cpu => 0,
            Device::Cuda(idx) => *idx,
        }
    }

    /// Whether this is a CPU device.
    pub fn is_cpu(&self) -> bool {
        matches!(self, Device::Cpu)
    }

    /// Whether this is a CUDA device.
    pub fn is_cuda(&self) -> bool {
        matches!(self, Device::Cuda(_))
    }

    /// Get the CUDA device index, if applicable.
    pub fn cuda_index(&self) -> Option<usize> {
        match self {
            Device::Cuda(idx) => Some(*idx),
            _ => None,
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(idx) => write!(f, "cuda:{idx}"),
        }
    }
}

/// Parses `cpu`, `cuda` (ordinal 0) and `cuda:N`.
impl FromStr for Device {
    type Err = StrideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StrideError::InvalidDevice(s.to_string());
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Device::Cpu),
            "cuda" => Ok(Device::Cuda(0)),
            other => {
                let idx = other.strip_prefix("cuda:").ok_or_else(invalid)?;
                idx.parse::<usize>().map(Device::Cuda).map_err(|_| invalid())
            }
        }
    }
}
