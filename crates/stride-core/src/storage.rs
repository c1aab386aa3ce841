use half::f16;

use crate::error::StrideError;
use crate::scalar::{Element, Scalar};
use crate::{DType, Result};

/// Backing buffer for tensor data: one typed vector per dtype.
///
/// Every variant is a plain contiguous `Vec<T>`, so typed slices are always
/// correctly aligned and the dtype is the variant tag.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageData {
    Bool(Vec<bool>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F16(Vec<f16>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

/// Run `$body` with `$v` bound to the typed vector inside a `StorageData`.
macro_rules! with_data {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            StorageData::Bool($v) => $body,
            StorageData::I8($v) => $body,
            StorageData::I16($v) => $body,
            StorageData::I32($v) => $body,
            StorageData::I64($v) => $body,
            StorageData::F16($v) => $body,
            StorageData::F32($v) => $body,
            StorageData::F64($v) => $body,
        }
    };
}

/// Build a `StorageData` of `$dtype` from an expression generic over `$t`.
macro_rules! for_dtype {
    ($dtype:expr, $t:ident => $body:expr) => {
        match $dtype {
            DType::Bool => {
                type $t = bool;
                $body
            }
            DType::I8 => {
                type $t = i8;
                $body
            }
            DType::I16 => {
                type $t = i16;
                $body
            }
            DType::I32 => {
                type $t = i32;
                $body
            }
            DType::I64 => {
                type $t = i64;
                $body
            }
            DType::F16 => {
                type $t = f16;
                $body
            }
            DType::F32 => {
                type $t = f32;
                $body
            }
            DType::F64 => {
                type $t = f64;
                $body
            }
        }
    };
}

/// A flat, contiguous, type-homogeneous element buffer.
///
/// Storage is exclusively owned by one tensor; cloning copies the data.
#[derive(Debug, Clone, PartialEq)]
pub struct Storage {
    data: StorageData,
}

impl Storage {
    /// Zero-initialised storage for `numel` elements.
    pub fn zeros(dtype: DType, numel: usize) -> Self {
        Self::full(dtype, numel, Scalar::zero(dtype))
    }

    /// Storage with every element set to `value` coerced to `dtype`.
    pub fn full(dtype: DType, numel: usize, value: Scalar) -> Self {
        let data = for_dtype!(dtype, T => {
            T::into_storage_data(vec![T::coerce(value); numel])
        });
        Self { data }
    }

    /// Storage from dynamically typed values, each coerced to `dtype`.
    pub fn from_scalars(dtype: DType, values: &[Scalar]) -> Self {
        let data = for_dtype!(dtype, T => {
            T::into_storage_data(values.iter().map(|&s| T::coerce(s)).collect())
        });
        Self { data }
    }

    /// Storage from a typed vector (no copy).
    pub fn from_vec<T: Element>(values: Vec<T>) -> Self {
        Self {
            data: T::into_storage_data(values),
        }
    }

    /// Create storage from a native-endian byte image.
    pub fn from_bytes(dtype: DType, numel: usize, bytes: &[u8]) -> Result<Self> {
        let expected = dtype.storage_bytes(numel);
        if bytes.len() != expected {
            return Err(StrideError::InvalidArgument {
                arg: "bytes",
                reason: format!(
                    "expected {} bytes for {} elements of {}, got {}",
                    expected,
                    numel,
                    dtype,
                    bytes.len()
                ),
            });
        }
        let data = match dtype {
            DType::Bool => StorageData::Bool(bytes.iter().map(|&b| b != 0).collect()),
            DType::I8 => StorageData::I8(pod_from_bytes(bytes)),
            DType::I16 => StorageData::I16(pod_from_bytes(bytes)),
            DType::I32 => StorageData::I32(pod_from_bytes(bytes)),
            DType::I64 => StorageData::I64(pod_from_bytes(bytes)),
            DType::F16 => StorageData::F16(pod_from_bytes(bytes)),
            DType::F32 => StorageData::F32(pod_from_bytes(bytes)),
            DType::F64 => StorageData::F64(pod_from_bytes(bytes)),
        };
        Ok(Self { data })
    }

    /// Get the dtype of this storage.
    pub fn dtype(&self) -> DType {
        match &self.data {
            StorageData::Bool(_) => DType::Bool,
            StorageData::I8(_) => DType::I8,
            StorageData::I16(_) => DType::I16,
            StorageData::I32(_) => DType::I32,
            StorageData::I64(_) => DType::I64,
            StorageData::F16(_) => DType::F16,
            StorageData::F32(_) => DType::F32,
            StorageData::F64(_) => DType::F64,
        }
    }

    /// Number of logical elements.
    pub fn numel(&self) -> usize {
        with_data!(&self.data, v => v.len())
    }

    /// Size in bytes.
    pub fn nbytes(&self) -> usize {
        self.dtype().storage_bytes(self.numel())
    }

    /// Element at storage offset `i`.
    pub fn get(&self, i: usize) -> Option<Scalar> {
        with_data!(&self.data, v => v.get(i).map(|&x| x.into_scalar()))
    }

    /// Write `value` (coerced to this storage's dtype) at offset `i`.
    ///
    /// Fails with `IndexOutOfRange` without writing if `i` is out of bounds.
    pub fn set(&mut self, i: usize, value: Scalar) -> Result<()> {
        let numel = self.numel();
        with_data!(&mut self.data, v => match v.get_mut(i) {
            Some(slot) => {
                *slot = Element::coerce(value);
                Ok(())
            }
            None => Err(StrideError::IndexOutOfRange {
                index: i as i64,
                dim: 0,
                size: numel,
            }),
        })
    }

    /// All elements in storage order.
    pub fn to_scalars(&self) -> Vec<Scalar> {
        with_data!(&self.data, v => v.iter().map(|&x| x.into_scalar()).collect())
    }

    /// Copy the elements at the given offsets into new storage, in order.
    ///
    /// Offsets must be in bounds.
    pub(crate) fn gather(&self, offsets: &[usize]) -> Storage {
        let data = with_data!(&self.data, v => {
            let values: Vec<_> = offsets.iter().map(|&o| v[o]).collect();
            Element::into_storage_data(values)
        });
        Storage { data }
    }

    /// Native-endian byte image of the buffer; bools are one 0/1 byte each.
    pub fn to_bytes(&self) -> Vec<u8> {
        match &self.data {
            StorageData::Bool(v) => v.iter().map(|&b| u8::from(b)).collect(),
            StorageData::I8(v) => bytemuck::cast_slice::<_, u8>(v.as_slice()).to_vec(),
            StorageData::I16(v) => bytemuck::cast_slice::<_, u8>(v.as_slice()).to_vec(),
            StorageData::I32(v) => bytemuck::cast_slice::<_, u8>(v.as_slice()).to_vec(),
            StorageData::I64(v) => bytemuck::cast_slice::<_, u8>(v.as_slice()).to_vec(),
            StorageData::F16(v) => bytemuck::cast_slice::<_, u8>(v.as_slice()).to_vec(),
            StorageData::F32(v) => bytemuck::cast_slice::<_, u8>(v.as_slice()).to_vec(),
            StorageData::F64(v) => bytemuck::cast_slice::<_, u8>(v.as_slice()).to_vec(),
        }
    }

    /// Typed view of the buffer; `None` if `T` is not this storage's type.
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::slice(&self.data)
    }

    /// Mutable typed view of the buffer.
    pub fn as_slice_mut<T: Element>(&mut self) -> Option<&mut [T]> {
        T::slice_mut(&mut self.data)
    }

    /// Get the raw StorageData reference.
    pub fn data(&self) -> &StorageData {
        &self.data
    }
}

fn pod_from_bytes<T: bytemuck::Pod>(bytes: &[u8]) -> Vec<T> {
    bytes
        .chunks_exact(std::mem::size_of::<T>())
        .map(bytemuck::pod_read_unaligned)
        .collect()
}
