//! Single tensor elements.
//!
//! [`Scalar`] carries one value of any supported dtype and is what the
//! dtype-erased API (`at`, `set_at`, `transform`) traffics in. [`Element`]
//! connects Rust primitive types to [`DType`] for the typed API.

use std::fmt;

use half::f16;

use crate::dtype::DType;
use crate::storage::StorageData;

/// One element value tagged with its dtype.
///
/// Equality is numeric: `Scalar::I32(1) == Scalar::F64(1.0)` holds, which is
/// what round-trip checks through a dtype coercion need.
#[derive(Debug, Clone, Copy)]
pub enum Scalar {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F16(f16),
    F32(f32),
    F64(f64),
}

impl Scalar {
    /// The dtype this value is tagged with.
    pub fn dtype(&self) -> DType {
        match self {
            Scalar::Bool(_) => DType::Bool,
            Scalar::I8(_) => DType::I8,
            Scalar::I16(_) => DType::I16,
            Scalar::I32(_) => DType::I32,
            Scalar::I64(_) => DType::I64,
            Scalar::F16(_) => DType::F16,
            Scalar::F32(_) => DType::F32,
            Scalar::F64(_) => DType::F64,
        }
    }

    /// Whether the value is a floating-point variant.
    pub fn is_float(&self) -> bool {
        self.dtype().is_floating_point()
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Scalar::Bool(v) => u8::from(v) as f64,
            Scalar::I8(v) => v as f64,
            Scalar::I16(v) => v as f64,
            Scalar::I32(v) => v as f64,
            Scalar::I64(v) => v as f64,
            Scalar::F16(v) => v.to_f64(),
            Scalar::F32(v) => v as f64,
            Scalar::F64(v) => v,
        }
    }

    /// Integer value; floats truncate toward zero and saturate (NaN maps to 0).
    pub fn to_i64(self) -> i64 {
        match self {
            Scalar::Bool(v) => i64::from(v),
            Scalar::I8(v) => v as i64,
            Scalar::I16(v) => v as i64,
            Scalar::I32(v) => v as i64,
            Scalar::I64(v) => v,
            other => other.to_f64() as i64,
        }
    }

    pub fn to_bool(self) -> bool {
        match self {
            Scalar::Bool(v) => v,
            other if other.is_float() => other.to_f64() != 0.0,
            other => other.to_i64() != 0,
        }
    }

    /// Coerce to `dtype` with numeric `as` semantics.
    ///
    /// Never fails: integers wrap, floats saturate into integers, bools map
    /// to 0/1 and any non-zero value maps to `true`.
    pub fn cast(self, dtype: DType) -> Scalar {
        match dtype {
            DType::Bool => Scalar::Bool(bool::coerce(self)),
            DType::I8 => Scalar::I8(i8::coerce(self)),
            DType::I16 => Scalar::I16(i16::coerce(self)),
            DType::I32 => Scalar::I32(i32::coerce(self)),
            DType::I64 => Scalar::I64(i64::coerce(self)),
            DType::F16 => Scalar::F16(f16::coerce(self)),
            DType::F32 => Scalar::F32(f32::coerce(self)),
            DType::F64 => Scalar::F64(f64::coerce(self)),
        }
    }

    /// Checked coercion to `dtype`.
    ///
    /// Fails when the value has no faithful representation: non-finite or
    /// out-of-range values into integers, anything but 0/1 into bool, and
    /// finite values that overflow a narrower float. Fractional parts are
    /// truncated when converting floats to integers.
    pub fn try_cast(self, dtype: DType) -> Result<Scalar, String> {
        match dtype {
            DType::Bool => {
                let v = self.to_f64();
                if v == 0.0 || v == 1.0 {
                    Ok(Scalar::Bool(v == 1.0))
                } else {
                    Err(format!("{self} is not representable as bool"))
                }
            }
            DType::F16 | DType::F32 | DType::F64 => {
                let cast = self.cast(dtype);
                if self.to_f64().is_finite() && !cast.to_f64().is_finite() {
                    Err(format!("{self} overflows {dtype}"))
                } else {
                    Ok(cast)
                }
            }
            DType::I8 | DType::I16 | DType::I32 | DType::I64 => {
                let bits = (dtype.itemsize() * 8) as i32;
                if self.is_float() {
                    let v = self.to_f64();
                    if !v.is_finite() {
                        return Err(format!("non-finite value {self} cannot be stored as {dtype}"));
                    }
                    let bound = 2f64.powi(bits - 1);
                    let t = v.trunc();
                    if t < -bound || t >= bound {
                        return Err(format!("{self} is out of range for {dtype}"));
                    }
                    Ok(self.cast(dtype))
                } else {
                    let v = self.to_i64();
                    let (min, max) = if bits == 64 {
                        (i64::MIN, i64::MAX)
                    } else {
                        (-(1i64 << (bits - 1)), (1i64 << (bits - 1)) - 1)
                    };
                    if v < min || v > max {
                        return Err(format!("{self} is out of range for {dtype}"));
                    }
                    Ok(self.cast(dtype))
                }
            }
        }
    }

    /// Zero of the given dtype.
    pub fn zero(dtype: DType) -> Scalar {
        Scalar::I64(0).cast(dtype)
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        if self.is_float() || other.is_float() {
            self.to_f64() == other.to_f64()
        } else {
            self.to_i64() == other.to_i64()
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::I8(v) => write!(f, "{v}"),
            Scalar::I16(v) => write!(f, "{v}"),
            Scalar::I32(v) => write!(f, "{v}"),
            Scalar::I64(v) => write!(f, "{v}"),
            Scalar::F16(v) => write!(f, "{v}"),
            Scalar::F32(v) => write!(f, "{v}"),
            Scalar::F64(v) => write!(f, "{v}"),
        }
    }
}

/// Rust types that can be tensor elements.
///
/// Each implementor maps to exactly one [`DType`] and knows how to find its
/// own variant inside [`StorageData`].
pub trait Element: Copy + Send + Sync + PartialEq + fmt::Debug + 'static {
    /// The corresponding dtype.
    const DTYPE: DType;

    /// Coerce any scalar to this type with numeric `as` semantics.
    fn coerce(value: Scalar) -> Self;

    fn into_scalar(self) -> Scalar;

    /// Borrow the typed buffer if `data` holds this element type.
    fn slice(data: &StorageData) -> Option<&[Self]>;

    fn slice_mut(data: &mut StorageData) -> Option<&mut [Self]>;

    fn into_storage_data(values: Vec<Self>) -> StorageData;
}

macro_rules! impl_element {
    ($t:ty, $variant:ident, |$s:ident| $coerce:expr) => {
        impl Element for $t {
            const DTYPE: DType = DType::$variant;

            #[inline]
            fn coerce($s: Scalar) -> Self {
                $coerce
            }

            #[inline]
            fn into_scalar(self) -> Scalar {
                Scalar::$variant(self)
            }

            fn slice(data: &StorageData) -> Option<&[Self]> {
                match data {
                    StorageData::$variant(v) => Some(v.as_slice()),
                    _ => None,
                }
            }

            fn slice_mut(data: &mut StorageData) -> Option<&mut [Self]> {
                match data {
                    StorageData::$variant(v) => Some(v.as_mut_slice()),
                    _ => None,
                }
            }

            fn into_storage_data(values: Vec<Self>) -> StorageData {
                StorageData::$variant(values)
            }
        }

        impl From<$t> for Scalar {
            fn from(v: $t) -> Self {
                Scalar::$variant(v)
            }
        }

        impl PartialEq<$t> for Scalar {
            fn eq(&self, other: &$t) -> bool {
                *self == Scalar::$variant(*other)
            }
        }
    };
}

macro_rules! int_coerce {
    ($t:ty, $s:ident) => {
        if $s.is_float() {
            $s.to_f64() as $t
        } else {
            $s.to_i64() as $t
        }
    };
}

impl_element!(bool, Bool, |s| s.to_bool());
impl_element!(i8, I8, |s| int_coerce!(i8, s));
impl_element!(i16, I16, |s| int_coerce!(i16, s));
impl_element!(i32, I32, |s| int_coerce!(i32, s));
impl_element!(i64, I64, |s| int_coerce!(i64, s));
impl_element!(f16, F16, |s| match s {
    Scalar::F16(v) => v,
    other => f16::from_f64(other.to_f64()),
});
impl_element!(f32, F32, |s| match s {
    Scalar::F32(v) => v,
    other => other.to_f64() as f32,
});
impl_element!(f64, F64, |s| s.to_f64());
