use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::config::TensorOptions;
use crate::device::Device;
use crate::dtype::DType;
use crate::error::StrideError;
use crate::scalar::{Element, Scalar};
use crate::shape::{self, Shape, Strides};
use crate::storage::Storage;
use crate::view::{Indexed, TensorView};
use crate::Result;

/// State shared between a tensor and its views.
///
/// `generation` is bumped by every layout change (reshape, permute) so views
/// taken earlier can tell they are stale.
pub(crate) struct TensorCore {
    pub(crate) storage: Storage,
    pub(crate) shape: Shape,
    pub(crate) strides: Strides,
    pub(crate) device: Device,
    pub(crate) generation: u64,
}

impl TensorCore {
    fn element(&self, offset: usize) -> Result<Scalar> {
        self.storage
            .get(offset)
            .ok_or(StrideError::IndexOutOfRange {
                index: offset as i64,
                dim: 0,
                size: self.storage.numel(),
            })
    }

    pub(crate) fn at(&self, indices: &[usize]) -> Result<Scalar> {
        let offset = self.strides.flat_index(&self.shape, indices)?;
        self.element(offset)
    }

    pub(crate) fn set_at(&mut self, indices: &[usize], value: Scalar) -> Result<()> {
        let offset = self.strides.flat_index(&self.shape, indices)?;
        self.storage.set(offset, value)
    }

    pub(crate) fn is_contiguous(&self) -> bool {
        self.strides.is_contiguous_for(&self.shape)
    }

    /// Storage offsets of every element in logical row-major order.
    pub(crate) fn logical_offsets(&self) -> Vec<usize> {
        self.shape
            .indices()
            .map(|idx| self.strides.offset_unchecked(&idx))
            .collect()
    }
}

/// A dense multi-dimensional array with typed storage and a device tag.
///
/// A tensor exclusively owns its storage; cloning copies it. Partial
/// indexing yields [`TensorView`]s that alias the storage without owning
/// it. `reshape` and `permute` rewrite the layout in place without moving
/// data and invalidate every view taken before the call.
///
/// # Examples
///
/// ```
/// use stride_core::Tensor;
///
/// let mut t = Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
/// assert_eq!(t.at(&[1, 2]).unwrap(), 6.0f32);
/// assert_eq!(t.view(&[0]).unwrap().at(&[1]).unwrap(), 2.0f32);
///
/// t.permute(&[1, 0]).unwrap();
/// assert_eq!(t.shape().dims(), &[3, 2]);
/// assert_eq!(t.at(&[0, 1]).unwrap(), 4.0f32);
/// ```
pub struct Tensor {
    core: Arc<RwLock<TensorCore>>,
}

impl Tensor {
    // =========================================================================
    // Constructors
    // =========================================================================

    pub(crate) fn from_parts(storage: Storage, shape: Shape, device: Device) -> Self {
        let strides = Strides::contiguous(&shape);
        debug!(
            shape = %shape,
            dtype = %storage.dtype(),
            device = %device,
            "tensor allocated"
        );
        Self {
            core: Arc::new(RwLock::new(TensorCore {
                storage,
                shape,
                strides,
                device,
                generation: 0,
            })),
        }
    }

    /// Create a zero-filled tensor.
    ///
    /// Fails with `InvalidShape` if the element count overflows `usize`.
    pub fn new(shape: &[usize], options: TensorOptions) -> Result<Self> {
        let s = Shape::try_new(shape)?;
        let storage = Storage::zeros(options.dtype, s.size());
        Ok(Self::from_parts(storage, s, options.device))
    }

    /// Create a tensor of zeros with the given shape and dtype.
    pub fn zeros(shape: &[usize], dtype: DType) -> Result<Self> {
        Self::new(shape, TensorOptions::new(dtype))
    }

    /// Create a tensor with every element set to `fill`.
    pub fn full(shape: &[usize], fill: impl Into<Scalar>, options: TensorOptions) -> Result<Self> {
        let s = Shape::try_new(shape)?;
        let storage = Storage::full(options.dtype, s.size(), fill.into());
        Ok(Self::from_parts(storage, s, options.device))
    }

    /// Create a tensor from flat row-major values, coerced to `options.dtype`.
    pub fn from_scalars(shape: &[usize], data: &[Scalar], options: TensorOptions) -> Result<Self> {
        let s = Shape::try_new(shape)?;
        check_data_len(&s, data.len())?;
        let storage = Storage::from_scalars(options.dtype, data);
        Ok(Self::from_parts(storage, s, options.device))
    }

    /// Create a tensor from typed data; the dtype follows `T`.
    pub fn from_vec<T: Element>(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        let s = Shape::try_new(shape)?;
        check_data_len(&s, data.len())?;
        Ok(Self::from_parts(Storage::from_vec(data), s, Device::Cpu))
    }

    /// Create a rank-0 tensor holding one value.
    pub fn scalar(value: impl Into<Scalar>) -> Self {
        let value = value.into();
        Self::from_parts(
            Storage::full(value.dtype(), 1, value),
            Shape::scalar(),
            Device::Cpu,
        )
    }

    /// Create a tensor from pre-built storage and a shape.
    pub fn from_storage(storage: Storage, shape: &[usize], device: Device) -> Result<Self> {
        let s = Shape::try_new(shape)?;
        check_data_len(&s, storage.numel())?;
        Ok(Self::from_parts(storage, s, device))
    }

    /// General constructor taking host-style signed dimensions.
    ///
    /// With `data`, its length must equal the shape's size; with `fill`,
    /// every element starts at that value; with neither, storage is zeroed.
    /// Supplying both is rejected.
    pub fn construct(
        shape: &[i64],
        data: Option<&[Scalar]>,
        fill: Option<Scalar>,
        options: TensorOptions,
    ) -> Result<Self> {
        let s = Shape::from_signed(shape)?;
        match (data, fill) {
            (Some(_), Some(_)) => Err(StrideError::InvalidArgument {
                arg: "fill",
                reason: "cannot combine explicit data with a fill value".into(),
            }),
            (Some(data), None) => Self::from_scalars(s.dims(), data, options),
            (None, Some(fill)) => Self::full(s.dims(), fill, options),
            (None, None) => Self::new(s.dims(), options),
        }
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Shape of the tensor.
    pub fn shape(&self) -> Shape {
        self.core.read().shape.clone()
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.core.read().shape.rank()
    }

    /// Alias of [`Tensor::rank`].
    pub fn ndim(&self) -> usize {
        self.rank()
    }

    /// Total number of elements.
    pub fn size(&self) -> usize {
        self.core.read().shape.size()
    }

    /// Whether the tensor holds no elements.
    pub fn empty(&self) -> bool {
        self.size() == 0
    }

    /// Strides (in elements, not bytes).
    pub fn strides(&self) -> Strides {
        self.core.read().strides.clone()
    }

    /// Data type.
    pub fn dtype(&self) -> DType {
        self.core.read().storage.dtype()
    }

    /// Device tag.
    pub fn device(&self) -> Device {
        self.core.read().device
    }

    /// Size of the storage in bytes.
    pub fn nbytes(&self) -> usize {
        self.core.read().storage.nbytes()
    }

    /// Whether storage order matches the row-major order of the current
    /// shape. Usually false after a `permute`; use [`Tensor::contiguous`] to
    /// get a row-major copy.
    pub fn is_contiguous(&self) -> bool {
        self.core.read().is_contiguous()
    }

    // =========================================================================
    // Element access
    // =========================================================================

    /// Element at a full multi-index.
    pub fn at(&self, indices: &[usize]) -> Result<Scalar> {
        self.core.read().at(indices)
    }

    /// Typed element access; `T` must match the tensor's dtype.
    pub fn get<T: Element>(&self, indices: &[usize]) -> Result<T> {
        let core = self.core.read();
        check_dtype::<T>(core.storage.dtype())?;
        core.at(indices).map(T::coerce)
    }

    /// Write `value`, coerced to the tensor's dtype, at a full multi-index.
    /// Index errors are reported before anything is written.
    pub fn set_at(&mut self, indices: &[usize], value: impl Into<Scalar>) -> Result<()> {
        self.core.write().set_at(indices, value.into())
    }

    /// Element at storage offset `i`, ignoring the logical layout.
    pub fn get_flat(&self, i: usize) -> Result<Scalar> {
        let core = self.core.read();
        check_flat(i, core.storage.numel())?;
        core.element(i)
    }

    /// Write at storage offset `i`, ignoring the logical layout.
    pub fn set_flat(&mut self, i: usize, value: impl Into<Scalar>) -> Result<()> {
        let mut core = self.core.write();
        check_flat(i, core.storage.numel())?;
        core.storage.set(i, value.into())
    }

    /// Index with a full or partial multi-index.
    ///
    /// A full index yields the element; a shorter prefix yields a view
    /// fixing those leading indices.
    pub fn index(&self, indices: &[usize]) -> Result<Indexed> {
        let rank = self.rank();
        match indices.len().cmp(&rank) {
            Ordering::Equal => self.at(indices).map(Indexed::Scalar),
            Ordering::Less => self.view(indices).map(Indexed::View),
            Ordering::Greater => Err(StrideError::RankMismatch {
                expected: rank,
                got: indices.len(),
            }),
        }
    }

    /// View fixing the leading `prefix.len()` indices (which must be fewer
    /// than the rank).
    pub fn view(&self, prefix: &[usize]) -> Result<TensorView> {
        let core = self.core.read();
        let rank = core.shape.rank();
        if prefix.len() >= rank {
            return Err(StrideError::RankMismatch {
                expected: rank.saturating_sub(1),
                got: prefix.len(),
            });
        }
        core.shape.check_prefix(prefix)?;
        Ok(TensorView::attach(Arc::downgrade(&self.core), &core, prefix))
    }

    // =========================================================================
    // Shape operations (in place, no data movement)
    // =========================================================================

    /// Reshape in place. At most one dimension may be `-1` (inferred).
    ///
    /// Requires the current layout to be contiguous, so a permuted tensor
    /// must be made contiguous first. Views taken before the call become
    /// stale.
    pub fn reshape(&mut self, new_shape: &[i64]) -> Result<()> {
        let mut core = self.core.write();
        let resolved = core.shape.resolve_reshape(new_shape)?;
        if !core.is_contiguous() {
            return Err(StrideError::NonContiguousReshape {
                shape: core.shape.dims().to_vec(),
                strides: core.strides.as_slice().to_vec(),
            });
        }
        debug!(from = %core.shape, to = %resolved, "reshape");
        core.strides = Strides::contiguous(&resolved);
        core.shape = resolved;
        core.generation += 1;
        Ok(())
    }

    /// Relabel axes in place: axis `i` becomes the old axis `order[i]`.
    ///
    /// Shape and strides are permuted together; storage is untouched.
    /// Views taken before the call become stale.
    pub fn permute(&mut self, order: &[usize]) -> Result<()> {
        let mut core = self.core.write();
        let (shape, strides) = shape::permute(&core.shape, &core.strides, order)?;
        debug!(from = %core.shape, to = %shape, ?order, "permute");
        core.shape = shape;
        core.strides = strides;
        core.generation += 1;
        Ok(())
    }

    /// A copy whose storage is in the row-major order of the current shape.
    pub fn contiguous(&self) -> Tensor {
        let core = self.core.read();
        let storage = if core.is_contiguous() {
            core.storage.clone()
        } else {
            core.storage.gather(&core.logical_offsets())
        };
        Tensor::from_parts(storage, core.shape.clone(), core.device)
    }

    /// A rank-1 copy holding the elements in logical row-major order.
    pub fn flatten(&self) -> Tensor {
        let core = self.core.read();
        let storage = core.storage.gather(&core.logical_offsets());
        let n = storage.numel();
        Tensor::from_parts(storage, Shape::new(&[n]), core.device)
    }

    // =========================================================================
    // Element-wise transforms
    // =========================================================================

    /// Apply `f` to every element in storage order.
    ///
    /// Fails with `TransformError` if `f` returns a value the dtype cannot
    /// represent (see [`Scalar::try_cast`]). All-or-nothing: results are
    /// staged and only committed once every element has succeeded. `f` runs
    /// without the tensor locked, so it may read through views of this
    /// tensor; writes made through views during the call are overwritten
    /// by the commit.
    pub fn transform<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(Scalar) -> Scalar,
    {
        self.try_transform(|x| Ok::<_, std::convert::Infallible>(f(x)))
    }

    /// [`Tensor::transform`] with a fallible element function.
    pub fn try_transform<F, E>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(Scalar) -> std::result::Result<Scalar, E>,
        E: fmt::Display,
    {
        let (dtype, values) = {
            let core = self.core.read();
            (core.storage.dtype(), core.storage.to_scalars())
        };

        let mut staged = Vec::with_capacity(values.len());
        for (index, value) in values.into_iter().enumerate() {
            let out = f(value).map_err(|e| StrideError::TransformError {
                index,
                reason: e.to_string(),
            })?;
            let out = out
                .try_cast(dtype)
                .map_err(|reason| StrideError::TransformError { index, reason })?;
            staged.push(out);
        }

        trace!(count = staged.len(), %dtype, "transform committed");
        self.core.write().storage = Storage::from_scalars(dtype, &staged);
        Ok(())
    }

    /// Typed in-place map; `T` must match the tensor's dtype.
    pub fn map_inplace<T, F>(&mut self, f: F) -> Result<()>
    where
        T: Element,
        F: FnMut(T) -> T,
    {
        let values = self.to_vec::<T>()?;
        let mapped: Vec<T> = values.into_iter().map(f).collect();
        trace!(count = mapped.len(), dtype = %T::DTYPE, "map committed");
        self.core.write().storage = Storage::from_vec(mapped);
        Ok(())
    }

    // =========================================================================
    // Interop
    // =========================================================================

    /// Storage contents in storage order.
    ///
    /// After a `permute` this is NOT the row-major order of the new shape;
    /// interop consumers rebuilding an array from this plus `shape()` must
    /// check [`Tensor::is_contiguous`] or go through [`Tensor::contiguous`].
    pub fn to_flat_sequence(&self) -> Vec<Scalar> {
        self.core.read().storage.to_scalars()
    }

    /// Typed copy of the storage contents in storage order.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        let core = self.core.read();
        check_dtype::<T>(core.storage.dtype())?;
        let slice = core.storage.as_slice::<T>().ok_or(StrideError::DTypeMismatch {
            expected: core.storage.dtype(),
            got: T::DTYPE,
        })?;
        Ok(slice.to_vec())
    }

    /// Native-endian byte image of the storage, in storage order.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.core.read().storage.to_bytes()
    }

    // =========================================================================
    // Device tag
    // =========================================================================

    /// Retag the tensor for `device`. Storage placement is unchanged.
    pub fn to(&mut self, device: Device) {
        let mut core = self.core.write();
        if core.device != device {
            debug!(from = %core.device, to = %device, "device retag");
            core.device = device;
        }
    }
}

fn check_data_len(shape: &Shape, got: usize) -> Result<()> {
    if shape.size() != got {
        return Err(StrideError::DataLengthMismatch {
            shape: shape.dims().to_vec(),
            expected: shape.size(),
            got,
        });
    }
    Ok(())
}

fn check_dtype<T: Element>(dtype: DType) -> Result<()> {
    if T::DTYPE != dtype {
        return Err(StrideError::DTypeMismatch {
            expected: dtype,
            got: T::DTYPE,
        });
    }
    Ok(())
}

fn check_flat(i: usize, numel: usize) -> Result<()> {
    if i >= numel {
        return Err(StrideError::IndexOutOfRange {
            index: i as i64,
            dim: 0,
            size: numel,
        });
    }
    Ok(())
}

impl Clone for Tensor {
    /// Deep copy: the clone gets its own storage and keeps the layout.
    fn clone(&self) -> Self {
        let core = self.core.read();
        Self {
            core: Arc::new(RwLock::new(TensorCore {
                storage: core.storage.clone(),
                shape: core.shape.clone(),
                strides: core.strides.clone(),
                device: core.device,
                generation: 0,
            })),
        }
    }
}

/// Tensors are equal when shape, dtype and every logical element match.
/// Strides and device are not compared.
impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.core, &other.core) {
            return true;
        }
        let a = self.core.read();
        let b = other.core.read();
        if a.shape != b.shape || a.storage.dtype() != b.storage.dtype() {
            return false;
        }
        a.shape.indices().all(|idx| {
            let x = a.storage.get(a.strides.offset_unchecked(&idx));
            let y = b.storage.get(b.strides.offset_unchecked(&idx));
            x == y
        })
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core.read();
        write!(
            f,
            "Tensor(shape={}, dtype={}, device={}, contiguous={})",
            core.shape,
            core.storage.dtype(),
            core.device,
            core.is_contiguous(),
        )
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core.read();
        let offsets = core.logical_offsets();
        let item = |i: usize| {
            core.storage
                .get(offsets[i])
                .map(|s| s.to_string())
                .unwrap_or_default()
        };
        let n = offsets.len();
        if n <= 20 {
            let items: Vec<String> = (0..n).map(item).collect();
            write!(f, "tensor([{}], shape={})", items.join(", "), core.shape)
        } else {
            write!(
                f,
                "tensor([{}, {}, ..., {}], shape={})",
                item(0),
                item(1),
                item(n - 1),
                core.shape
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tensor {
        Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap()
    }

    #[test]
    fn test_from_vec() {
        let t = sample();
        assert_eq!(t.shape().dims(), &[2, 3]);
        assert_eq!(t.rank(), 2);
        assert_eq!(t.ndim(), 2);
        assert_eq!(t.size(), 6);
        assert_eq!(t.dtype(), DType::F32);
        assert_eq!(t.device(), Device::Cpu);
        assert_eq!(t.strides().as_slice(), &[3, 1]);
        assert!(t.is_contiguous());
        assert_eq!(t.nbytes(), 24);
    }

    #[test]
    fn test_data_length_mismatch() {
        let err = Tensor::from_vec(vec![1i32, 2, 3], &[2, 2]).unwrap_err();
        assert_eq!(
            err,
            StrideError::DataLengthMismatch {
                shape: vec![2, 2],
                expected: 4,
                got: 3
            }
        );
    }

    #[test]
    fn test_zeros() {
        let t = Tensor::zeros(&[3, 4], DType::I16).unwrap();
        assert_eq!(t.size(), 12);
        assert!(t.to_vec::<i16>().unwrap().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_full() {
        let t = Tensor::full(&[2, 2], 7, TensorOptions::new(DType::F64)).unwrap();
        assert_eq!(t.to_vec::<f64>().unwrap(), vec![7.0; 4]);
    }

    #[test]
    fn test_scalar() {
        let t = Tensor::scalar(3.5f64);
        assert!(t.shape().is_scalar());
        assert_eq!(t.size(), 1);
        assert_eq!(t.at(&[]).unwrap(), 3.5f64);
    }

    #[test]
    fn test_construct() {
        let opts = TensorOptions::new(DType::I32);
        let data = [Scalar::F64(1.9), Scalar::I64(2)];
        let t = Tensor::construct(&[2], Some(&data), None, opts).unwrap();
        assert_eq!(t.to_vec::<i32>().unwrap(), vec![1, 2]);

        let t = Tensor::construct(&[2, 2], None, Some(Scalar::Bool(true)), opts).unwrap();
        assert_eq!(t.to_vec::<i32>().unwrap(), vec![1; 4]);

        let t = Tensor::construct(&[3], None, None, TensorOptions::default()).unwrap();
        assert_eq!(t.dtype(), DType::F32);

        assert!(matches!(
            Tensor::construct(&[-2, 3], None, None, opts),
            Err(StrideError::InvalidShape { .. })
        ));
        assert!(matches!(
            Tensor::construct(&[3], Some(&data), None, opts),
            Err(StrideError::DataLengthMismatch { .. })
        ));
        assert!(matches!(
            Tensor::construct(&[2], Some(&data), Some(Scalar::I32(0)), opts),
            Err(StrideError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_at_and_set_at() {
        let mut t = sample();
        assert_eq!(t.at(&[0, 0]).unwrap(), 1.0f32);
        assert_eq!(t.at(&[1, 2]).unwrap(), 6.0f32);
        t.set_at(&[1, 0], 42).unwrap();
        assert_eq!(t.at(&[1, 0]).unwrap(), Scalar::F32(42.0));
        assert_eq!(t.get::<f32>(&[1, 0]).unwrap(), 42.0);
        assert!(matches!(
            t.get::<f64>(&[1, 0]),
            Err(StrideError::DTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_set_at_fails_before_writing() {
        let mut t = sample();
        let before = t.to_flat_sequence();
        assert!(t.set_at(&[2, 0], 9.0f32).is_err());
        assert!(t.set_at(&[0], 9.0f32).is_err());
        assert_eq!(t.to_flat_sequence(), before);
    }

    #[test]
    fn test_flat_access() {
        let mut t = sample();
        assert_eq!(t.get_flat(4).unwrap(), 5.0f32);
        t.set_flat(0, -1.0f32).unwrap();
        assert_eq!(t.at(&[0, 0]).unwrap(), -1.0f32);
        assert!(matches!(
            t.get_flat(6),
            Err(StrideError::IndexOutOfRange { index: 6, .. })
        ));
    }

    #[test]
    fn test_index_dispatch() {
        let t = sample();
        assert!(matches!(t.index(&[0, 1]).unwrap(), Indexed::Scalar(s) if s == 2.0f32));
        let v = t.index(&[1]).unwrap().into_view().unwrap();
        assert_eq!(v.remaining_dims().dims(), &[3]);
        assert!(matches!(
            t.index(&[0, 0, 0]),
            Err(StrideError::RankMismatch { expected: 2, got: 3 })
        ));
    }

    #[test]
    fn test_view_requires_partial_index() {
        let t = sample();
        assert!(matches!(
            t.view(&[0, 0]),
            Err(StrideError::RankMismatch { .. })
        ));
        assert!(matches!(
            t.view(&[2]),
            Err(StrideError::IndexOutOfRange { index: 2, dim: 0, size: 2 })
        ));
    }

    #[test]
    fn test_reshape() {
        let mut t = sample();
        t.reshape(&[3, 2]).unwrap();
        assert_eq!(t.shape().dims(), &[3, 2]);
        assert_eq!(t.strides().as_slice(), &[2, 1]);
        assert_eq!(t.to_vec::<f32>().unwrap(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        t.reshape(&[-1]).unwrap();
        assert_eq!(t.shape().dims(), &[6]);

        assert!(matches!(
            t.reshape(&[4, 2]),
            Err(StrideError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_permute_moves_no_data() {
        let mut t = sample();
        t.permute(&[1, 0]).unwrap();
        assert_eq!(t.shape().dims(), &[3, 2]);
        assert_eq!(t.strides().as_slice(), &[1, 3]);
        assert!(!t.is_contiguous());
        assert_eq!(t.at(&[0, 1]).unwrap(), 4.0f32);
        assert_eq!(t.at(&[2, 0]).unwrap(), 3.0f32);
        assert_eq!(t.to_vec::<f32>().unwrap(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_reshape_after_permute_needs_contiguous() {
        let mut t = sample();
        t.permute(&[1, 0]).unwrap();
        assert!(matches!(
            t.reshape(&[6]),
            Err(StrideError::NonContiguousReshape { .. })
        ));

        let mut c = t.contiguous();
        assert!(c.is_contiguous());
        assert_eq!(c.to_vec::<f32>().unwrap(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        c.reshape(&[6]).unwrap();
        assert_eq!(c, t.flatten());
    }

    #[test]
    fn test_transform() {
        let mut t = Tensor::from_vec(vec![1i32, 2, 3, 4], &[2, 2]).unwrap();
        t.transform(|x| Scalar::I64(x.to_i64() * 2)).unwrap();
        assert_eq!(t.to_vec::<i32>().unwrap(), vec![2, 4, 6, 8]);
        assert_eq!(t.dtype(), DType::I32);
    }

    #[test]
    fn test_transform_is_all_or_nothing() {
        let mut t = Tensor::from_vec(vec![1i8, 2, 3], &[3]).unwrap();
        let err = t
            .transform(|x| Scalar::I64(x.to_i64() * 100))
            .unwrap_err();
        assert!(matches!(err, StrideError::TransformError { index: 1, .. }));
        assert_eq!(t.to_vec::<i8>().unwrap(), vec![1, 2, 3]);

        let err = t
            .try_transform(|x| {
                if x == 3i8 {
                    Err("three")
                } else {
                    Ok(x)
                }
            })
            .unwrap_err();
        assert_eq!(
            err,
            StrideError::TransformError {
                index: 2,
                reason: "three".into()
            }
        );
    }

    #[test]
    fn test_transform_rejects_nan_into_int() {
        let mut t = Tensor::zeros(&[2], DType::I64).unwrap();
        assert!(matches!(
            t.transform(|_| Scalar::F64(f64::NAN)),
            Err(StrideError::TransformError { index: 0, .. })
        ));
    }

    #[test]
    fn test_map_inplace() {
        let mut t = sample();
        t.map_inplace(|x: f32| x + 0.5).unwrap();
        assert_eq!(t.at(&[0, 0]).unwrap(), 1.5f32);
        assert!(matches!(
            t.map_inplace(|x: i32| x),
            Err(StrideError::DTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_device_retag() {
        let mut t = sample();
        let before = t.to_bytes();
        t.to(Device::Cuda(1));
        assert_eq!(t.device(), Device::Cuda(1));
        assert_eq!(t.to_bytes(), before);
    }

    #[test]
    fn test_clone_is_deep() {
        let mut a = sample();
        let b = a.clone();
        a.set_at(&[0, 0], 100.0f32).unwrap();
        assert_eq!(b.at(&[0, 0]).unwrap(), 1.0f32);
        assert_ne!(a, b);
    }

    #[test]
    fn test_equality_is_logical() {
        let mut p = sample();
        p.permute(&[1, 0]).unwrap();
        let c = p.contiguous();
        assert_eq!(p, c);
        assert_ne!(p, sample());
        assert_ne!(sample(), Tensor::zeros(&[2, 3], DType::F64).unwrap());
    }

    #[test]
    fn test_debug_display() {
        let t = Tensor::from_vec(vec![1.0f32, 2.0], &[2]).unwrap();
        let debug = format!("{:?}", t);
        assert!(debug.contains("Tensor"));
        assert!(debug.contains("float32"));

        assert_eq!(format!("{}", t), "tensor([1, 2], shape=[2])");
    }
}
