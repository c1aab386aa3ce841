use smallvec::SmallVec;
use std::fmt;

use crate::error::StrideError;
use crate::Result;

/// Tensor shape with stack-allocated storage for ≤4 dimensions.
///
/// Every dimension is non-negative by construction. A shape containing a
/// zero dimension is empty (size 0) but keeps its rank.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    dims: SmallVec<[usize; 4]>,
}

impl Shape {
    /// Create a new shape from dimensions.
    pub fn new(dims: &[usize]) -> Self {
        Self {
            dims: SmallVec::from_slice(dims),
        }
    }

    /// Create a shape, rejecting dimensions whose product does not fit in
    /// `usize`.
    pub fn try_new(dims: &[usize]) -> Result<Self> {
        if checked_product(dims).is_none() {
            return Err(size_overflow(
                dims.iter().map(|&d| i64::try_from(d).unwrap_or(i64::MAX)).collect(),
            ));
        }
        Ok(Self::new(dims))
    }

    /// Scalar shape (0 dimensions).
    pub fn scalar() -> Self {
        Self {
            dims: SmallVec::new(),
        }
    }

    /// Build a shape from signed dimensions, as host bindings supply them.
    pub fn from_signed(dims: &[i64]) -> Result<Self> {
        let mut out = SmallVec::with_capacity(dims.len());
        for (axis, &d) in dims.iter().enumerate() {
            if d < 0 {
                return Err(StrideError::InvalidShape {
                    dims: dims.to_vec(),
                    reason: format!("dimension {axis} is negative ({d})"),
                });
            }
            out.push(d as usize);
        }
        if checked_product(&out).is_none() {
            return Err(size_overflow(dims.to_vec()));
        }
        Ok(Self { dims: out })
    }

    /// Validate signed dimensions and derive their row-major strides.
    pub fn make(dims: &[i64]) -> Result<(Shape, Strides)> {
        let shape = Shape::from_signed(dims)?;
        let strides = Strides::contiguous(&shape);
        Ok((shape, strides))
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements: 1 for a scalar, 0 if any dimension is 0.
    ///
    /// Shapes built through [`Shape::try_new`] or [`Shape::from_signed`]
    /// never overflow; an unchecked [`Shape::new`] that does saturates at
    /// `usize::MAX` rather than wrapping.
    pub fn size(&self) -> usize {
        checked_product(&self.dims).unwrap_or(usize::MAX)
    }

    /// Get dimension sizes as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Get size of a specific dimension.
    pub fn dim(&self, axis: usize) -> Option<usize> {
        self.dims.get(axis).copied()
    }

    /// Whether this is a scalar (0-dimensional).
    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// Whether the shape holds no elements.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// The dimensions after the first `k`.
    pub fn suffix(&self, k: usize) -> Shape {
        Shape::new(&self.dims[k.min(self.dims.len())..])
    }

    /// Validate a multi-index against this shape.
    ///
    /// Rank is checked first, then every coordinate in axis order.
    pub fn check_index(&self, indices: &[usize]) -> Result<()> {
        if indices.len() != self.rank() {
            return Err(StrideError::RankMismatch {
                expected: self.rank(),
                got: indices.len(),
            });
        }
        self.check_prefix(indices)
    }

    /// Bounds-check the leading `indices.len()` coordinates.
    pub fn check_prefix(&self, indices: &[usize]) -> Result<()> {
        for (dim, (&index, &size)) in indices.iter().zip(self.dims.iter()).enumerate() {
            if index >= size {
                return Err(StrideError::IndexOutOfRange {
                    index: index as i64,
                    dim,
                    size,
                });
            }
        }
        Ok(())
    }

    /// Validate and compute a reshape target.
    /// At most one dimension can be -1 (inferred).
    pub fn resolve_reshape(&self, target: &[i64]) -> Result<Shape> {
        let numel = self.size();
        let mut inferred_idx = None;
        let mut known_product: usize = 1;

        for (i, &d) in target.iter().enumerate() {
            if d == -1 {
                if inferred_idx.is_some() {
                    return Err(StrideError::InvalidShape {
                        dims: target.to_vec(),
                        reason: "only one dimension can be inferred".into(),
                    });
                }
                inferred_idx = Some(i);
            } else if d < 0 {
                return Err(StrideError::InvalidShape {
                    dims: target.to_vec(),
                    reason: format!("dimension {i} is negative ({d})"),
                });
            } else {
                known_product = known_product.saturating_mul(d as usize);
            }
        }

        let known: SmallVec<[usize; 4]> = target
            .iter()
            .filter(|&&d| d != -1)
            .map(|&d| d as usize)
            .collect();
        if checked_product(&known).is_none() {
            return Err(size_overflow(target.to_vec()));
        }

        let mismatch = || StrideError::SizeMismatch {
            numel,
            shape: target.to_vec(),
        };

        let mut result: SmallVec<[usize; 4]> = target
            .iter()
            .map(|&d| if d == -1 { 0 } else { d as usize })
            .collect();

        if let Some(idx) = inferred_idx {
            if known_product == 0 || numel % known_product != 0 {
                return Err(mismatch());
            }
            result[idx] = numel / known_product;
        }

        let resolved = Shape { dims: result };
        if resolved.size() != numel {
            return Err(mismatch());
        }
        Ok(resolved)
    }

    /// Iterate every multi-index of this shape in row-major order.
    pub fn indices(&self) -> IndexIter {
        IndexIter::new(self.clone())
    }
}

/// Product of `dims`, or `None` if it does not fit in `usize`. A zero
/// dimension makes the product 0 whatever the others are.
fn checked_product(dims: &[usize]) -> Option<usize> {
    if dims.contains(&0) {
        return Some(0);
    }
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

fn size_overflow(dims: Vec<i64>) -> StrideError {
    StrideError::InvalidShape {
        dims,
        reason: "size overflows usize".into(),
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape({:?})", self.dims.as_slice())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::new(dims)
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape {
            dims: SmallVec::from_vec(dims),
        }
    }
}

macro_rules! impl_shape_from_array {
    ($($n:expr),*) => {
        $(
            impl From<[usize; $n]> for Shape {
                fn from(dims: [usize; $n]) -> Self {
                    Shape::new(&dims)
                }
            }
        )*
    };
}

impl_shape_from_array!(0, 1, 2, 3, 4, 5, 6);

/// Element strides, one per dimension, in elements (not bytes).
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Strides {
    strides: SmallVec<[usize; 4]>,
}

impl Strides {
    /// Row-major strides: `stride[i] = product(shape[i+1..])`.
    pub fn contiguous(shape: &Shape) -> Self {
        let ndim = shape.rank();
        let mut strides = SmallVec::from_elem(0usize, ndim);
        if ndim == 0 {
            return Self { strides };
        }
        strides[ndim - 1] = 1;
        for i in (0..ndim - 1).rev() {
            // saturates only for empty shapes, whose strides are never used
            strides[i] = strides[i + 1].saturating_mul(shape.dims()[i + 1]);
        }
        Self { strides }
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.strides
    }

    pub fn len(&self) -> usize {
        self.strides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strides.is_empty()
    }

    /// Storage offset of a full multi-index.
    ///
    /// Fails with `RankMismatch` if `indices.len() != rank`, or
    /// `IndexOutOfRange` if any coordinate is outside `[0, shape[i])`.
    /// Nothing is computed until every coordinate has been checked.
    pub fn flat_index(&self, shape: &Shape, indices: &[usize]) -> Result<usize> {
        shape.check_index(indices)?;
        Ok(self.offset_unchecked(indices))
    }

    /// [`Strides::flat_index`] for signed host indices; negative
    /// coordinates are out of range.
    pub fn flat_index_signed(&self, shape: &Shape, indices: &[i64]) -> Result<usize> {
        if indices.len() != shape.rank() {
            return Err(StrideError::RankMismatch {
                expected: shape.rank(),
                got: indices.len(),
            });
        }
        let mut unsigned: SmallVec<[usize; 4]> = SmallVec::with_capacity(indices.len());
        for (dim, &index) in indices.iter().enumerate() {
            if index < 0 {
                return Err(StrideError::IndexOutOfRange {
                    index,
                    dim,
                    size: shape.dims()[dim],
                });
            }
            unsigned.push(index as usize);
        }
        self.flat_index(shape, &unsigned)
    }

    /// Offset of an already validated (possibly partial) index prefix.
    pub(crate) fn offset_unchecked(&self, indices: &[usize]) -> usize {
        indices
            .iter()
            .zip(self.strides.iter())
            .map(|(&i, &s)| i * s)
            .sum()
    }

    /// Whether storage order under these strides is the row-major order of
    /// `shape`. Strides of size-1 dimensions never matter; empty shapes are
    /// trivially contiguous.
    pub fn is_contiguous_for(&self, shape: &Shape) -> bool {
        if shape.is_empty() {
            return true;
        }
        let expected = Strides::contiguous(shape);
        shape
            .dims()
            .iter()
            .zip(self.strides.iter().zip(expected.strides.iter()))
            .all(|(&d, (&s, &e))| d == 1 || s == e)
    }
}

impl fmt::Debug for Strides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Strides({:?})", self.strides.as_slice())
    }
}

impl From<Vec<usize>> for Strides {
    fn from(strides: Vec<usize>) -> Self {
        Strides {
            strides: SmallVec::from_vec(strides),
        }
    }
}

/// Check that `order` is a bijection on `[0, rank)`.
pub fn validate_permutation(order: &[usize], rank: usize) -> Result<()> {
    let invalid = || StrideError::InvalidPermutation {
        order: order.to_vec(),
        rank,
    };
    if order.len() != rank {
        return Err(invalid());
    }
    let mut seen: SmallVec<[bool; 8]> = SmallVec::from_elem(false, rank);
    for &axis in order {
        if axis >= rank || seen[axis] {
            return Err(invalid());
        }
        seen[axis] = true;
    }
    Ok(())
}

/// Reorder dimensions and strides together: axis `i` of the result is axis
/// `order[i]` of the input. No data moves.
pub fn permute(shape: &Shape, strides: &Strides, order: &[usize]) -> Result<(Shape, Strides)> {
    validate_permutation(order, shape.rank())?;
    let dims = order.iter().map(|&a| shape.dims[a]).collect();
    let new_strides = order.iter().map(|&a| strides.strides[a]).collect();
    Ok((Shape { dims }, Strides { strides: new_strides }))
}

/// The permutation that undoes `order`.
pub fn invert_permutation(order: &[usize]) -> Result<Vec<usize>> {
    validate_permutation(order, order.len())?;
    let mut inverse = vec![0; order.len()];
    for (i, &axis) in order.iter().enumerate() {
        inverse[axis] = i;
    }
    Ok(inverse)
}

/// Row-major iterator over all multi-indices of a shape.
///
/// Yields exactly one empty index for a scalar shape and nothing for an
/// empty shape.
pub struct IndexIter {
    shape: Shape,
    current: SmallVec<[usize; 4]>,
    done: bool,
}

impl IndexIter {
    fn new(shape: Shape) -> Self {
        let done = shape.is_empty();
        let current = SmallVec::from_elem(0, shape.rank());
        Self {
            shape,
            current,
            done,
        }
    }
}

impl Iterator for IndexIter {
    type Item = SmallVec<[usize; 4]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.current.clone();
        // Odometer increment, last axis fastest.
        let mut axis = self.shape.rank();
        loop {
            if axis == 0 {
                self.done = true;
                break;
            }
            axis -= 1;
            self.current[axis] += 1;
            if self.current[axis] < self.shape.dims[axis] {
                break;
            }
            self.current[axis] = 0;
        }
        Some(item)
    }
}
