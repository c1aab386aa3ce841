use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use smallvec::SmallVec;
use tracing::warn;

use crate::error::StrideError;
use crate::scalar::{Element, Scalar};
use crate::shape::Shape;
use crate::tensor::{Tensor, TensorCore};
use crate::Result;

/// Result of indexing with a full or partial multi-index.
#[derive(Debug, Clone)]
pub enum Indexed {
    /// Full index: the element itself.
    Scalar(Scalar),
    /// Partial index: a view over the remaining dimensions.
    View(TensorView),
}

impl Indexed {
    pub fn is_scalar(&self) -> bool {
        matches!(self, Indexed::Scalar(_))
    }

    pub fn into_scalar(self) -> Option<Scalar> {
        match self {
            Indexed::Scalar(s) => Some(s),
            Indexed::View(_) => None,
        }
    }

    pub fn into_view(self) -> Option<TensorView> {
        match self {
            Indexed::View(v) => Some(v),
            Indexed::Scalar(_) => None,
        }
    }
}

/// A non-owning window into a tensor with its leading indices fixed.
///
/// Reads and writes go straight to the owning tensor's storage, so writes
/// through a view are visible through the tensor and every other view.
/// The view holds only a weak reference: once the tensor is dropped every
/// access fails with `DetachedView`, and after the tensor is reshaped or
/// permuted it fails with `StaleView`.
#[derive(Clone)]
pub struct TensorView {
    owner: Weak<RwLock<TensorCore>>,
    prefix: SmallVec<[usize; 4]>,
    remaining: Shape,
    generation: u64,
}

impl TensorView {
    /// Caller has validated `prefix` against `core`.
    pub(crate) fn attach(
        owner: Weak<RwLock<TensorCore>>,
        core: &TensorCore,
        prefix: &[usize],
    ) -> Self {
        Self {
            owner,
            prefix: SmallVec::from_slice(prefix),
            remaining: core.shape.suffix(prefix.len()),
            generation: core.generation,
        }
    }

    fn owner(&self) -> Result<Arc<RwLock<TensorCore>>> {
        self.owner.upgrade().ok_or_else(|| {
            warn!(prefix = ?self.prefix.as_slice(), "view used after its tensor was dropped");
            StrideError::DetachedView
        })
    }

    fn check_generation(&self, core: &TensorCore) -> Result<()> {
        if core.generation != self.generation {
            warn!(
                view = self.generation,
                owner = core.generation,
                "view used after its tensor changed layout"
            );
            return Err(StrideError::StaleView {
                view: self.generation,
                owner: core.generation,
            });
        }
        Ok(())
    }

    fn full_index(&self, rest: &[usize]) -> Result<SmallVec<[usize; 8]>> {
        if rest.len() != self.remaining.rank() {
            return Err(StrideError::RankMismatch {
                expected: self.remaining.rank(),
                got: rest.len(),
            });
        }
        let mut full = SmallVec::with_capacity(self.prefix.len() + rest.len());
        full.extend_from_slice(&self.prefix);
        full.extend_from_slice(rest);
        Ok(full)
    }

    /// Element at `prefix ++ rest`.
    pub fn at(&self, rest: &[usize]) -> Result<Scalar> {
        let owner = self.owner()?;
        let core = owner.read();
        self.check_generation(&core)?;
        let full = self.full_index(rest)?;
        core.at(&full)
    }

    /// Typed element access; `T` must match the owner's dtype.
    pub fn get<T: Element>(&self, rest: &[usize]) -> Result<T> {
        let owner = self.owner()?;
        let core = owner.read();
        self.check_generation(&core)?;
        let dtype = core.storage.dtype();
        if T::DTYPE != dtype {
            return Err(StrideError::DTypeMismatch {
                expected: dtype,
                got: T::DTYPE,
            });
        }
        let full = self.full_index(rest)?;
        core.at(&full).map(T::coerce)
    }

    /// Write through to the owning tensor's storage.
    ///
    /// Takes `&self`: several views of one tensor may write to it, each
    /// write being individually locked.
    pub fn set_at(&self, rest: &[usize], value: impl Into<Scalar>) -> Result<()> {
        let owner = self.owner()?;
        let mut core = owner.write();
        self.check_generation(&core)?;
        let full = self.full_index(rest)?;
        core.set_at(&full, value.into())
    }

    /// Index with a full or partial multi-index over the remaining
    /// dimensions.
    pub fn index(&self, rest: &[usize]) -> Result<Indexed> {
        let rank = self.remaining.rank();
        match rest.len().cmp(&rank) {
            Ordering::Equal => self.at(rest).map(Indexed::Scalar),
            Ordering::Less => self.view(rest).map(Indexed::View),
            Ordering::Greater => Err(StrideError::RankMismatch {
                expected: rank,
                got: rest.len(),
            }),
        }
    }

    /// Narrow further by fixing more leading indices.
    pub fn view(&self, rest: &[usize]) -> Result<TensorView> {
        let owner = self.owner()?;
        let core = owner.read();
        self.check_generation(&core)?;
        if rest.len() >= self.remaining.rank() {
            return Err(StrideError::RankMismatch {
                expected: self.remaining.rank().saturating_sub(1),
                got: rest.len(),
            });
        }
        let mut prefix: SmallVec<[usize; 4]> = self.prefix.clone();
        prefix.extend_from_slice(rest);
        core.shape.check_prefix(&prefix)?;
        Ok(TensorView::attach(self.owner.clone(), &core, &prefix))
    }

    /// Dimensions not fixed by the prefix.
    pub fn remaining_dims(&self) -> &Shape {
        &self.remaining
    }

    pub fn rank(&self) -> usize {
        self.remaining.rank()
    }

    /// Fixed leading indices.
    pub fn prefix(&self) -> &[usize] {
        &self.prefix
    }

    /// Whether the owning tensor is alive and its layout unchanged.
    pub fn is_valid(&self) -> bool {
        self.owner
            .upgrade()
            .map(|owner| owner.read().generation == self.generation)
            .unwrap_or(false)
    }

    /// Storage offsets of the viewed elements in row-major order.
    fn offsets(&self, core: &TensorCore) -> Vec<usize> {
        let mut full: SmallVec<[usize; 8]> = SmallVec::from_slice(&self.prefix);
        self.remaining
            .indices()
            .map(|idx| {
                full.truncate(self.prefix.len());
                full.extend_from_slice(&idx);
                core.strides.offset_unchecked(&full)
            })
            .collect()
    }

    /// Copy the viewed elements into a new contiguous tensor.
    pub fn to_tensor(&self) -> Result<Tensor> {
        let owner = self.owner()?;
        let core = owner.read();
        self.check_generation(&core)?;
        let storage = core.storage.gather(&self.offsets(&core));
        Ok(Tensor::from_parts(storage, self.remaining.clone(), core.device))
    }

    /// The viewed elements in row-major order.
    pub fn to_flat_sequence(&self) -> Result<Vec<Scalar>> {
        let owner = self.owner()?;
        let core = owner.read();
        self.check_generation(&core)?;
        Ok(self
            .offsets(&core)
            .into_iter()
            .filter_map(|o| core.storage.get(o))
            .collect())
    }
}

/// Views are equal when their remaining dimensions match and every element
/// compares equal, whichever tensors they belong to. A stale or detached
/// view equals nothing, itself included.
impl PartialEq for TensorView {
    fn eq(&self, other: &Self) -> bool {
        if self.remaining != other.remaining {
            return false;
        }
        // each side takes and releases its owner's lock in turn
        let lhs = self.to_flat_sequence();
        let rhs = other.to_flat_sequence();
        matches!((lhs, rhs), (Ok(a), Ok(b)) if a == b)
    }
}

impl fmt::Debug for TensorView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TensorView(prefix={:?}, remaining={})",
            self.prefix.as_slice(),
            self.remaining
        )
    }
}
