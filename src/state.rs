//! The per-group aggregation state for the median.
//!
//! A [`MedianState`] owns a growable sequence of deep-copied element values
//! plus the capability handles resolved so far. It is exclusively owned by
//! one execution unit; parallel units each build their own state and the
//! coordinating unit merges them with [`absorb`](MedianState::absorb), taking
//! ownership of both sides. There is no internal locking.
//!
//! Capability resolution is staged: ordering (and the copy primitive) resolve
//! eagerly at creation, the binary codec only when serialization first needs
//! it, and arithmetic only inside [`into_median`](MedianState::into_median)
//! when an even-length group must average its two middle elements. Unbounded
//! groups are held fully in memory; no spill to secondary storage.

use std::fmt;

use tracing::trace;

use crate::capability::{CapabilityProvider, CodecCap, CopyFn, OrderingCap};
use crate::error::{AggregateError, Capability, Result};
use crate::type_tag::{AnyValue, DynValue, TypeTag};

/// Accumulated median state for one group (or one partition of a group).
///
/// Invariant: the reported count is always exactly the length of the owned
/// value sequence, and it only grows (via [`push`](Self::push) or
/// [`absorb`](Self::absorb)), never shrinks.
pub struct MedianState {
    tag: TypeTag,
    copy: CopyFn,
    ordering: OrderingCap,
    /// Resolved on first serialize (or on deserialize) and cached.
    codec: Option<CodecCap>,
    values: Vec<DynValue>,
}

// Manual impl: the capability handles are opaque closures.
impl fmt::Debug for MedianState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MedianState")
            .field("tag", &self.tag)
            .field("count", &self.values.len())
            .finish_non_exhaustive()
    }
}

impl MedianState {
    /// Create an empty state for the given element type.
    ///
    /// Resolves the ordering comparator and the copy primitive eagerly; a
    /// type that cannot be ordered cannot be aggregated at all, so this fails
    /// with [`UnsupportedType`](AggregateError::UnsupportedType) up front.
    pub fn new(tag: TypeTag, provider: &dyn CapabilityProvider) -> Result<Self> {
        let ordering = provider.lookup_ordering(tag)?;
        let copy = provider.copy_fn(tag)?;
        trace!(element_type = tag.name, "created median state");
        Ok(Self {
            tag,
            copy,
            ordering,
            codec: None,
            values: Vec::new(),
        })
    }

    /// Create a state whose element type is taken from the first non-null
    /// input value. Fails if the value's type is unknown to the provider.
    pub fn for_value(provider: &dyn CapabilityProvider, value: &AnyValue) -> Result<Self> {
        let tag = provider.tag_by_id(value.type_id()).ok_or_else(|| {
            AggregateError::UnsupportedType {
                type_name: format!("{:?}", value.type_id()),
                capability: Capability::Ordering,
            }
        })?;
        Self::new(tag, provider)
    }

    /// The element type this state aggregates.
    #[must_use]
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Number of accumulated (non-null) values.
    #[must_use]
    pub fn count(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read-only view of the state: `(count, accumulated values)`.
    ///
    /// Used by the codec and by host engines that want to inspect partial
    /// state; never mutates or consumes the accumulator.
    #[must_use]
    pub fn snapshot(&self) -> (usize, &[DynValue]) {
        (self.values.len(), &self.values)
    }

    pub(crate) fn ordering_id(&self) -> &str {
        &self.ordering.id
    }

    /// Deep-copy `value` into owned storage and append it.
    ///
    /// Null handling lives one layer up, in
    /// [`Median::transition`](crate::Median): by the time a value reaches
    /// here it is a real element. Passing a value of a different type than
    /// this state's tag is a caller defect and panics.
    pub fn push(&mut self, value: &AnyValue) -> Result<()> {
        // Amortized O(1) growth; only the explicit headroom check can fail.
        self.try_grow(1)?;
        self.values.push((*self.copy)(value));
        Ok(())
    }

    /// Append an already-owned value. Used by the codec's decode path, which
    /// pre-reserves for the full count.
    pub(crate) fn push_owned(&mut self, value: DynValue) {
        self.values.push(value);
    }

    /// Merge `other` into `self`, transferring ownership of its values.
    ///
    /// The destination is pre-sized to the combined count so the merge does a
    /// single allocation at most. Order of the two sides is irrelevant: the
    /// finalizer sorts before use, so combine is associative and commutative
    /// up to multiset equality.
    pub fn absorb(&mut self, other: MedianState) -> Result<()> {
        debug_assert_eq!(
            self.tag, other.tag,
            "combined median states must aggregate the same element type"
        );
        trace!(
            element_type = self.tag.name,
            left = self.values.len(),
            right = other.values.len(),
            "merging median states"
        );
        self.values
            .try_reserve_exact(other.values.len())
            .map_err(AggregateError::ResourceExhausted)?;
        self.values.extend(other.values);
        Ok(())
    }

    /// Resolve the binary codec if not yet cached and return it.
    pub(crate) fn ensure_codec(&mut self, provider: &dyn CapabilityProvider) -> Result<&CodecCap> {
        let cap = match self.codec.take() {
            Some(cap) => cap,
            None => provider.lookup_codec(self.tag)?,
        };
        Ok(self.codec.insert(cap))
    }

    /// Install an already-resolved codec. Used by deserialize so the
    /// reconstructed state is immediately serializable again.
    pub(crate) fn set_codec(&mut self, cap: CodecCap) {
        self.codec = Some(cap);
    }

    pub(crate) fn try_grow(&mut self, additional: usize) -> Result<()> {
        self.values
            .try_reserve(additional)
            .map_err(AggregateError::ResourceExhausted)
    }

    /// Sort the accumulated values and produce the median, consuming the
    /// state: finalize can only ever run once per accumulator, enforced by
    /// the type system.
    ///
    /// Returns `Ok(None)` for an empty state (a group with only null inputs
    /// has no median). For an odd count the result is the middle element
    /// itself; for an even count the arithmetic capability is resolved only
    /// now, and the result is `(lo + hi) / 2` in the element
    /// type's own arithmetic, so odd-length groups succeed even for types
    /// that can be ordered but not averaged.
    pub fn into_median(mut self, provider: &dyn CapabilityProvider) -> Result<Option<DynValue>> {
        if self.values.is_empty() {
            return Ok(None);
        }

        let cmp = self.ordering.cmp.clone();
        // Unstable is fine: values that compare equal are interchangeable.
        self.values.sort_unstable_by(|a, b| (*cmp)(a.as_ref(), b.as_ref()));

        let n = self.values.len();
        let mid = n / 2;
        if n % 2 == 1 {
            return Ok(Some(self.values.swap_remove(mid)));
        }

        let arith = provider.lookup_arithmetic(self.tag)?;
        let lo = &self.values[mid - 1];
        let hi = &self.values[mid];
        let sum = (*arith.add)(lo.as_ref(), hi.as_ref());
        let two = (*arith.two)();
        Ok(Some((*arith.div)(sum.as_ref(), two.as_ref())))
    }
}
