//! The partial-aggregation protocol and its median implementation.
//!
//! [`AggregateFn`] is the classic extensible-aggregate contract: fold one
//! value into prior state, merge two partial states, serialize a state to
//! transportable bytes and back, and extract the final output (or "no
//! result") from completed state. The host framework invokes these in plan
//! order: sequential execution never touches serialize/deserialize, while
//! partitioned execution uses them whenever units do not share memory.
//!
//! [`Median`] is the one aggregate implemented here. Its state moves through
//! `Empty → Accumulating → (combined zero or more times) → Finalized`;
//! finalize consumes the state, so nothing can transition after it.

use crate::capability::CapabilityProvider;
use crate::codec;
use crate::error::Result;
use crate::state::MedianState;
use crate::type_tag::{AnyValue, DynValue};

/// The extensible-aggregate contract.
///
/// `state` arguments are `Option`al throughout: `None` is the "no state yet"
/// that precedes the first non-null input, and the `None` output of
/// [`finalize`](Self::finalize) is the aggregate's null result.
pub trait AggregateFn {
    /// Per-group accumulated state.
    type State;
    /// The finalized output value.
    type Output;

    /// Fold one input value (or a null, passed as `None`) into the state,
    /// creating it on the first non-null input.
    fn transition(
        &self,
        provider: &dyn CapabilityProvider,
        state: Option<Self::State>,
        value: Option<&AnyValue>,
    ) -> Result<Option<Self::State>>;

    /// Merge two partial states produced by independent execution units.
    /// Ownership of both inputs transfers to the result.
    fn combine(
        &self,
        a: Option<Self::State>,
        b: Option<Self::State>,
    ) -> Result<Option<Self::State>>;

    /// Serialize a state into an opaque byte sequence. May cache resolved
    /// capabilities on the state, hence `&mut`.
    fn serialize(
        &self,
        provider: &dyn CapabilityProvider,
        state: &mut Self::State,
    ) -> Result<Vec<u8>>;

    /// Reconstruct a state from bytes produced by
    /// [`serialize`](Self::serialize).
    fn deserialize(&self, provider: &dyn CapabilityProvider, bytes: &[u8])
    -> Result<Self::State>;

    /// Produce the final output from completed state, consuming it.
    fn finalize(
        &self,
        provider: &dyn CapabilityProvider,
        state: Option<Self::State>,
    ) -> Result<Option<Self::Output>>;
}

/// Exact median over runtime-typed values.
///
/// Materializes every non-null input value, sorts once at finalize, and picks
/// the middle element: averaging the two middle elements with the element
/// type's own arithmetic when the count is even. Full materialization is a
/// stated trade-off of this aggregate, not an oversight; see the crate docs.
///
/// ```
/// use exact_median::{AggregateFn, AnyValue, Median, TypeRegistry};
///
/// # fn main() -> anyhow::Result<()> {
/// let registry = TypeRegistry::with_builtins();
/// let mut state = None;
/// for v in [1i64, 2, 9, 7, 2, -3, 2] {
///     state = Median.transition(&registry, state, Some(&v as &AnyValue))?;
/// }
/// let median = Median.finalize(&registry, state)?.unwrap();
/// assert_eq!(*median.downcast_ref::<i64>().unwrap(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Median;

impl AggregateFn for Median {
    type State = MedianState;
    type Output = DynValue;

    /// Nulls are a no-op: they neither create state nor affect the count, so
    /// a group of only nulls finalizes to no result.
    fn transition(
        &self,
        provider: &dyn CapabilityProvider,
        state: Option<MedianState>,
        value: Option<&AnyValue>,
    ) -> Result<Option<MedianState>> {
        let Some(value) = value else {
            return Ok(state);
        };
        let mut state = match state {
            Some(state) => state,
            None => MedianState::for_value(provider, value)?,
        };
        state.push(value)?;
        Ok(Some(state))
    }

    /// Absent or empty sides transfer ownership of the other side without
    /// copying; otherwise the values are concatenated into one pre-sized
    /// sequence. Associative and order-insensitive, so any pairwise or tree
    /// merge strategy yields the same final multiset.
    fn combine(
        &self,
        a: Option<MedianState>,
        b: Option<MedianState>,
    ) -> Result<Option<MedianState>> {
        match (a, b) {
            (None, b) => Ok(b),
            (a, None) => Ok(a),
            (Some(a), Some(b)) if a.is_empty() => Ok(Some(b)),
            (Some(a), Some(b)) if b.is_empty() => Ok(Some(a)),
            (Some(mut a), Some(b)) => {
                a.absorb(b)?;
                Ok(Some(a))
            }
        }
    }

    fn serialize(
        &self,
        provider: &dyn CapabilityProvider,
        state: &mut MedianState,
    ) -> Result<Vec<u8>> {
        codec::serialize(provider, state)
    }

    fn deserialize(
        &self,
        provider: &dyn CapabilityProvider,
        bytes: &[u8],
    ) -> Result<MedianState> {
        codec::deserialize(provider, bytes)
    }

    fn finalize(
        &self,
        provider: &dyn CapabilityProvider,
        state: Option<MedianState>,
    ) -> Result<Option<DynValue>> {
        match state {
            None => Ok(None),
            Some(state) => state.into_median(provider),
        }
    }
}

/// Sequentially aggregate a slice of optional (nullable) values and return
/// the median, if any.
///
/// Convenience driver over the [`Median`] protocol for hosts that do not
/// need partitioned execution.
pub fn median_of<T>(
    provider: &dyn CapabilityProvider,
    values: &[Option<T>],
) -> Result<Option<DynValue>>
where
    T: Clone + Send + Sync + 'static,
{
    let mut state = None;
    for value in values {
        let value = value.as_ref().map(|v| v as &AnyValue);
        state = Median.transition(provider, state, value)?;
    }
    Median.finalize(provider, state)
}
