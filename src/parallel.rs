//! Partitioned median aggregation on the Rayon pool.
//!
//! The input slice is split into contiguous chunks of roughly equal size, one
//! accumulator is built per chunk fully independently, and the per-partition
//! states are then combined pairwise into one before a single finalize. This
//! is the shared-memory flavor of partitioned execution; across process
//! boundaries the host would route each partition's state through
//! [`Median::serialize`](crate::AggregateFn::serialize) /
//! [`deserialize`](crate::AggregateFn::deserialize) instead of moving it
//! directly, which yields the identical result.

use rayon::prelude::*;

use crate::aggregate::{AggregateFn, Median};
use crate::capability::CapabilityProvider;
use crate::error::Result;
use crate::state::MedianState;
use crate::type_tag::{AnyValue, DynValue};

/// Aggregate a slice of optional (nullable) values in parallel and return
/// the median, if any.
///
/// `partitions` defaults to the number of available CPUs. Results are
/// identical to [`median_of`](crate::median_of) for any partition count,
/// because combine is associative and order-insensitive.
pub fn median_of_par<T>(
    provider: &dyn CapabilityProvider,
    values: &[Option<T>],
    partitions: Option<usize>,
) -> Result<Option<DynValue>>
where
    T: Clone + Send + Sync + 'static,
{
    if values.is_empty() {
        return Ok(None);
    }

    let n = partitions.unwrap_or_else(num_cpus::get).max(1);
    // Contiguous chunks of ~len/n each; the last chunk may be shorter.
    let chunk = values.len().div_ceil(n);

    let states: Vec<Option<MedianState>> = values
        .par_chunks(chunk)
        .map(|part| {
            let mut state = None;
            for value in part {
                let value = value.as_ref().map(|v| v as &AnyValue);
                state = Median.transition(provider, state, value)?;
            }
            Ok(state)
        })
        .collect::<Result<_>>()?;

    let merged = states
        .into_iter()
        .try_fold(None, |acc, state| Median.combine(acc, state))?;
    Median.finalize(provider, merged)
}
