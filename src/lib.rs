//! # exact-median
//!
//! An **exact median aggregate** for query and dataflow engines, over values
//! whose type is only determined at runtime. The aggregate implements the
//! classic partial-aggregation protocol: *transition*, *combine*,
//! *serialize*, *deserialize*, *finalize*, so it slots into grouped,
//! windowed, and parallel/partitioned execution plans.
//!
//! ## Key Features
//!
//! - **Runtime-typed** - the element type is discovered from the first
//!   non-null input; all type-specific behavior is resolved dynamically as
//!   capability handles, never hard-coded per type
//! - **Partial aggregation** - independent per-partition accumulators merge
//!   associatively into one equivalent state
//! - **Transportable state** - accumulator state serializes to an opaque,
//!   self-delimiting byte sequence for crossing process boundaries
//! - **Exact results** - full materialization and one sort; even-length
//!   groups average the two middle elements using the element type's *own*
//!   arithmetic (including its truncation rules), not a generic float mean
//! - **Lazy capability resolution** - ordering resolves eagerly, the binary
//!   codec only when serializing, arithmetic only when an even-length group
//!   reaches finalize, so orderable-but-not-averageable types still work
//!   for odd-length groups
//!
//! ## Quick Start
//!
//! ```
//! use exact_median::{AggregateFn, AnyValue, Median, TypeRegistry};
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let registry = TypeRegistry::with_builtins();
//!
//! // Feed values one at a time; None is a null and is ignored.
//! let mut state = None;
//! for v in [1i64, 2, 9, 7, 2, -3, 2] {
//!     state = Median.transition(&registry, state, Some(&v as &AnyValue))?;
//! }
//!
//! let median = Median.finalize(&registry, state)?.unwrap();
//! assert_eq!(*median.downcast_ref::<i64>().unwrap(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Capabilities
//!
//! A *capability* is a dynamically resolved, type-specific operation: the
//! total-order comparator, the deep-copy primitive, the binary encode/decode
//! pair, and the add/div/literal-"2" bundle behind mean computation. The
//! [`CapabilityProvider`] trait is the boundary to the host's type system;
//! [`TypeRegistry`] is the default in-process implementation, pre-populated
//! with the common orderable primitives via [`TypeRegistry::with_builtins`]
//! and extensible with [`TypeEntry`] / [`EntryBuilder`] for user types.
//!
//! ### Accumulator
//!
//! [`MedianState`] owns deep copies of every non-null input plus the
//! capability handles resolved so far. Each state is exclusively owned by one
//! execution unit; there is no shared mutable state and no locking. Growth
//! is amortized O(1); allocation failure surfaces as
//! [`AggregateError::ResourceExhausted`].
//!
//! ### The aggregate protocol
//!
//! [`AggregateFn`] is the five-operation extensible-aggregate contract, and
//! [`Median`] its implementation here. Combine is associative and
//! order-insensitive, so any pairwise or tree merge of partition states
//! finalizes identically. Serialized state carries type and capability
//! *identifiers*, never live handles; deserialize re-resolves and
//! cross-checks them.
//!
//! ### Execution helpers
//!
//! - [`median_of`] - sequential aggregation of a slice
//! - [`median_of_par`] - partitioned aggregation on the Rayon pool
//!   (`parallel` feature, on by default)
//!
//! ## Trade-offs
//!
//! This is an **exact** median: every value in the group is materialized in
//! memory and sorted once at finalize. That is a deliberate trade-off, not an
//! oversight. For bounded-error approximation over unbounded streams use a
//! sketch such as a t-digest, which is explicitly out of scope here. Groups
//! are expected to fit in memory; there is no spill to secondary storage.

pub mod aggregate;
pub mod capability;
pub mod codec;
pub mod error;
pub mod registry;
pub mod state;
pub mod type_tag;

#[cfg(feature = "parallel")]
pub mod parallel;

// General re-exports
pub use aggregate::{AggregateFn, Median, median_of};
pub use capability::{
    ArithmeticCap, BinOpFn, CapabilityProvider, CmpFn, CodecCap, CopyFn, DecodeFn, EncodeFn,
    LiteralFn, OrderingCap,
};
pub use error::{AggregateError, Capability, Result};
pub use registry::{EntryBuilder, TypeEntry, TypeRegistry};
pub use state::MedianState;
pub use type_tag::{AnyValue, DynValue, TypeTag};

// Gated re-exports
#[cfg(feature = "parallel")]
pub use parallel::median_of_par;
