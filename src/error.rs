//! Error types surfaced by the aggregation core.
//!
//! All failures here are unrecoverable at this level: the caller (the
//! aggregation-execution framework) decides whether to abort the group or the
//! whole query. Nothing is retried internally.

use std::collections::TryReserveError;
use std::fmt;

use thiserror::Error;

/// The capability classes an element type may provide.
///
/// Each stage of aggregation requires a different capability: ordering is
/// required as soon as the first value arrives, the binary codec only when
/// state is serialized, and arithmetic only when an even-length group must
/// average its two middle elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Total-order comparison between two values.
    Ordering,
    /// Binary encode/decode to and from a self-delimiting byte form.
    Codec,
    /// Addition, division, and a literal "2" for mean computation.
    Arithmetic,
    /// Deep copy into accumulator-owned storage.
    Copy,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ordering => "ordering",
            Self::Codec => "binary codec",
            Self::Arithmetic => "arithmetic",
            Self::Copy => "copy",
        };
        f.write_str(s)
    }
}

/// Errors produced by the median aggregation core.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// The element type does not provide a capability the current operation
    /// needs. Ordering surfaces this at the first transition; the codec at
    /// serialize time; arithmetic only at finalize time for even counts.
    #[error("type `{type_name}` provides no {capability} capability")]
    UnsupportedType {
        type_name: String,
        capability: Capability,
    },

    /// A serialized state buffer is truncated, has an inconsistent length
    /// prefix, carries unconsumed trailing bytes, or names capabilities that
    /// do not match what the provider resolves for its element type.
    #[error("malformed serialized median state: {0}")]
    Deserialize(String),

    /// A value failed binary encoding while serializing state.
    #[error("failed to encode value of type `{type_name}`")]
    Encode {
        type_name: &'static str,
        #[source]
        source: postcard::Error,
    },

    /// Memory allocation for the accumulated value sequence failed.
    #[error("out of memory while growing median state")]
    ResourceExhausted(#[source] TryReserveError),
}

/// Result alias used throughout the crate.
pub type Result<T, E = AggregateError> = std::result::Result<T, E>;
