//! Byte-level serialization of median state for transport across process or
//! address-space boundaries.
//!
//! Live capability handles are never transportable, so the wire form carries
//! only identifiers and data, postcard-encoded in a fixed field order:
//!
//! 1. element type name
//! 2. ordering / encode / decode capability identifiers
//! 3. value count, then each value as a length-prefixed encoded byte string
//!
//! Decoding is purely sequential and self-delimiting. The identifiers are
//! *not* trusted blindly: deserialize re-resolves every capability from the
//! provider by type name and cross-checks the recorded identifiers against
//! what it resolved. The arithmetic capability is deliberately absent from
//! the wire form; it is only ever needed after merging, at finalize time,
//! and is re-resolved from the element type then.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capability::CapabilityProvider;
use crate::error::{AggregateError, Capability, Result};
use crate::state::MedianState;

/// The serialized shape of a [`MedianState`]. `values` carries one encoded
/// byte string per accumulated value; postcard writes its count first and
/// length-prefixes each entry, matching the sequential layout above.
#[derive(Serialize, Deserialize)]
struct Envelope {
    type_name: String,
    cmp_id: String,
    encode_id: String,
    decode_id: String,
    values: Vec<Vec<u8>>,
}

/// Serialize a state into an opaque byte sequence.
///
/// Resolves (and caches) the encode capability lazily, so a type without a
/// binary codec fails here with
/// [`UnsupportedType`](AggregateError::UnsupportedType) even though every
/// earlier append succeeded.
pub fn serialize(provider: &dyn CapabilityProvider, state: &mut MedianState) -> Result<Vec<u8>> {
    let codec = state.ensure_codec(provider)?.clone();
    let tag = state.tag();
    let (count, values) = state.snapshot();

    let mut encoded = Vec::new();
    encoded
        .try_reserve_exact(count)
        .map_err(AggregateError::ResourceExhausted)?;
    for value in values {
        encoded.push((*codec.encode)(value.as_ref())?);
    }

    let envelope = Envelope {
        type_name: tag.name.to_string(),
        cmp_id: state.ordering_id().to_string(),
        encode_id: codec.encode_id.to_string(),
        decode_id: codec.decode_id.to_string(),
        values: encoded,
    };
    let bytes = postcard::to_allocvec(&envelope).map_err(|source| AggregateError::Encode {
        type_name: tag.name,
        source,
    })?;
    debug!(element_type = tag.name, count, len = bytes.len(), "serialized median state");
    Ok(bytes)
}

/// Reconstruct a state from a byte sequence produced by [`serialize`].
///
/// Fails with [`Deserialize`](AggregateError::Deserialize) on truncated or
/// malformed input, including trailing bytes after the envelope and
/// capability identifiers that do not match what the provider resolves for
/// the named element type. On any failure no partially-usable state is
/// returned. The reconstructed state has ordering, copy, and codec handles
/// resolved immediately (the same policy as the first transition) and is
/// finalize-equivalent to the state that was serialized.
pub fn deserialize(provider: &dyn CapabilityProvider, bytes: &[u8]) -> Result<MedianState> {
    let (envelope, rest) = postcard::take_from_bytes::<Envelope>(bytes)
        .map_err(|e| AggregateError::Deserialize(format!("malformed envelope: {e}")))?;
    if !rest.is_empty() {
        return Err(AggregateError::Deserialize(format!(
            "{} trailing bytes after envelope",
            rest.len()
        )));
    }

    let tag = provider.tag_by_name(&envelope.type_name).ok_or_else(|| {
        AggregateError::UnsupportedType {
            type_name: envelope.type_name.clone(),
            capability: Capability::Ordering,
        }
    })?;

    let mut state = MedianState::new(tag, provider)?;
    let codec = provider.lookup_codec(tag)?;
    if envelope.cmp_id != *state.ordering_id()
        || envelope.encode_id != *codec.encode_id
        || envelope.decode_id != *codec.decode_id
    {
        return Err(AggregateError::Deserialize(format!(
            "capability identifiers in serialized state do not match type `{}`",
            envelope.type_name
        )));
    }

    state.try_grow(envelope.values.len())?;
    for value_bytes in &envelope.values {
        state.push_owned((*codec.decode)(value_bytes)?);
    }
    state.set_codec(codec);
    debug!(
        element_type = tag.name,
        count = state.count(),
        "deserialized median state"
    );
    Ok(state)
}
