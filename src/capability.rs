//! Capability handles and the capability-provider interface.
//!
//! The element type of an aggregation is determined at runtime, so all
//! type-specific behavior (comparing, copying, encoding, decoding, and the
//! add/div arithmetic behind mean computation) is resolved dynamically as
//! type-erased function handles. A handle is an `Arc`-ed closure over
//! [`AnyValue`] built from typed code at registration time; resolving one is a
//! pure lookup with no side effects, and the accumulator caches whatever it
//! resolves so repeated resolution does not recur.
//!
//! [`CapabilityProvider`] is the boundary to the host's type system. The
//! default implementation is [`TypeRegistry`](crate::registry::TypeRegistry).

use std::any::TypeId;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::type_tag::{AnyValue, DynValue, TypeTag};

/// Total-order comparator over two values of the element type.
pub type CmpFn = Arc<dyn Fn(&AnyValue, &AnyValue) -> Ordering + Send + Sync>;

/// Deep-copies a possibly transient input value into owned storage.
pub type CopyFn = Arc<dyn Fn(&AnyValue) -> DynValue + Send + Sync>;

/// Encodes a value into a self-delimiting byte form.
pub type EncodeFn = Arc<dyn Fn(&AnyValue) -> Result<Vec<u8>> + Send + Sync>;

/// Decodes a value from exactly the given bytes.
pub type DecodeFn = Arc<dyn Fn(&[u8]) -> Result<DynValue> + Send + Sync>;

/// A binary operation (addition or division) over the element type.
pub type BinOpFn = Arc<dyn Fn(&AnyValue, &AnyValue) -> DynValue + Send + Sync>;

/// Materializes a literal value of the element type (here: the literal "2").
pub type LiteralFn = Arc<dyn Fn() -> DynValue + Send + Sync>;

/// The ordering capability: a comparator plus its stable identifier.
///
/// The identifier is written into serialized state and cross-checked on
/// deserialize against whatever the provider resolves for the named type.
#[derive(Clone)]
pub struct OrderingCap {
    pub id: Arc<str>,
    pub cmp: CmpFn,
}

// Manual impls: the function handles are opaque closures.
impl fmt::Debug for OrderingCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderingCap")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// The binary codec capability: encode/decode handles and their identifiers.
#[derive(Clone)]
pub struct CodecCap {
    pub encode_id: Arc<str>,
    pub decode_id: Arc<str>,
    pub encode: EncodeFn,
    pub decode: DecodeFn,
}

impl fmt::Debug for CodecCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecCap")
            .field("encode_id", &self.encode_id)
            .field("decode_id", &self.decode_id)
            .finish_non_exhaustive()
    }
}

/// The arithmetic capability used to average the two middle elements of an
/// even-length group: `(lo + hi) / 2` in the element type's own arithmetic.
///
/// Carries no identifiers because it is never persisted; deserialized state
/// re-resolves it from the element type when finalize actually needs it.
#[derive(Clone)]
pub struct ArithmeticCap {
    pub add: BinOpFn,
    pub div: BinOpFn,
    pub two: LiteralFn,
}

impl fmt::Debug for ArithmeticCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArithmeticCap").finish_non_exhaustive()
    }
}

/// The external type-capability provider.
///
/// Every operation that may need a capability takes a provider argument
/// explicitly; the core keeps no ambient or global state. Each `lookup_*`
/// method either returns handles or fails with
/// [`UnsupportedType`](crate::AggregateError::UnsupportedType), and absence is
/// only an error once the capability is actually required: a type with
/// ordering but no arithmetic aggregates fine until an even-length group
/// reaches finalize.
pub trait CapabilityProvider: Send + Sync {
    /// Resolve the tag for a `TypeId`, typically taken from the first
    /// non-null input value. `None` if the type is not known to the provider.
    fn tag_by_id(&self, id: TypeId) -> Option<TypeTag>;

    /// Resolve the tag for a type name recovered from serialized state.
    fn tag_by_name(&self, name: &str) -> Option<TypeTag>;

    /// The deep-copy primitive for the element type.
    fn copy_fn(&self, tag: TypeTag) -> Result<CopyFn>;

    /// The total-order comparator for the element type.
    fn lookup_ordering(&self, tag: TypeTag) -> Result<OrderingCap>;

    /// The binary encode/decode pair for the element type.
    fn lookup_codec(&self, tag: TypeTag) -> Result<CodecCap>;

    /// The add/div/literal-two bundle for the element type.
    fn lookup_arithmetic(&self, tag: TypeTag) -> Result<ArithmeticCap>;
}
