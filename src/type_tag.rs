//! Type tags and type-erased value buffers.
//!
//! This module provides:
//! - [`TypeTag`]: a lightweight runtime type identifier attached to every
//!   accumulator so the engine can assert element types across combine and
//!   deserialize boundaries without carrying generic types.
//! - [`DynValue`] / [`AnyValue`]: the type-erased form in which accumulated
//!   values are owned and passed around. Capability handles downcast these to
//!   the concrete element type when applying their work.
//!
//! The element type of an aggregation is only known once the first non-null
//! input arrives, so the whole aggregation core operates on `dyn Any` values
//! and resolves typed behavior through capability lookups keyed by `TypeTag`.

use std::any::{Any, TypeId, type_name};

/// The unsized type behind every accumulated value.
pub type AnyValue = dyn Any + Send + Sync;

/// An owned, type-erased element value.
///
/// Values held by an accumulator are deep copies boxed as `DynValue`, so the
/// accumulator's lifetime is independent of whatever transient buffer the
/// input came from. Dropping a `DynValue` releases the copy.
pub type DynValue = Box<AnyValue>;

/// A lightweight runtime type tag identifying the element type of one
/// aggregation.
///
/// `TypeTag` carries the `TypeId` and a readable type name. The `TypeId` keys
/// capability lookups within one process; the name is the stable identifier
/// written into serialized state, since `TypeId` values are not meaningful
/// across builds.
///
/// ```
/// use exact_median::TypeTag;
/// let tag = TypeTag::of::<u32>();
/// assert_eq!(tag.name, "u32");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeTag {
    /// Stable Rust type identifier.
    pub id: TypeId,
    /// Human-readable type name (best-effort).
    pub name: &'static str,
}

impl TypeTag {
    /// Construct a tag for `T`.
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }
}
