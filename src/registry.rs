//! The default capability provider: a per-process type registry.
//!
//! A [`TypeRegistry`] maps element types to their [`TypeEntry`], the bundle of
//! capability handles built from typed code at registration time. Entries are
//! assembled with [`EntryBuilder`], which turns ordinary trait bounds into
//! type-erased handles:
//!
//! ```
//! use exact_median::{TypeEntry, TypeRegistry};
//!
//! let mut registry = TypeRegistry::new();
//! registry.insert(TypeEntry::of::<i64>().with_ord().with_codec().with_arithmetic().build());
//! ```
//!
//! [`TypeRegistry::with_builtins`] pre-registers the common orderable
//! primitive types so the crate is usable out of the box. Note that `String`
//! (and other non-numeric types) register ordering and a codec but no
//! arithmetic: median over such types works for odd-length groups and fails
//! only when an even-length group actually needs a mean.

use std::any::TypeId;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::ops::{Add, Div};
use std::sync::Arc;

use ordered_float::OrderedFloat;
use serde::{Serialize, de::DeserializeOwned};

use crate::capability::{ArithmeticCap, CapabilityProvider, CodecCap, CopyFn, OrderingCap};
use crate::error::{AggregateError, Capability, Result};
use crate::type_tag::{AnyValue, DynValue, TypeTag};

/// The registered capability set for one element type.
pub struct TypeEntry {
    pub tag: TypeTag,
    pub copy: CopyFn,
    pub ordering: Option<OrderingCap>,
    pub codec: Option<CodecCap>,
    pub arithmetic: Option<ArithmeticCap>,
}

impl TypeEntry {
    /// Start building an entry for `T`. The deep-copy handle is always
    /// present; ordering, codec, and arithmetic are opt-in.
    #[must_use]
    pub fn of<T: Clone + Send + Sync + 'static>() -> EntryBuilder<T> {
        let copy: CopyFn = Arc::new(|v: &AnyValue| {
            let v = v
                .downcast_ref::<T>()
                .expect("copy capability: element type mismatch");
            Box::new(v.clone()) as DynValue
        });
        EntryBuilder {
            entry: Self {
                tag: TypeTag::of::<T>(),
                copy,
                ordering: None,
                codec: None,
                arithmetic: None,
            },
            _t: PhantomData,
        }
    }
}

/// Typed builder that erases capabilities for a [`TypeEntry`].
pub struct EntryBuilder<T> {
    entry: TypeEntry,
    _t: PhantomData<T>,
}

impl<T: Clone + Send + Sync + 'static> EntryBuilder<T> {
    /// Use `T`'s `Ord` implementation as the ordering capability.
    #[must_use]
    pub fn with_ord(self) -> Self
    where
        T: Ord,
    {
        self.with_cmp(T::cmp)
    }

    /// Use a custom comparator as the ordering capability. This is how types
    /// without a native total order (e.g. floats) get registered.
    #[must_use]
    pub fn with_cmp(mut self, cmp: impl Fn(&T, &T) -> Ordering + Send + Sync + 'static) -> Self {
        let id: Arc<str> = format!("{}/cmp", self.entry.tag.name).into();
        self.entry.ordering = Some(OrderingCap {
            id,
            cmp: Arc::new(move |a: &AnyValue, b: &AnyValue| {
                let a = a
                    .downcast_ref::<T>()
                    .expect("ordering capability: element type mismatch");
                let b = b
                    .downcast_ref::<T>()
                    .expect("ordering capability: element type mismatch");
                cmp(a, b)
            }),
        });
        self
    }

    /// Derive the binary codec from `T`'s serde implementations, encoded with
    /// postcard. Each value decodes from exactly its length-prefixed slice;
    /// leftover bytes within a slice are treated as corruption.
    #[must_use]
    pub fn with_codec(mut self) -> Self
    where
        T: Serialize + DeserializeOwned,
    {
        let name = self.entry.tag.name;
        self.entry.codec = Some(CodecCap {
            encode_id: format!("{name}/encode").into(),
            decode_id: format!("{name}/decode").into(),
            encode: Arc::new(move |v: &AnyValue| {
                let v = v
                    .downcast_ref::<T>()
                    .expect("encode capability: element type mismatch");
                postcard::to_allocvec(v).map_err(|source| AggregateError::Encode {
                    type_name: name,
                    source,
                })
            }),
            decode: Arc::new(move |bytes: &[u8]| {
                let (v, rest) = postcard::take_from_bytes::<T>(bytes).map_err(|e| {
                    AggregateError::Deserialize(format!("value of type `{name}` failed to decode: {e}"))
                })?;
                if !rest.is_empty() {
                    return Err(AggregateError::Deserialize(format!(
                        "value of type `{name}` left {} undecoded bytes",
                        rest.len()
                    )));
                }
                Ok(Box::new(v) as DynValue)
            }),
        });
        self
    }

    /// Derive the arithmetic capability from `T`'s own operators.
    ///
    /// The mean of an even-length group is `(lo + hi) / 2`, so the element
    /// type must be able to materialize the literal "2" as one of its own
    /// values; `From<u8>` is that materialization. Division follows the
    /// type's semantics, including integer truncation.
    #[must_use]
    pub fn with_arithmetic(mut self) -> Self
    where
        T: Add<Output = T> + Div<Output = T> + From<u8>,
    {
        self.entry.arithmetic = Some(ArithmeticCap {
            add: Arc::new(|a: &AnyValue, b: &AnyValue| {
                let a = a
                    .downcast_ref::<T>()
                    .expect("add capability: element type mismatch");
                let b = b
                    .downcast_ref::<T>()
                    .expect("add capability: element type mismatch");
                Box::new(a.clone() + b.clone()) as DynValue
            }),
            div: Arc::new(|a: &AnyValue, b: &AnyValue| {
                let a = a
                    .downcast_ref::<T>()
                    .expect("div capability: element type mismatch");
                let b = b
                    .downcast_ref::<T>()
                    .expect("div capability: element type mismatch");
                Box::new(a.clone() / b.clone()) as DynValue
            }),
            two: Arc::new(|| Box::new(T::from(2u8)) as DynValue),
        });
        self
    }

    /// Finish the entry.
    #[must_use]
    pub fn build(self) -> TypeEntry {
        self.entry
    }
}

/// The default [`CapabilityProvider`]: an in-process map from element type to
/// its registered capabilities.
#[derive(Default)]
pub struct TypeRegistry {
    entries: HashMap<TypeId, TypeEntry>,
    by_name: HashMap<&'static str, TypeId>,
}

macro_rules! register_numeric {
    ($reg:expr, $($t:ty),* $(,)?) => {
        $( $reg.insert(TypeEntry::of::<$t>().with_ord().with_codec().with_arithmetic().build()); )*
    };
}

macro_rules! register_ordered {
    ($reg:expr, $($t:ty),* $(,)?) => {
        $( $reg.insert(TypeEntry::of::<$t>().with_ord().with_codec().build()); )*
    };
}

impl TypeRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the common orderable primitive types.
    ///
    /// Integers and floats get the full capability set (floats compare via
    /// `ordered-float`'s total order). `i8` gets no arithmetic because the
    /// literal "2" (a `u8`) does not convert into it losslessly. `bool`,
    /// `char`, and `String` are orderable and encodable but have no
    /// arithmetic, so even-length groups of them fail at finalize.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        register_numeric!(reg, u8, u16, u32, u64, u128, i16, i32, i64, i128);
        register_ordered!(reg, i8, bool, char, String);
        reg.insert(
            TypeEntry::of::<f32>()
                .with_cmp(|a, b| OrderedFloat(*a).cmp(&OrderedFloat(*b)))
                .with_codec()
                .with_arithmetic()
                .build(),
        );
        reg.insert(
            TypeEntry::of::<f64>()
                .with_cmp(|a, b| OrderedFloat(*a).cmp(&OrderedFloat(*b)))
                .with_codec()
                .with_arithmetic()
                .build(),
        );
        reg
    }

    /// Register an entry, replacing any previous registration for its type.
    pub fn insert(&mut self, entry: TypeEntry) {
        self.by_name.insert(entry.tag.name, entry.tag.id);
        self.entries.insert(entry.tag.id, entry);
    }

    fn entry(&self, tag: TypeTag) -> Result<&TypeEntry> {
        self.entries
            .get(&tag.id)
            .ok_or_else(|| AggregateError::UnsupportedType {
                type_name: tag.name.to_string(),
                capability: Capability::Copy,
            })
    }
}

impl CapabilityProvider for TypeRegistry {
    fn tag_by_id(&self, id: TypeId) -> Option<TypeTag> {
        self.entries.get(&id).map(|e| e.tag)
    }

    fn tag_by_name(&self, name: &str) -> Option<TypeTag> {
        self.by_name.get(name).map(|id| self.entries[id].tag)
    }

    fn copy_fn(&self, tag: TypeTag) -> Result<CopyFn> {
        Ok(self.entry(tag)?.copy.clone())
    }

    fn lookup_ordering(&self, tag: TypeTag) -> Result<OrderingCap> {
        self.entry(tag)?
            .ordering
            .clone()
            .ok_or_else(|| AggregateError::UnsupportedType {
                type_name: tag.name.to_string(),
                capability: Capability::Ordering,
            })
    }

    fn lookup_codec(&self, tag: TypeTag) -> Result<CodecCap> {
        self.entry(tag)?
            .codec
            .clone()
            .ok_or_else(|| AggregateError::UnsupportedType {
                type_name: tag.name.to_string(),
                capability: Capability::Codec,
            })
    }

    fn lookup_arithmetic(&self, tag: TypeTag) -> Result<ArithmeticCap> {
        self.entry(tag)?
            .arithmetic
            .clone()
            .ok_or_else(|| AggregateError::UnsupportedType {
                type_name: tag.name.to_string(),
                capability: Capability::Arithmetic,
            })
    }
}
