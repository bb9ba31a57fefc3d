//! Scalar type table: native scalar tags ⇄ internal scalar types
//!
//! The forward direction is many-to-one (`c_byte` and `c_ubyte` both become
//! `uint8`, `c_int` and `c_int32` both become `int32` on common hosts), so the
//! reverse direction has to choose. Which tag wins is controlled by
//! [`ReversePolicy`]:
//!
//! - `Canonical` picks the standard fixed-width tag for each internal type
//!   (`int32 → c_int32`, `uint8 → c_uint8`, `float64 → c_double`, ...).
//! - `LastInserted` is the plain inversion of the forward table: for every
//!   internal type the tag inserted last wins. The result depends on
//!   insertion order and on host widths.
//!
//! Pointer-valued forward entries (`c_char_p`, `c_wchar_p`) never enter the
//! reverse map; pointer types always convert back recursively.

use super::InternalType;
use crate::config::ReversePolicy;
use crate::native::NativeTypeTag;
use std::collections::HashMap;
use std::sync::Arc;

lazy_static::lazy_static! {
    /// Builtin table with canonical reverse entries
    static ref BUILTIN_CANONICAL: Arc<ScalarTypeTable> =
        Arc::new(ScalarTypeTable::builtin(ReversePolicy::Canonical));

    /// Builtin table with insertion-order reverse entries
    static ref BUILTIN_LAST_INSERTED: Arc<ScalarTypeTable> =
        Arc::new(ScalarTypeTable::builtin(ReversePolicy::LastInserted));
}

/// Canonical native tag for each internal scalar type
const CANONICAL: [(InternalType, NativeTypeTag); 14] = [
    (InternalType::Bool, NativeTypeTag::Bool),
    (InternalType::I8, NativeTypeTag::Int8),
    (InternalType::I16, NativeTypeTag::Int16),
    (InternalType::I32, NativeTypeTag::Int32),
    (InternalType::I64, NativeTypeTag::Int64),
    (InternalType::U8, NativeTypeTag::UInt8),
    (InternalType::U16, NativeTypeTag::UInt16),
    (InternalType::U32, NativeTypeTag::UInt32),
    (InternalType::U64, NativeTypeTag::UInt64),
    (InternalType::F32, NativeTypeTag::Float),
    (InternalType::F64, NativeTypeTag::Double),
    (InternalType::LongDouble, NativeTypeTag::LongDouble),
    (InternalType::VoidPtr, NativeTypeTag::VoidP),
    (InternalType::ForcedObject, NativeTypeTag::Object),
];

/// Bidirectional scalar map
#[derive(Debug, Clone)]
pub struct ScalarTypeTable {
    /// Forward entries in insertion order
    entries: Vec<(NativeTypeTag, InternalType)>,
    /// Forward lookup
    forward: HashMap<NativeTypeTag, InternalType>,
    /// Reverse lookup, scalars only
    reverse: HashMap<InternalType, NativeTypeTag>,
    policy: ReversePolicy,
}

impl ScalarTypeTable {
    /// Shared builtin table for a reverse policy
    pub fn shared(policy: ReversePolicy) -> Arc<ScalarTypeTable> {
        match policy {
            ReversePolicy::Canonical => Arc::clone(&BUILTIN_CANONICAL),
            ReversePolicy::LastInserted => Arc::clone(&BUILTIN_LAST_INSERTED),
        }
    }

    /// Build the builtin table
    ///
    /// Platform-dependent integer tags map to the fixed-width type of their
    /// measured width. `c_ssize_t`, `c_size_t` and `c_wchar` map to the
    /// *unsigned* type of their width.
    pub fn builtin(policy: ReversePolicy) -> Self {
        use NativeTypeTag as T;

        let signed = |tag: NativeTypeTag| InternalType::integer(tag.size(), true);
        let unsigned = |tag: NativeTypeTag| InternalType::integer(tag.size(), false);

        let candidates: Vec<(NativeTypeTag, Option<InternalType>)> = vec![
            (T::Bool, Some(InternalType::Bool)),
            (T::Int, signed(T::Int)),
            (T::Int8, Some(InternalType::I8)),
            (T::Int16, Some(InternalType::I16)),
            (T::Int32, Some(InternalType::I32)),
            (T::Int64, Some(InternalType::I64)),
            (T::UInt, unsigned(T::UInt)),
            (T::UInt8, Some(InternalType::U8)),
            (T::UInt16, Some(InternalType::U16)),
            (T::UInt32, Some(InternalType::U32)),
            (T::UInt64, Some(InternalType::U64)),
            (T::Float, Some(InternalType::F32)),
            (T::Double, Some(InternalType::F64)),
            (T::LongDouble, Some(InternalType::LongDouble)),
            (T::UByte, Some(InternalType::U8)),
            (T::Byte, Some(InternalType::U8)),
            (T::Short, signed(T::Short)),
            (T::UShort, unsigned(T::UShort)),
            (T::Long, signed(T::Long)),
            (T::LongLong, signed(T::LongLong)),
            (T::ULong, unsigned(T::ULong)),
            (T::ULongLong, unsigned(T::ULongLong)),
            (T::SSize, unsigned(T::SSize)),
            (T::Size, unsigned(T::Size)),
            (T::Char, Some(InternalType::I8)),
            (T::CharP, Some(InternalType::pointer_to(InternalType::I8))),
            (T::WChar, unsigned(T::WChar)),
            (T::WCharP, unsigned(T::WChar).map(InternalType::pointer_to)),
            (T::VoidP, Some(InternalType::VoidPtr)),
            (T::Object, Some(InternalType::ForcedObject)),
        ];

        let mut table = ScalarTypeTable {
            entries: Vec::with_capacity(candidates.len()),
            forward: HashMap::new(),
            reverse: HashMap::new(),
            policy,
        };
        for (tag, ty) in candidates {
            match ty {
                Some(ty) => table.push(tag, ty),
                None => tracing::warn!(
                    "no fixed-width internal type for {} ({} bytes); leaving it unmapped",
                    tag,
                    tag.size()
                ),
            }
        }
        table.rebuild_reverse();
        table
    }

    fn push(&mut self, tag: NativeTypeTag, ty: InternalType) {
        if let Some(slot) = self.entries.iter_mut().find(|(t, _)| *t == tag) {
            slot.1 = ty.clone();
        } else {
            self.entries.push((tag, ty.clone()));
        }
        self.forward.insert(tag, ty);
    }

    fn rebuild_reverse(&mut self) {
        self.reverse.clear();
        for (tag, ty) in &self.entries {
            if matches!(ty, InternalType::CPointer(_)) {
                continue;
            }
            self.reverse.insert(ty.clone(), *tag);
        }
        if self.policy == ReversePolicy::Canonical {
            for (ty, tag) in CANONICAL.iter() {
                if self.forward.get(tag) == Some(ty) {
                    self.reverse.insert(ty.clone(), *tag);
                }
            }
        }
    }

    /// Add or replace a forward entry (the reverse map is rebuilt)
    pub fn register(&mut self, tag: NativeTypeTag, ty: InternalType) {
        tracing::debug!("scalar table: {} -> {}", tag, ty);
        self.push(tag, ty);
        self.rebuild_reverse();
    }

    /// Internal type for a native tag
    pub fn from_native(&self, tag: NativeTypeTag) -> Option<&InternalType> {
        self.forward.get(&tag)
    }

    /// Native tag for an internal scalar type
    pub fn to_native(&self, ty: &InternalType) -> Option<NativeTypeTag> {
        self.reverse.get(ty).copied()
    }

    /// Forward entries in insertion order
    pub fn entries(&self) -> &[(NativeTypeTag, InternalType)] {
        &self.entries
    }

    /// Number of mapped native tags
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no tag is mapped
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reverse policy in effect
    pub fn policy(&self) -> ReversePolicy {
        self.policy
    }
}
