//! # Internal Type Descriptors
//!
//! The compiler-side vocabulary of the bridge. An [`InternalType`] is what type
//! checking and code generation see; the submodules translate the native
//! vocabulary ([`crate::native`]) into it and back:
//!
//! - [`scalar_table`] - static bidirectional scalar map
//! - [`bridge`] - recursive native ⇄ internal resolver
//! - [`composite`] - record descriptors synthesized from foreign classes, cached by identity
//! - [`function`] - callable types derived from foreign function pointers
//!
//! ## Identity
//!
//! Scalars and pointers compare structurally. [`InternalType::Record`] and
//! [`InternalType::FunctionPointer`] compare **by identity**: two descriptors
//! derived from different foreign classes are different types even if their
//! fields match, and the same foreign class always yields the same `Arc`.
//! Code generators may key caches on these types directly.

pub mod bridge;
pub mod composite;
pub mod function;
pub mod scalar_table;

pub use bridge::TypeBridge;
pub use composite::{CompositeTypeCache, RecordDescriptor, RecordFieldSpec};
pub use function::{CallingConvention, FunctionPointerType, Signature};
pub use scalar_table::ScalarTypeTable;

use crate::native::NativeTypeTag;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem::{align_of, size_of};
use std::sync::Arc;

/// Internal type descriptor
#[derive(Debug, Clone)]
pub enum InternalType {
    // === Unit ===
    /// No value (void return)
    None,

    // === Scalars ===
    /// Boolean
    Bool,
    /// Signed 8-bit integer
    I8,
    /// Signed 16-bit integer
    I16,
    /// Signed 32-bit integer
    I32,
    /// Signed 64-bit integer
    I64,
    /// Unsigned 8-bit integer
    U8,
    /// Unsigned 16-bit integer
    U16,
    /// Unsigned 32-bit integer
    U32,
    /// Unsigned 64-bit integer
    U64,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
    /// Platform extended-precision float
    LongDouble,
    /// Untyped pointer
    VoidPtr,
    /// Opaque handle to a foreign-runtime object, passed through untouched
    ForcedObject,

    // === Composites ===
    /// Pointer to a value of the inner type
    CPointer(Box<InternalType>),
    /// Foreign value whose concrete layout is not known yet
    OpaqueForeign,
    /// Fixed-layout record (identity-compared)
    Record(Arc<RecordDescriptor>),
    /// External function pointer (identity-compared)
    FunctionPointer(Arc<FunctionPointerType>),
}

impl InternalType {
    /// Fixed-width integer of the given byte width and signedness
    pub fn integer(bytes: usize, signed: bool) -> Option<InternalType> {
        match (bytes, signed) {
            (1, true) => Some(InternalType::I8),
            (2, true) => Some(InternalType::I16),
            (4, true) => Some(InternalType::I32),
            (8, true) => Some(InternalType::I64),
            (1, false) => Some(InternalType::U8),
            (2, false) => Some(InternalType::U16),
            (4, false) => Some(InternalType::U32),
            (8, false) => Some(InternalType::U64),
            _ => None,
        }
    }

    /// Pointer-to constructor
    pub fn pointer_to(inner: InternalType) -> Self {
        InternalType::CPointer(Box::new(inner))
    }

    /// Check if this type is an integer type
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            InternalType::I8
                | InternalType::I16
                | InternalType::I32
                | InternalType::I64
                | InternalType::U8
                | InternalType::U16
                | InternalType::U32
                | InternalType::U64
        )
    }

    /// Check if this type is a signed integer
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            InternalType::I8 | InternalType::I16 | InternalType::I32 | InternalType::I64
        )
    }

    /// Check if this type is a record or the opaque foreign base
    pub fn is_composite(&self) -> bool {
        matches!(self, InternalType::Record(_) | InternalType::OpaqueForeign)
    }

    /// Get the inner type for pointer types
    pub fn pointee(&self) -> Option<&InternalType> {
        match self {
            InternalType::CPointer(t) => Some(t),
            _ => None,
        }
    }

    /// Record descriptor, for record types
    pub fn as_record(&self) -> Option<&Arc<RecordDescriptor>> {
        match self {
            InternalType::Record(desc) => Some(desc),
            _ => None,
        }
    }

    /// Size in bytes of the in-memory representation
    pub fn size_bytes(&self) -> Option<usize> {
        self.size_align().map(|(size, _)| size)
    }

    /// Size and alignment of the in-memory representation
    pub fn size_align(&self) -> Option<(usize, usize)> {
        macro_rules! of {
            ($t:ty) => {
                Some((size_of::<$t>(), align_of::<$t>()))
            };
        }
        match self {
            InternalType::None | InternalType::OpaqueForeign => None,
            InternalType::Bool => of!(bool),
            InternalType::I8 => of!(i8),
            InternalType::I16 => of!(i16),
            InternalType::I32 => of!(i32),
            InternalType::I64 => of!(i64),
            InternalType::U8 => of!(u8),
            InternalType::U16 => of!(u16),
            InternalType::U32 => of!(u32),
            InternalType::U64 => of!(u64),
            InternalType::F32 => of!(f32),
            InternalType::F64 => of!(f64),
            InternalType::LongDouble => Some((
                NativeTypeTag::LongDouble.size(),
                NativeTypeTag::LongDouble.align(),
            )),
            InternalType::VoidPtr
            | InternalType::ForcedObject
            | InternalType::CPointer(_)
            | InternalType::FunctionPointer(_) => of!(*const u8),
            InternalType::Record(desc) => Some((desc.layout().size, desc.layout().align)),
        }
    }
}

impl PartialEq for InternalType {
    fn eq(&self, other: &Self) -> bool {
        use InternalType::*;
        match (self, other) {
            (CPointer(a), CPointer(b)) => a == b,
            (Record(a), Record(b)) => Arc::ptr_eq(a, b),
            (FunctionPointer(a), FunctionPointer(b)) => Arc::ptr_eq(a, b),
            (CPointer(_), _) | (Record(_), _) | (FunctionPointer(_), _) => false,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl Eq for InternalType {}

impl Hash for InternalType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            InternalType::CPointer(inner) => inner.hash(state),
            InternalType::Record(desc) => (Arc::as_ptr(desc) as usize).hash(state),
            InternalType::FunctionPointer(f) => (Arc::as_ptr(f) as usize).hash(state),
            _ => {}
        }
    }
}

impl fmt::Display for InternalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InternalType::None => write!(f, "none"),
            InternalType::Bool => write!(f, "bool"),
            InternalType::I8 => write!(f, "int8"),
            InternalType::I16 => write!(f, "int16"),
            InternalType::I32 => write!(f, "int32"),
            InternalType::I64 => write!(f, "int64"),
            InternalType::U8 => write!(f, "uint8"),
            InternalType::U16 => write!(f, "uint16"),
            InternalType::U32 => write!(f, "uint32"),
            InternalType::U64 => write!(f, "uint64"),
            InternalType::F32 => write!(f, "float32"),
            InternalType::F64 => write!(f, "float64"),
            InternalType::LongDouble => write!(f, "longdouble"),
            InternalType::VoidPtr => write!(f, "void*"),
            InternalType::ForcedObject => write!(f, "ffi_forced_object"),
            InternalType::CPointer(inner) => write!(f, "{}*", inner),
            InternalType::OpaqueForeign => write!(f, "_CData"),
            InternalType::Record(desc) => write!(f, "{}", desc),
            InternalType::FunctionPointer(fnty) => write!(f, "{}", fnty),
        }
    }
}
