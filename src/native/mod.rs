//! # Native Type Model
//!
//! The foreign side of the bridge: the vocabulary a native type description
//! system uses to describe values with an explicit memory layout.
//!
//! Every foreign type is classified **once**, at the boundary, into a
//! [`NativeType`]:
//!
//! - [`NativeType::Void`] - no type (the return type of a `void` function)
//! - [`NativeType::Scalar`] - a fixed-width scalar, identified by a [`NativeTypeTag`]
//! - [`NativeType::Pointer`] - pointer-to another native type
//! - [`NativeType::Record`] - a record class with declared fields
//!
//! Resolution then matches on the variant; nothing probes for attributes.
//!
//! ## Widths
//!
//! Platform-dependent tags (`c_int`, `c_long`, `size_t`, `wchar_t`, ...) report
//! the width measured on the host through [`core::ffi`] types, so the scalar
//! table built from them selects the matching fixed-width internal type.

pub mod function;
pub mod layout;
pub mod record;

pub use function::{FuncFlags, ForeignFunctionPtr};
pub use layout::{FieldLayout, RecordLayout};
pub use record::{ClassId, FieldDecl, RecordClass};

use std::ffi::{c_char, c_int, c_long, c_longlong, c_short, c_uint, c_ulong, c_ulonglong, c_ushort};
use std::fmt;
use std::mem::{align_of, size_of};
use std::sync::Arc;

/// Native scalar type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NativeTypeTag {
    /// `_Bool`
    Bool,
    /// `int`
    Int,
    /// `int8_t`
    Int8,
    /// `int16_t`
    Int16,
    /// `int32_t`
    Int32,
    /// `int64_t`
    Int64,
    /// `unsigned int`
    UInt,
    /// `uint8_t`
    UInt8,
    /// `uint16_t`
    UInt16,
    /// `uint32_t`
    UInt32,
    /// `uint64_t`
    UInt64,
    /// `float`
    Float,
    /// `double`
    Double,
    /// `long double` (extended precision where the platform has it)
    LongDouble,
    /// `unsigned char` used as a byte
    UByte,
    /// `signed char` used as a byte
    Byte,
    /// `short`
    Short,
    /// `unsigned short`
    UShort,
    /// `long`
    Long,
    /// `long long`
    LongLong,
    /// `unsigned long`
    ULong,
    /// `unsigned long long`
    ULongLong,
    /// `ssize_t`
    SSize,
    /// `size_t`
    Size,
    /// `char`
    Char,
    /// `char *` (NUL-terminated string)
    CharP,
    /// `wchar_t`
    WChar,
    /// `wchar_t *`
    WCharP,
    /// `void *`
    VoidP,
    /// Reference to a foreign-runtime object
    Object,
    /// Windows `HRESULT` (no builtin mapping)
    HResult,
}

/// `long double` width; there is no `core::ffi` type for it
const LONG_DOUBLE_SIZE: usize = if cfg!(windows)
    || cfg!(all(target_vendor = "apple", target_arch = "aarch64"))
{
    8
} else if cfg!(target_arch = "x86") {
    12
} else if cfg!(any(
    target_arch = "x86_64",
    target_arch = "aarch64",
    target_arch = "riscv64",
    target_arch = "powerpc64",
    target_arch = "s390x"
)) {
    16
} else {
    8
};

const LONG_DOUBLE_ALIGN: usize = match LONG_DOUBLE_SIZE {
    16 => 16,
    12 => 4,
    _ => 8,
};

#[cfg(windows)]
type WcharT = u16;
#[cfg(not(windows))]
type WcharT = i32;

impl NativeTypeTag {
    /// Every tag, in declaration order
    pub const ALL: [NativeTypeTag; 31] = [
        NativeTypeTag::Bool,
        NativeTypeTag::Int,
        NativeTypeTag::Int8,
        NativeTypeTag::Int16,
        NativeTypeTag::Int32,
        NativeTypeTag::Int64,
        NativeTypeTag::UInt,
        NativeTypeTag::UInt8,
        NativeTypeTag::UInt16,
        NativeTypeTag::UInt32,
        NativeTypeTag::UInt64,
        NativeTypeTag::Float,
        NativeTypeTag::Double,
        NativeTypeTag::LongDouble,
        NativeTypeTag::UByte,
        NativeTypeTag::Byte,
        NativeTypeTag::Short,
        NativeTypeTag::UShort,
        NativeTypeTag::Long,
        NativeTypeTag::LongLong,
        NativeTypeTag::ULong,
        NativeTypeTag::ULongLong,
        NativeTypeTag::SSize,
        NativeTypeTag::Size,
        NativeTypeTag::Char,
        NativeTypeTag::CharP,
        NativeTypeTag::WChar,
        NativeTypeTag::WCharP,
        NativeTypeTag::VoidP,
        NativeTypeTag::Object,
        NativeTypeTag::HResult,
    ];

    /// Size in bytes on the host
    pub fn size(&self) -> usize {
        self.size_align().0
    }

    /// Alignment in bytes on the host
    pub fn align(&self) -> usize {
        self.size_align().1
    }

    fn size_align(&self) -> (usize, usize) {
        macro_rules! of {
            ($t:ty) => {
                (size_of::<$t>(), align_of::<$t>())
            };
        }
        match self {
            NativeTypeTag::Bool => of!(bool),
            NativeTypeTag::Int => of!(c_int),
            NativeTypeTag::Int8 => of!(i8),
            NativeTypeTag::Int16 => of!(i16),
            NativeTypeTag::Int32 => of!(i32),
            NativeTypeTag::Int64 => of!(i64),
            NativeTypeTag::UInt => of!(c_uint),
            NativeTypeTag::UInt8 => of!(u8),
            NativeTypeTag::UInt16 => of!(u16),
            NativeTypeTag::UInt32 => of!(u32),
            NativeTypeTag::UInt64 => of!(u64),
            NativeTypeTag::Float => of!(f32),
            NativeTypeTag::Double => of!(f64),
            NativeTypeTag::LongDouble => (LONG_DOUBLE_SIZE, LONG_DOUBLE_ALIGN),
            NativeTypeTag::UByte => of!(u8),
            NativeTypeTag::Byte => of!(i8),
            NativeTypeTag::Short => of!(c_short),
            NativeTypeTag::UShort => of!(c_ushort),
            NativeTypeTag::Long => of!(c_long),
            NativeTypeTag::LongLong => of!(c_longlong),
            NativeTypeTag::ULong => of!(c_ulong),
            NativeTypeTag::ULongLong => of!(c_ulonglong),
            NativeTypeTag::SSize => of!(isize),
            NativeTypeTag::Size => of!(usize),
            NativeTypeTag::Char => of!(c_char),
            NativeTypeTag::CharP => of!(*const c_char),
            NativeTypeTag::WChar => of!(WcharT),
            NativeTypeTag::WCharP => of!(*const WcharT),
            NativeTypeTag::VoidP => of!(*const u8),
            NativeTypeTag::Object => of!(*const u8),
            NativeTypeTag::HResult => of!(i32),
        }
    }

    /// Returns true for integer-valued tags (characters and bytes included)
    pub fn is_integer(&self) -> bool {
        !matches!(
            self,
            NativeTypeTag::Bool
                | NativeTypeTag::Float
                | NativeTypeTag::Double
                | NativeTypeTag::LongDouble
                | NativeTypeTag::CharP
                | NativeTypeTag::WCharP
                | NativeTypeTag::VoidP
                | NativeTypeTag::Object
        )
    }

    /// Returns true for signed integer tags
    ///
    /// `Char` counts as signed, `WChar` as unsigned (it is treated as a code unit).
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            NativeTypeTag::Int
                | NativeTypeTag::Int8
                | NativeTypeTag::Int16
                | NativeTypeTag::Int32
                | NativeTypeTag::Int64
                | NativeTypeTag::Byte
                | NativeTypeTag::Short
                | NativeTypeTag::Long
                | NativeTypeTag::LongLong
                | NativeTypeTag::SSize
                | NativeTypeTag::Char
                | NativeTypeTag::HResult
        )
    }

    /// C-style name of the tag
    pub fn name(&self) -> &'static str {
        match self {
            NativeTypeTag::Bool => "c_bool",
            NativeTypeTag::Int => "c_int",
            NativeTypeTag::Int8 => "c_int8",
            NativeTypeTag::Int16 => "c_int16",
            NativeTypeTag::Int32 => "c_int32",
            NativeTypeTag::Int64 => "c_int64",
            NativeTypeTag::UInt => "c_uint",
            NativeTypeTag::UInt8 => "c_uint8",
            NativeTypeTag::UInt16 => "c_uint16",
            NativeTypeTag::UInt32 => "c_uint32",
            NativeTypeTag::UInt64 => "c_uint64",
            NativeTypeTag::Float => "c_float",
            NativeTypeTag::Double => "c_double",
            NativeTypeTag::LongDouble => "c_longdouble",
            NativeTypeTag::UByte => "c_ubyte",
            NativeTypeTag::Byte => "c_byte",
            NativeTypeTag::Short => "c_short",
            NativeTypeTag::UShort => "c_ushort",
            NativeTypeTag::Long => "c_long",
            NativeTypeTag::LongLong => "c_longlong",
            NativeTypeTag::ULong => "c_ulong",
            NativeTypeTag::ULongLong => "c_ulonglong",
            NativeTypeTag::SSize => "c_ssize_t",
            NativeTypeTag::Size => "c_size_t",
            NativeTypeTag::Char => "c_char",
            NativeTypeTag::CharP => "c_char_p",
            NativeTypeTag::WChar => "c_wchar",
            NativeTypeTag::WCharP => "c_wchar_p",
            NativeTypeTag::VoidP => "c_void_p",
            NativeTypeTag::Object => "py_object",
            NativeTypeTag::HResult => "HRESULT",
        }
    }
}

impl fmt::Display for NativeTypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A classified native type
#[derive(Debug, Clone)]
pub enum NativeType {
    /// No type (void return, absent restype)
    Void,
    /// Fixed-width scalar
    Scalar(NativeTypeTag),
    /// Pointer to another native type
    Pointer(Box<NativeType>),
    /// Record class with declared fields
    Record(Arc<RecordClass>),
}

impl NativeType {
    /// Pointer-to constructor
    pub fn pointer_to(pointee: NativeType) -> Self {
        NativeType::Pointer(Box::new(pointee))
    }

    /// Returns true for [`NativeType::Void`]
    pub fn is_void(&self) -> bool {
        matches!(self, NativeType::Void)
    }

    /// Strip every pointer layer, returning the innermost pointee
    pub fn peel_pointers(&self) -> &NativeType {
        let mut ty = self;
        while let NativeType::Pointer(inner) = ty {
            ty = inner;
        }
        ty
    }

    /// Size and alignment in bytes (`None` for void or an incomplete record)
    pub fn size_align(&self) -> Option<(usize, usize)> {
        match self {
            NativeType::Void => None,
            NativeType::Scalar(tag) => Some((tag.size(), tag.align())),
            NativeType::Pointer(_) => Some((size_of::<*const u8>(), align_of::<*const u8>())),
            NativeType::Record(class) => class.layout().map(|l| (l.size, l.align)),
        }
    }
}

impl PartialEq for NativeType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NativeType::Void, NativeType::Void) => true,
            (NativeType::Scalar(a), NativeType::Scalar(b)) => a == b,
            (NativeType::Pointer(a), NativeType::Pointer(b)) => a == b,
            (NativeType::Record(a), NativeType::Record(b)) => a.id() == b.id(),
            _ => false,
        }
    }
}

impl Eq for NativeType {}

impl From<NativeTypeTag> for NativeType {
    fn from(tag: NativeTypeTag) -> Self {
        NativeType::Scalar(tag)
    }
}

impl From<Arc<RecordClass>> for NativeType {
    fn from(class: Arc<RecordClass>) -> Self {
        NativeType::Record(class)
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeType::Void => write!(f, "void"),
            NativeType::Scalar(tag) => write!(f, "{}", tag),
            NativeType::Pointer(inner) => write!(f, "POINTER({})", inner),
            NativeType::Record(class) => write!(f, "{}", class.name()),
        }
    }
}
