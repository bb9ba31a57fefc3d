//! Foreign function pointers

use super::NativeType;
use std::fmt;

/// Function pointer flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FuncFlags(u32);

impl FuncFlags {
    /// Uses the C (cdecl) calling convention
    pub const CDECL: FuncFlags = FuncFlags(0x1);
    /// Holds the foreign runtime's interpreter lock during the call
    pub const RUNTIME_API: FuncFlags = FuncFlags(0x2);
    /// Saves and restores `errno` around the call
    pub const USE_ERRNO: FuncFlags = FuncFlags(0x8);
    /// Saves and restores the last OS error around the call
    pub const USE_LASTERROR: FuncFlags = FuncFlags(0x10);

    /// No flags (stdcall on platforms that distinguish it)
    pub const fn empty() -> Self {
        FuncFlags(0)
    }

    /// Raw bits
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Returns true if every bit of `other` is set
    pub const fn contains(&self, other: FuncFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for FuncFlags {
    type Output = FuncFlags;

    fn bitor(self, rhs: FuncFlags) -> FuncFlags {
        FuncFlags(self.0 | rhs.0)
    }
}

/// A foreign function pointer with its declared signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignFunctionPtr {
    /// Symbol name, for diagnostics
    pub name: String,
    /// Callable address
    pub address: usize,
    /// Declared argument types (`None` when never declared)
    pub argtypes: Option<Vec<NativeType>>,
    /// Declared return type
    pub restype: NativeType,
    /// Calling convention and call-time flags
    pub flags: FuncFlags,
}

impl ForeignFunctionPtr {
    /// A cdecl function pointer with no declared argument types and an `int` result
    pub fn new(name: impl Into<String>, address: usize) -> Self {
        ForeignFunctionPtr {
            name: name.into(),
            address,
            argtypes: None,
            restype: NativeType::Scalar(super::NativeTypeTag::Int),
            flags: FuncFlags::CDECL,
        }
    }

    /// Declare argument types
    pub fn with_argtypes(mut self, argtypes: Vec<NativeType>) -> Self {
        self.argtypes = Some(argtypes);
        self
    }

    /// Declare the return type
    pub fn with_restype(mut self, restype: NativeType) -> Self {
        self.restype = restype;
        self
    }

    /// Replace the flags
    pub fn with_flags(mut self, flags: FuncFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Returns true if the pointer has an address and declares its argument types
    pub fn is_typed(&self) -> bool {
        self.address != 0 && self.argtypes.is_some()
    }
}

impl fmt::Display for ForeignFunctionPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        match &self.argtypes {
            Some(args) => {
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", a)?;
                }
            }
            None => write!(f, "...")?,
        }
        write!(f, ") -> {}", self.restype)
    }
}
