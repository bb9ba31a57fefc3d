//! Callable types for foreign function pointers

use super::{InternalType, TypeBridge};
use crate::config::Platform;
use crate::error::{Error, Result};
use crate::native::{FuncFlags, ForeignFunctionPtr};
use std::fmt;

/// Calling convention tag of a callable type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CallingConvention {
    /// The platform's C convention
    #[default]
    Default,
    /// x86 stdcall (callee cleans the stack)
    StdCall,
}

impl fmt::Display for CallingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallingConvention::Default => write!(f, "ccc"),
            CallingConvention::StdCall => write!(f, "x86_stdcallcc"),
        }
    }
}

/// Return and argument types of a callable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Return type (`none` for void)
    pub ret: InternalType,
    /// Argument types in order
    pub args: Vec<InternalType>,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, a) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", a)?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

/// Callable type of an external function pointer
#[derive(Clone)]
pub struct FunctionPointerType {
    /// Signature
    pub signature: Signature,
    /// Calling convention
    pub cconv: CallingConvention,
    /// Resolves the callable address; invoked by the code generator when it emits the call
    pub get_pointer: fn(&ForeignFunctionPtr) -> usize,
}

impl FunctionPointerType {
    /// Derive the callable type of a foreign function pointer
    ///
    /// Fails with `MissingArgumentTypes` if the pointer declares no argument
    /// types; argument and return resolution errors propagate unchanged.
    pub fn derive(
        fnptr: &ForeignFunctionPtr,
        bridge: &TypeBridge,
        platform: Platform,
    ) -> Result<Self> {
        let argtypes = fnptr
            .argtypes
            .as_ref()
            .ok_or_else(|| Error::MissingArgumentTypes {
                name: fnptr.name.clone(),
            })?;

        let args = argtypes
            .iter()
            .map(|a| bridge.resolve_from_native(a))
            .collect::<Result<Vec<_>>>()?;
        let ret = bridge.resolve_from_native(&fnptr.restype)?;

        let cconv = if platform.stdcall_significant() && !fnptr.flags.contains(FuncFlags::CDECL) {
            CallingConvention::StdCall
        } else {
            CallingConvention::Default
        };

        Ok(FunctionPointerType {
            signature: Signature { ret, args },
            cconv,
            get_pointer,
        })
    }

    /// Resolve the callable address of `fnptr`
    pub fn address_of(&self, fnptr: &ForeignFunctionPtr) -> usize {
        (self.get_pointer)(fnptr)
    }
}

impl fmt::Debug for FunctionPointerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionPointerType")
            .field("signature", &self.signature)
            .field("cconv", &self.cconv)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for FunctionPointerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExternalFunctionPointer({}", self.signature)?;
        if self.cconv != CallingConvention::Default {
            write!(f, ", cconv={}", self.cconv)?;
        }
        write!(f, ")")
    }
}

/// Address of the underlying function as an integer
pub fn get_pointer(fnptr: &ForeignFunctionPtr) -> usize {
    fnptr.address
}
