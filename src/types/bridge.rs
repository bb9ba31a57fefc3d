//! # Type Bridge: Native Types ⇄ Internal Types
//!
//! This module provides the recursive translation between:
//! - **Native Types** (`native::NativeType`): what a foreign library declares
//!   - `c_int`, `c_double`, `POINTER(c_char)`, `void`
//! - **Internal Types** (`types::InternalType`): what the compiler generates code for
//!   - `int32`, `float64`, `int8*`, `none`
//!
//! ## Rules
//!
//! | Native | Internal |
//! |--------|----------|
//! | `void` | `none` |
//! | scalar tag | scalar table entry |
//! | `POINTER(T)` | `CPointer(resolve(T))` |
//! | record class | not a scalar; see [`super::composite`] |
//!
//! A pointer whose pointee cannot be resolved is itself unsupported; there is
//! no fallback to an opaque pointer.
//!
//! ## Usage
//!
//! ```rust
//! use native_bridge::native::{NativeType, NativeTypeTag};
//! use native_bridge::types::{InternalType, TypeBridge};
//!
//! let bridge = TypeBridge::default();
//! let ty = bridge
//!     .resolve_from_native(&NativeType::pointer_to(NativeTypeTag::Double.into()))
//!     .unwrap();
//! assert_eq!(ty, InternalType::pointer_to(InternalType::F64));
//! ```

use super::{InternalType, ScalarTypeTable};
use crate::config::ReversePolicy;
use crate::error::{Error, Result};
use crate::native::NativeType;
use std::sync::Arc;

/// Resolver between native and internal types
#[derive(Debug, Clone)]
pub struct TypeBridge {
    scalars: Arc<ScalarTypeTable>,
}

impl TypeBridge {
    /// Creates a bridge over the given scalar table
    pub fn new(scalars: Arc<ScalarTypeTable>) -> Self {
        TypeBridge { scalars }
    }

    /// Bridge over the shared builtin table for a reverse policy
    pub fn with_policy(policy: ReversePolicy) -> Self {
        Self::new(ScalarTypeTable::shared(policy))
    }

    /// The scalar table in use
    pub fn scalars(&self) -> &ScalarTypeTable {
        &self.scalars
    }

    /// Mutable access to the scalar table (copied on first write if shared)
    pub fn scalars_mut(&mut self) -> &mut ScalarTypeTable {
        Arc::make_mut(&mut self.scalars)
    }

    // =========================================================================
    // NATIVE → INTERNAL
    // =========================================================================

    /// Convert a native type to an internal type
    pub fn resolve_from_native(&self, native: &NativeType) -> Result<InternalType> {
        if native.is_void() {
            // restype of a void-returning function
            return Ok(InternalType::None);
        }
        self.convert_from(native)
            .ok_or_else(|| Error::unsupported_native(native))
    }

    fn convert_from(&self, native: &NativeType) -> Option<InternalType> {
        match native {
            NativeType::Scalar(tag) => self.scalars.from_native(*tag).cloned(),
            NativeType::Pointer(inner) => self.convert_from(inner).map(InternalType::pointer_to),
            // `void` below a pointer has no scalar mapping; use c_void_p instead
            NativeType::Void => None,
            NativeType::Record(_) => None,
        }
    }

    // =========================================================================
    // INTERNAL → NATIVE
    // =========================================================================

    /// Convert an internal type to a native type
    pub fn resolve_to_native(&self, ty: &InternalType) -> Result<NativeType> {
        if *ty == InternalType::None {
            return Ok(NativeType::Void);
        }
        self.convert_to(ty)
            .ok_or_else(|| Error::unsupported_internal(ty))
    }

    fn convert_to(&self, ty: &InternalType) -> Option<NativeType> {
        match ty {
            InternalType::CPointer(inner) => self.convert_to(inner).map(NativeType::pointer_to),
            _ => self.scalars.to_native(ty).map(NativeType::Scalar),
        }
    }
}

impl Default for TypeBridge {
    fn default() -> Self {
        Self::with_policy(ReversePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{NativeTypeTag, RecordClass};

    #[test]
    fn test_scalar_conversion() {
        let bridge = TypeBridge::default();
        assert_eq!(
            bridge
                .resolve_from_native(&NativeTypeTag::UInt32.into())
                .unwrap(),
            InternalType::U32
        );
        assert_eq!(
            bridge.resolve_from_native(&NativeTypeTag::Bool.into()).unwrap(),
            InternalType::Bool
        );
    }

    #[test]
    fn test_void_is_none() {
        let bridge = TypeBridge::default();
        assert_eq!(
            bridge.resolve_from_native(&NativeType::Void).unwrap(),
            InternalType::None
        );
        assert_eq!(
            bridge.resolve_to_native(&InternalType::None).unwrap(),
            NativeType::Void
        );
    }

    #[test]
    fn test_pointer_conversion() {
        let bridge = TypeBridge::default();
        let ptr = NativeType::pointer_to(NativeType::pointer_to(NativeTypeTag::Int16.into()));
        assert_eq!(
            bridge.resolve_from_native(&ptr).unwrap(),
            InternalType::pointer_to(InternalType::pointer_to(InternalType::I16))
        );
    }

    #[test]
    fn test_pointer_to_unsupported_fails_whole() {
        let bridge = TypeBridge::default();
        let ptr = NativeType::pointer_to(NativeTypeTag::HResult.into());
        match bridge.resolve_from_native(&ptr) {
            Err(Error::UnsupportedNativeType { ty }) => assert_eq!(ty, "POINTER(HRESULT)"),
            other => panic!("Expected UnsupportedNativeType, got {:?}", other),
        }
    }

    #[test]
    fn test_pointer_to_void_is_unsupported() {
        let bridge = TypeBridge::default();
        assert!(bridge
            .resolve_from_native(&NativeType::pointer_to(NativeType::Void))
            .is_err());
    }

    #[test]
    fn test_record_is_not_a_scalar() {
        let bridge = TypeBridge::default();
        let class = RecordClass::new("Empty", vec![]);
        assert!(matches!(
            bridge.resolve_from_native(&NativeType::Record(class)),
            Err(Error::UnsupportedNativeType { .. })
        ));
    }

    #[test]
    fn test_to_native_roundtrip() {
        let bridge = TypeBridge::default();

        let back = bridge.resolve_to_native(&InternalType::U32).unwrap();
        match back {
            NativeType::Scalar(tag) => {
                assert_eq!(tag.size(), 4);
                assert!(!tag.is_signed());
            }
            other => panic!("Expected scalar, got {}", other),
        }

        let ptr = InternalType::pointer_to(InternalType::F32);
        assert_eq!(
            bridge.resolve_to_native(&ptr).unwrap(),
            NativeType::pointer_to(NativeTypeTag::Float.into())
        );
    }

    #[test]
    fn test_to_native_unsupported() {
        let bridge = TypeBridge::default();
        assert!(matches!(
            bridge.resolve_to_native(&InternalType::OpaqueForeign),
            Err(Error::UnsupportedInternalType { .. })
        ));
        assert!(matches!(
            bridge.resolve_to_native(&InternalType::pointer_to(InternalType::OpaqueForeign)),
            Err(Error::UnsupportedInternalType { .. })
        ));
    }

    #[test]
    fn test_registered_scalar_copies_on_write() {
        let mut bridge = TypeBridge::default();
        let pristine = TypeBridge::default();
        bridge
            .scalars_mut()
            .register(NativeTypeTag::HResult, InternalType::I32);

        assert_eq!(
            bridge
                .resolve_from_native(&NativeTypeTag::HResult.into())
                .unwrap(),
            InternalType::I32
        );
        assert!(pristine
            .resolve_from_native(&NativeTypeTag::HResult.into())
            .is_err());
    }
}
