#![warn(missing_docs)]
//! # Native Bridge - Foreign Type Interop for Compilers
//!
//! Translates the type vocabulary of a foreign native-call library (C scalar
//! tags, pointers, record classes, typed function pointers) into the internal
//! types a compiler generates code for, and marshals live foreign objects
//! across that boundary without losing their identity.
//!
//! ## Features
//!
//! - **Scalar table** - every C scalar tag mapped to a fixed-width internal type,
//!   sized for the host
//! - **Recursive resolver** - pointers of any depth, both directions
//! - **Record synthesis** - struct classes become identity-compared record types,
//!   built once per class
//! - **Function pointers** - signature and calling convention from declared
//!   argument and return types
//! - **Marshaling** - unbox/box with reference-count hand-off and round-trip identity
//! - **Zero Unsafe Code** - foreign storage is only ever referred to by address
//!
//! ## Quick Start
//!
//! ```rust
//! use native_bridge::{InteropContext, InternalType, NativeType, NativeTypeTag, Result};
//!
//! # fn main() -> Result<()> {
//! let ctx = InteropContext::default();
//!
//! // c_char_p is a pointer to int8
//! let ty = ctx.resolve_from_native(&NativeTypeTag::CharP.into())?;
//! assert_eq!(ty, InternalType::pointer_to(InternalType::I8));
//!
//! // and back again, recursively
//! let native = ctx.resolve_to_native(&InternalType::pointer_to(InternalType::F64))?;
//! assert_eq!(native, NativeType::pointer_to(NativeTypeTag::Double.into()));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! NativeType ──▶ TypeBridge ──▶ InternalType ──▶ code generator
//!                    │
//! ForeignObject ──▶ typeof_value ──▶ CompositeTypeCache
//!        ▲                                │
//!        └──── box_value ◀── NativeRepr ◀─┴── unbox_value
//! ```
//!
//! ### Main Components
//!
//! - [`native`] - the foreign vocabulary: [`NativeTypeTag`], [`NativeType`], record classes
//! - [`types`] - [`InternalType`], the scalar table, the resolver, records and callables
//! - [`runtime`] - foreign objects, the [`ForeignRuntime`] seam, marshaling, support modules
//! - [`InteropContext`] - owns every cache and exposes the entry points
//! - [`BridgeOptions`] - configuration
//!
//! ## Logging
//!
//! The crate logs through [`tracing`] and installs no subscriber.

/// Version of the native bridge
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod context;
pub mod error;
pub mod native;
pub mod runtime;
pub mod types;

// Re-export main types
pub use config::{BridgeOptions, Platform, ReversePolicy};
pub use context::{InteropContext, SharedContext};
pub use error::{Error, ErrorSeverity, Result};
pub use native::{FieldDecl, ForeignFunctionPtr, FuncFlags, NativeType, NativeTypeTag, RecordClass};
pub use runtime::{ForeignObject, ForeignRuntime, HostRuntime, NativeRepr, NativeValue};
pub use types::{FunctionPointerType, InternalType, TypeBridge};
