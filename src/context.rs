//! # Interop Context
//!
//! [`InteropContext`] owns all mutable bridge state (the composite type
//! cache, the pending-unbox cache and the support registry) and is the
//! single entry point a code generator talks to:
//!
//! | Operation | Purpose |
//! |-----------|---------|
//! | [`resolve_from_native`](InteropContext::resolve_from_native) | native type → internal type |
//! | [`resolve_to_native`](InteropContext::resolve_to_native) | internal type → native type |
//! | [`typeof_value`](InteropContext::typeof_value) | type of a live foreign object |
//! | [`derive_function_type`](InteropContext::derive_function_type) | callable type of a function pointer |
//! | [`unbox_value`](InteropContext::unbox_value) / [`box_value`](InteropContext::box_value) | value marshaling |
//!
//! Methods that touch caches take `&mut self`. Compilers that type code on
//! several threads share one context through [`SharedContext`].
//!
//! ## Example
//!
//! ```rust
//! use native_bridge::context::InteropContext;
//! use native_bridge::native::{FieldDecl, NativeTypeTag, RecordClass};
//! use native_bridge::runtime::{ForeignObject, HostRuntime};
//!
//! let mut ctx = InteropContext::default();
//! let point = RecordClass::new("Point", vec![
//!     FieldDecl::new("x", NativeTypeTag::Int32),
//!     FieldDecl::new("y", NativeTypeTag::Int32),
//! ]);
//! let obj = ForeignObject::zeroed(&point);
//!
//! let ty = ctx.typeof_value(&obj).unwrap();
//! assert_eq!(ty, ctx.typeof_value(&ForeignObject::zeroed(&point)).unwrap());
//!
//! let rt = HostRuntime::new();
//! let value = ctx.unbox_value(&ty, &obj, &rt).unwrap();
//! let back = ctx.box_value(&ty, value.repr(), &rt).unwrap();
//! assert!(back.ptr_eq(&obj));
//! ```

use parking_lot::Mutex;
use std::sync::Arc;

use crate::config::BridgeOptions;
use crate::error::{Error, Result};
use crate::native::{ForeignFunctionPtr, NativeType, NativeTypeTag, RecordClass};
use crate::runtime::marshal;
use crate::runtime::support::family_of;
use crate::runtime::{
    CoreSupport, ForeignObject, ForeignRuntime, NativeRepr, NativeValue, PendingUnboxCache,
    SupportModule, SupportRegistry,
};
use crate::types::{CompositeTypeCache, FunctionPointerType, InternalType, TypeBridge};

/// Context shared between threads
pub type SharedContext = Arc<Mutex<InteropContext>>;

/// Bridge state and entry points
#[derive(Debug)]
pub struct InteropContext {
    options: BridgeOptions,
    bridge: TypeBridge,
    composites: CompositeTypeCache,
    pending: PendingUnboxCache,
    support: SupportRegistry,
}

impl InteropContext {
    /// Context with the given options
    pub fn new(options: BridgeOptions) -> Self {
        let mut support = SupportRegistry::new();
        support.register(Arc::new(CoreSupport::new(options.core_family.clone())));
        InteropContext {
            bridge: TypeBridge::with_policy(options.reverse_policy),
            composites: CompositeTypeCache::new(),
            pending: PendingUnboxCache::new(options.pending_prune_threshold),
            support,
            options,
        }
    }

    /// Context with validated options
    pub fn try_new(options: BridgeOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::new(options))
    }

    /// Wrap the context for sharing between threads
    pub fn into_shared(self) -> SharedContext {
        Arc::new(Mutex::new(self))
    }

    /// Options in effect
    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    /// Type resolver
    pub fn bridge(&self) -> &TypeBridge {
        &self.bridge
    }

    /// Record descriptors synthesized so far
    pub fn composites(&self) -> &CompositeTypeCache {
        &self.composites
    }

    /// Values unboxed and not yet boxed back
    pub fn pending(&self) -> &PendingUnboxCache {
        &self.pending
    }

    /// Support modules
    pub fn support(&self) -> &SupportRegistry {
        &self.support
    }

    // =========================================================================
    // TYPE RESOLUTION
    // =========================================================================

    /// Internal type of a native type
    pub fn resolve_from_native(&self, native: &NativeType) -> Result<InternalType> {
        self.bridge.resolve_from_native(native)
    }

    /// Native type of an internal type
    pub fn resolve_to_native(&self, ty: &InternalType) -> Result<NativeType> {
        self.bridge.resolve_to_native(ty)
    }

    /// Record descriptor for a foreign class (cached by class identity)
    pub fn synthesize_record(&mut self, class: &Arc<RecordClass>) -> Result<InternalType> {
        self.composites.synthesize(class, &self.bridge)
    }

    /// Internal type of a live foreign object
    ///
    /// Loads support for the object's family first. Scalar and pointer
    /// classes resolve through the scalar table; record classes are
    /// synthesized and cached.
    pub fn typeof_value(&mut self, obj: &ForeignObject) -> Result<InternalType> {
        self.ensure_support(obj.module())?;
        match obj.class() {
            NativeType::Record(class) => self.synthesize_record(class),
            NativeType::Void => Err(Error::unsupported_native(obj.class())),
            native => self.bridge.resolve_from_native(native),
        }
    }

    /// Callable type of a foreign function pointer
    pub fn derive_function_type(&self, fnptr: &ForeignFunctionPtr) -> Result<FunctionPointerType> {
        FunctionPointerType::derive(fnptr, &self.bridge, self.options.platform)
    }

    /// [`derive_function_type`](Self::derive_function_type) as an internal type
    pub fn function_pointer_type(&self, fnptr: &ForeignFunctionPtr) -> Result<InternalType> {
        self.derive_function_type(fnptr)
            .map(|fnty| InternalType::FunctionPointer(Arc::new(fnty)))
    }

    // =========================================================================
    // MARSHALING
    // =========================================================================

    /// Convert a foreign object into its native representation
    pub fn unbox_value(
        &mut self,
        ty: &InternalType,
        obj: &ForeignObject,
        runtime: &dyn ForeignRuntime,
    ) -> Result<NativeValue> {
        marshal::unbox(ty, obj, runtime, &mut self.pending)
    }

    /// Convert a native representation back into a foreign object
    pub fn box_value(
        &mut self,
        ty: &InternalType,
        repr: &NativeRepr,
        runtime: &dyn ForeignRuntime,
    ) -> Result<ForeignObject> {
        marshal::box_value(ty, repr, runtime, &mut self.pending, &self.composites)
    }

    // =========================================================================
    // EXTENSION
    // =========================================================================

    /// Add or replace a scalar mapping
    pub fn register_scalar(&mut self, tag: NativeTypeTag, ty: InternalType) {
        self.bridge.scalars_mut().register(tag, ty);
    }

    /// Register a support module for its family
    pub fn register_support(&mut self, module: Arc<dyn SupportModule>) {
        self.support.register(module);
    }

    /// Initialize support for the family of `module`, once
    ///
    /// Fails with `NotImplemented` if no support module is registered for
    /// the family. A failed `init` may be retried.
    pub fn ensure_support(&mut self, module: &str) -> Result<()> {
        let family = family_of(module).to_string();
        let Some(support) = self.support.begin_init(&family)? else {
            return Ok(());
        };
        tracing::debug!("initializing support for '{}'", family);
        if let Err(err) = support.init(self) {
            tracing::warn!("support init for '{}' failed: {}", family, err);
            self.support.abort_init(&family);
            return Err(err);
        }
        Ok(())
    }
}

impl Default for InteropContext {
    fn default() -> Self {
        Self::new(BridgeOptions::default())
    }
}
