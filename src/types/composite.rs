//! # Composite Type Synthesizer
//!
//! Derives [`InternalType::Record`] descriptors from foreign record classes and
//! caches them by class identity.
//!
//! ## Algorithm
//!
//! 1. Cache hit on the [`ClassId`] returns the cached descriptor (same `Arc`)
//! 2. Each declared field, in order:
//!    - a bit-width aborts with `UnsupportedBitfield`
//!    - a field typed as the record itself (possibly behind pointers) aborts
//!      with `RecursiveRecord`
//!    - any other record-typed field aborts with `UnsupportedNativeType`
//!      (nested records are not supported)
//!    - otherwise the field type is resolved through the [`TypeBridge`]
//! 3. `pack == 1` marks the record packed; any other value means unpacked.
//!    The layout is computed with the class's actual `pack`, so it matches
//!    [`RecordClass::layout`] for every pack value
//! 4. The descriptor is inserted and returned
//!
//! A failed derivation caches nothing.

use super::{InternalType, TypeBridge};
use crate::error::{Error, Result};
use crate::native::{ClassId, FieldDecl, NativeType, RecordClass, RecordLayout};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A named field of a record descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFieldSpec {
    /// Field name
    pub name: String,
    /// Field type
    pub ty: InternalType,
}

/// Internal description of a fixed-layout record
#[derive(Debug)]
pub struct RecordDescriptor {
    class_id: ClassId,
    name: String,
    fields: Vec<RecordFieldSpec>,
    pack: Option<u32>,
    layout: RecordLayout,
}

impl RecordDescriptor {
    fn new(class_id: ClassId, name: String, fields: Vec<RecordFieldSpec>, pack: Option<u32>) -> Self {
        let layout = RecordLayout::compute(
            fields.iter().map(|f| {
                // Field types are scalars or pointers, which always have a size.
                let (size, align) = f.ty.size_align().unwrap_or((0, 1));
                (f.name.as_str(), size, align)
            }),
            pack.map(|p| p as usize),
        );
        RecordDescriptor {
            class_id,
            name,
            fields,
            pack,
            layout,
        }
    }

    /// Identity of the foreign class this was derived from
    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    /// Record name (the foreign class name)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[RecordFieldSpec] {
        &self.fields
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&RecordFieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether the record is packed (no padding)
    pub fn packed(&self) -> bool {
        self.pack == Some(1)
    }

    /// `pack` attribute of the foreign class
    pub fn pack(&self) -> Option<u32> {
        self.pack
    }

    /// Field offsets and total size
    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    /// Structural comparison, ignoring identity
    pub fn same_shape(&self, other: &RecordDescriptor) -> bool {
        self.pack == other.pack && self.fields == other.fields
    }
}

impl fmt::Display for RecordDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record({}{{", self.name)?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", field.name, field.ty)?;
        }
        write!(f, "}}")?;
        if self.packed() {
            write!(f, ", packed")?;
        }
        write!(f, ")")
    }
}

struct CacheEntry {
    class: Arc<RecordClass>,
    ty: InternalType,
}

/// Record descriptors keyed by foreign class identity
#[derive(Default)]
pub struct CompositeTypeCache {
    entries: HashMap<ClassId, CacheEntry>,
}

impl CompositeTypeCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached type for a class
    pub fn get(&self, id: ClassId) -> Option<&InternalType> {
        self.entries.get(&id).map(|e| &e.ty)
    }

    /// Foreign class a cached descriptor was derived from
    pub fn class_of(&self, id: ClassId) -> Option<&Arc<RecordClass>> {
        self.entries.get(&id).map(|e| &e.class)
    }

    /// Returns true if the class has a cached descriptor
    pub fn contains(&self, id: ClassId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of cached descriptors
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Derive (or fetch) the record type for a foreign class
    pub fn synthesize(
        &mut self,
        class: &Arc<RecordClass>,
        bridge: &TypeBridge,
    ) -> Result<InternalType> {
        if let Some(entry) = self.entries.get(&class.id()) {
            tracing::trace!("composite cache hit: {}", class.name());
            return Ok(entry.ty.clone());
        }

        if !class.is_complete() {
            return Err(Error::unsupported_native(format!(
                "{} (fields not declared)",
                class.name()
            )));
        }

        let fields = class
            .fields()
            .iter()
            .map(|field| Self::derive_field(class, field, bridge))
            .collect::<Result<Vec<_>>>()?;

        let desc = RecordDescriptor::new(class.id(), class.name().to_string(), fields, class.pack());
        let ty = InternalType::Record(Arc::new(desc));

        tracing::debug!("synthesized {} for {}", ty, class.id());
        self.entries.insert(
            class.id(),
            CacheEntry {
                class: Arc::clone(class),
                ty: ty.clone(),
            },
        );
        Ok(ty)
    }

    fn derive_field(
        class: &RecordClass,
        field: &FieldDecl,
        bridge: &TypeBridge,
    ) -> Result<RecordFieldSpec> {
        if let Some(bits) = field.bits {
            return Err(Error::UnsupportedBitfield {
                record: class.name().to_string(),
                field: field.name.clone(),
                bits,
            });
        }

        match field.ty.peel_pointers() {
            NativeType::Record(inner) if inner.id() == class.id() => {
                return Err(Error::RecursiveRecord {
                    record: class.name().to_string(),
                    field: field.name.clone(),
                });
            }
            NativeType::Record(_) => return Err(Error::unsupported_native(&field.ty)),
            _ => {}
        }
        if field.ty.is_void() {
            return Err(Error::unsupported_native(format!(
                "void field '{}' in {}",
                field.name,
                class.name()
            )));
        }

        Ok(RecordFieldSpec {
            name: field.name.clone(),
            ty: bridge.resolve_from_native(&field.ty)?,
        })
    }
}

impl fmt::Debug for CompositeTypeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeTypeCache")
            .field("len", &self.entries.len())
            .finish()
    }
}
