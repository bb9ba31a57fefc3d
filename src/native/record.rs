//! Foreign record classes
//!
//! A [`RecordClass`] is the foreign definition of a fixed-layout record: an
//! ordered field list plus an optional `pack` attribute. Classes are shared
//! as `Arc<RecordClass>` and identified by a process-unique [`ClassId`];
//! two classes with the same name and fields are still different classes.
//!
//! [`RecordClass::layout`] honours any `pack` value by clamping field
//! alignment to it. The internal record descriptor derived from a class uses
//! the same computation, so both always report the same offsets and size.
//!
//! Fields may be declared after the class itself, which is how a record
//! holding a pointer to its own type is written:
//!
//! ```rust
//! use native_bridge::native::{FieldDecl, NativeType, NativeTypeTag, RecordClass};
//!
//! let node = RecordClass::builder("Node").declare();
//! node.set_fields(vec![
//!     FieldDecl::new("value", NativeTypeTag::Int32),
//!     FieldDecl::new("next", NativeType::pointer_to(node.clone().into())),
//! ]);
//! assert!(node.is_complete());
//! ```

use super::layout::RecordLayout;
use super::NativeType;
use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Counter for generating unique class IDs
static CLASS_COUNTER: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Classes whose layout is being computed on this thread
    static LAYOUT_IN_PROGRESS: RefCell<Vec<ClassId>> = const { RefCell::new(Vec::new()) };
}

/// Identity of a foreign record class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u64);

impl ClassId {
    fn next() -> Self {
        ClassId(CLASS_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class#{}", self.0)
    }
}

/// One declared field of a record class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    /// Field name
    pub name: String,
    /// Declared native type
    pub ty: NativeType,
    /// Explicit bit-width, when the field is a bitfield
    pub bits: Option<u32>,
}

impl FieldDecl {
    /// A plain `(name, type)` field
    pub fn new(name: impl Into<String>, ty: impl Into<NativeType>) -> Self {
        FieldDecl {
            name: name.into(),
            ty: ty.into(),
            bits: None,
        }
    }

    /// A `(name, type, bits)` field
    pub fn bitfield(name: impl Into<String>, ty: impl Into<NativeType>, bits: u32) -> Self {
        FieldDecl {
            name: name.into(),
            ty: ty.into(),
            bits: Some(bits),
        }
    }
}

/// A foreign record definition
pub struct RecordClass {
    id: ClassId,
    name: String,
    module: String,
    pack: Option<u32>,
    fields: OnceLock<Vec<FieldDecl>>,
    layout: OnceLock<RecordLayout>,
}

/// Builder for [`RecordClass`]
#[derive(Debug, Clone)]
pub struct RecordClassBuilder {
    name: String,
    module: String,
    pack: Option<u32>,
}

impl RecordClassBuilder {
    /// Declaring module path (its first segment selects the support family)
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    /// `pack` attribute
    pub fn pack(mut self, pack: u32) -> Self {
        self.pack = Some(pack);
        self
    }

    /// Build a complete class
    pub fn fields(self, fields: Vec<FieldDecl>) -> Arc<RecordClass> {
        let class = self.declare();
        class.set_fields(fields);
        class
    }

    /// Build a class whose fields are declared later
    pub fn declare(self) -> Arc<RecordClass> {
        Arc::new(RecordClass {
            id: ClassId::next(),
            name: self.name,
            module: self.module,
            pack: self.pack,
            fields: OnceLock::new(),
            layout: OnceLock::new(),
        })
    }
}

impl RecordClass {
    /// Default declaring module for classes built without one
    pub const DEFAULT_MODULE: &'static str = "native.records";

    /// Start building a class
    pub fn builder(name: impl Into<String>) -> RecordClassBuilder {
        RecordClassBuilder {
            name: name.into(),
            module: Self::DEFAULT_MODULE.to_string(),
            pack: None,
        }
    }

    /// Shorthand for an unpacked, complete class
    pub fn new(name: impl Into<String>, fields: Vec<FieldDecl>) -> Arc<RecordClass> {
        Self::builder(name).fields(fields)
    }

    /// Declare the field list; returns false if it was already declared
    pub fn set_fields(&self, fields: Vec<FieldDecl>) -> bool {
        self.fields.set(fields).is_ok()
    }

    /// Class identity
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declaring module path
    pub fn module(&self) -> &str {
        &self.module
    }

    /// `pack` attribute, if any
    pub fn pack(&self) -> Option<u32> {
        self.pack
    }

    /// Returns true once the field list has been declared
    pub fn is_complete(&self) -> bool {
        self.fields.get().is_some()
    }

    /// Declared fields (empty while incomplete)
    pub fn fields(&self) -> &[FieldDecl] {
        self.fields.get().map(Vec::as_slice).unwrap_or(&[])
    }

    /// C layout of the class
    ///
    /// `None` while incomplete, or when a field has no size (a `void` field,
    /// an incomplete nested record, or a record that contains itself by value).
    pub fn layout(&self) -> Option<&RecordLayout> {
        if let Some(layout) = self.layout.get() {
            return Some(layout);
        }
        let fields = self.fields.get()?;

        let entered = LAYOUT_IN_PROGRESS.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&self.id) {
                false
            } else {
                stack.push(self.id);
                true
            }
        });
        if !entered {
            return None;
        }

        let sized: Option<Vec<_>> = fields
            .iter()
            .map(|field| {
                field
                    .ty
                    .size_align()
                    .map(|(size, align)| (field.name.as_str(), size, align))
            })
            .collect();

        LAYOUT_IN_PROGRESS.with(|stack| {
            stack.borrow_mut().retain(|id| *id != self.id);
        });

        let layout = RecordLayout::compute(sized?, self.pack.map(|p| p as usize));
        Some(self.layout.get_or_init(|| layout))
    }

    /// Record size in bytes (`None` when the layout is unknown)
    pub fn size(&self) -> Option<usize> {
        self.layout().map(|l| l.size)
    }
}

impl fmt::Debug for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Field types may point back at this class; print names only.
        let names: Vec<&str> = self.fields().iter().map(|f| f.name.as_str()).collect();
        f.debug_struct("RecordClass")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("module", &self.module)
            .field("pack", &self.pack)
            .field("fields", &names)
            .finish()
    }
}
