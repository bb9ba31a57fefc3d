use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::{Error, Result};
use crate::native::{NativeType, NativeTypeTag, RecordClass};

/// Module declared by scalar and pointer objects built without one
pub const SCALAR_MODULE: &str = "native.scalars";

/// Handle to a live foreign-runtime object
///
/// Handles are reference-counted: cloning takes a new strong reference and
/// dropping releases it. Two handles are the same object iff [`ptr_eq`]
/// holds.
///
/// [`ptr_eq`]: ForeignObject::ptr_eq
#[derive(Clone)]
pub struct ForeignObject(Arc<ObjectCell>);

struct ObjectCell {
    class: NativeType,
    module: String,
    data: Box<[u8]>,
}

impl ForeignObject {
    /// Object of any native class
    pub fn new(class: NativeType, module: impl Into<String>, data: Vec<u8>) -> Self {
        ForeignObject(Arc::new(ObjectCell {
            class,
            module: module.into(),
            data: data.into_boxed_slice(),
        }))
    }

    /// Instance of a record class over `data`
    ///
    /// Fails with `BufferTooSmall` when the class layout is known and `data`
    /// is shorter than it.
    pub fn record(class: &Arc<RecordClass>, data: Vec<u8>) -> Result<Self> {
        if let Some(needed) = class.size() {
            if data.len() < needed {
                return Err(Error::BufferTooSmall {
                    record: class.name().to_string(),
                    needed,
                    got: data.len(),
                });
            }
        }
        let module = class.module().to_string();
        Ok(Self::new(NativeType::Record(Arc::clone(class)), module, data))
    }

    /// Zero-initialized instance of a record class
    pub fn zeroed(class: &Arc<RecordClass>) -> Self {
        let size = class.size().unwrap_or(0);
        Self::new(
            NativeType::Record(Arc::clone(class)),
            class.module(),
            vec![0; size],
        )
    }

    /// Scalar instance holding `data`
    pub fn scalar(tag: NativeTypeTag, data: Vec<u8>) -> Self {
        Self::new(NativeType::Scalar(tag), SCALAR_MODULE, data)
    }

    /// Native class of the object
    pub fn class(&self) -> &NativeType {
        &self.0.class
    }

    /// Record class, when the object is a record instance
    pub fn record_class(&self) -> Option<&Arc<RecordClass>> {
        match &self.0.class {
            NativeType::Record(class) => Some(class),
            _ => None,
        }
    }

    /// Declaring module of the object's class
    pub fn module(&self) -> &str {
        &self.0.module
    }

    /// Object storage
    pub fn bytes(&self) -> &[u8] {
        &self.0.data
    }

    /// Storage length in bytes
    pub fn len(&self) -> usize {
        self.0.data.len()
    }

    /// Returns true if the object has no storage
    pub fn is_empty(&self) -> bool {
        self.0.data.is_empty()
    }

    /// Address of the object's storage
    pub fn address(&self) -> usize {
        self.0.data.as_ptr() as usize
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &ForeignObject) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Number of strong references currently held
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Non-owning handle
    pub fn downgrade(&self) -> WeakForeignObject {
        WeakForeignObject(Arc::downgrade(&self.0))
    }
}

impl fmt::Debug for ForeignObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignObject")
            .field("class", &self.0.class.to_string())
            .field("module", &self.0.module)
            .field("len", &self.0.data.len())
            .field("address", &format_args!("{:#x}", self.address()))
            .finish()
    }
}

/// Non-owning handle to a foreign object
#[derive(Clone)]
pub struct WeakForeignObject(Weak<ObjectCell>);

impl WeakForeignObject {
    /// Strong handle, if the object is still alive
    pub fn upgrade(&self) -> Option<ForeignObject> {
        self.0.upgrade().map(ForeignObject)
    }

    /// Returns true while some strong handle exists
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl fmt::Debug for WeakForeignObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakForeignObject(alive: {})", self.is_alive())
    }
}
