//! Boundary to the foreign runtime
//!
//! The marshaling protocol never touches foreign memory itself. Everything it
//! needs from the runtime that owns the objects goes through
//! [`ForeignRuntime`]: the storage address of an object, the runtime's
//! outstanding-error flag, and construction of a new object from bytes.
//! [`HostRuntime`] is the in-process implementation backing
//! [`ForeignObject`].

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::ForeignObject;
use crate::error::Result;
use crate::native::RecordClass;

/// Operations the marshaling protocol needs from a foreign runtime
pub trait ForeignRuntime {
    /// Address of the object's storage
    fn address_of(&self, obj: &ForeignObject) -> usize;

    /// Take the outstanding error message, clearing it
    fn take_error(&self) -> Option<String>;

    /// New instance of `class` holding a copy of `bytes`
    fn construct_from_buffer(&self, class: &Arc<RecordClass>, bytes: &[u8])
        -> Result<ForeignObject>;
}

/// In-process foreign runtime
#[derive(Debug, Default)]
pub struct HostRuntime {
    error: Mutex<Option<String>>,
    constructed: AtomicU64,
}

impl HostRuntime {
    /// Runtime with no outstanding error
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the outstanding error (the next operation observes it)
    pub fn raise(&self, message: impl Into<String>) {
        *self.error.lock() = Some(message.into());
    }

    /// Returns true while an error is outstanding
    pub fn err_occurred(&self) -> bool {
        self.error.lock().is_some()
    }

    /// Number of objects built by [`ForeignRuntime::construct_from_buffer`]
    pub fn constructed(&self) -> u64 {
        self.constructed.load(Ordering::Relaxed)
    }
}

impl ForeignRuntime for HostRuntime {
    fn address_of(&self, obj: &ForeignObject) -> usize {
        obj.address()
    }

    fn take_error(&self) -> Option<String> {
        self.error.lock().take()
    }

    fn construct_from_buffer(
        &self,
        class: &Arc<RecordClass>,
        bytes: &[u8],
    ) -> Result<ForeignObject> {
        let obj = ForeignObject::record(class, bytes.to_vec())?;
        self.constructed.fetch_add(1, Ordering::Relaxed);
        Ok(obj)
    }
}
