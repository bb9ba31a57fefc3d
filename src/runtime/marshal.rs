//! # Value Marshaling
//!
//! Conversion of foreign objects into the compiler's in-memory representation
//! (**unbox**) and back (**box**).
//!
//! ## Protocol
//!
//! Unboxing takes a strong reference to the foreign object for the lifetime
//! of the returned [`NativeValue`] (its [`Cleanup`] guard), asks the foreign
//! runtime for the storage address, and hands out a [`NativeRepr`] that
//! aliases that storage. The repr is remembered in the
//! [`PendingUnboxCache`] so that boxing it again returns the *same* object:
//!
//! ```text
//! unbox(v) -> r   ─┐ pending[r.id] = weak(v)
//! box(r)   -> v'  ─┘ v' ptr_eq v
//! ```
//!
//! The entry lasts for one round trip: the first box of the repr removes it,
//! and so does dropping the [`NativeValue`] if the repr is never boxed.
//!
//! A repr built natively ([`NativeRepr::owned`]) has no pending entry; boxing
//! it constructs a fresh foreign object from its bytes.
//!
//! ## Failure
//!
//! If the foreign runtime reports an error during unbox, the value comes back
//! invalid ([`NativeValue::is_valid`] is false, the fault is attached) and is
//! never registered. The reference taken by the guard is still released when
//! the value drops.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use super::{ForeignObject, ForeignRuntime, WeakForeignObject};
use crate::error::{Error, Result};
use crate::types::{CompositeTypeCache, InternalType};

/// Counter for generating unique repr IDs
static REPR_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identity of a native representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReprId(u64);

impl ReprId {
    fn next() -> Self {
        ReprId(REPR_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Where a representation's bytes live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReprStorage {
    /// Storage of a foreign object, by address
    Aliased {
        /// Start of the foreign storage
        addr: usize,
        /// Length in bytes
        len: usize,
    },
    /// Bytes produced by native code
    Owned(Vec<u8>),
}

/// In-memory representation of a marshaled value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeRepr {
    id: ReprId,
    storage: ReprStorage,
}

impl NativeRepr {
    /// Representation built by native code
    pub fn owned(bytes: Vec<u8>) -> Self {
        NativeRepr {
            id: ReprId::next(),
            storage: ReprStorage::Owned(bytes),
        }
    }

    fn aliased(addr: usize, len: usize) -> Self {
        NativeRepr {
            id: ReprId::next(),
            storage: ReprStorage::Aliased { addr, len },
        }
    }

    /// Identity of this representation
    pub fn id(&self) -> ReprId {
        self.id
    }

    /// Backing storage
    pub fn storage(&self) -> &ReprStorage {
        &self.storage
    }

    /// Address of the first byte, for aliased storage
    pub fn address(&self) -> Option<usize> {
        match self.storage {
            ReprStorage::Aliased { addr, .. } => Some(addr),
            ReprStorage::Owned(_) => None,
        }
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        match &self.storage {
            ReprStorage::Aliased { len, .. } => *len,
            ReprStorage::Owned(bytes) => bytes.len(),
        }
    }

    /// Returns true if the representation has no bytes
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Guard holding the strong reference taken by unbox
#[derive(Debug)]
pub struct Cleanup {
    held: Option<ForeignObject>,
}

impl Cleanup {
    fn hold(obj: &ForeignObject) -> Self {
        Cleanup {
            held: Some(obj.clone()),
        }
    }

    /// Release the reference now (idempotent)
    pub fn release(&mut self) {
        self.held = None;
    }

    /// Returns true until the reference has been released
    pub fn is_holding(&self) -> bool {
        self.held.is_some()
    }
}

impl Drop for Cleanup {
    fn drop(&mut self) {
        self.release();
    }
}

/// Pending entry of one unboxed value, removed when dropped
#[derive(Debug)]
#[must_use]
pub struct PendingTicket {
    id: ReprId,
    entries: Weak<Mutex<PendingMap>>,
}

impl Drop for PendingTicket {
    fn drop(&mut self) {
        if let Some(entries) = self.entries.upgrade() {
            entries.lock().remove(&self.id);
        }
    }
}

/// Result of unboxing
#[derive(Debug)]
pub struct NativeValue {
    repr: NativeRepr,
    fault: Option<Error>,
    cleanup: Cleanup,
    ticket: Option<PendingTicket>,
}

impl NativeValue {
    /// The representation
    pub fn repr(&self) -> &NativeRepr {
        &self.repr
    }

    /// Returns false if the foreign runtime faulted during unbox
    pub fn is_valid(&self) -> bool {
        self.fault.is_none()
    }

    /// Fault raised during unbox, if any
    pub fn fault(&self) -> Option<&Error> {
        self.fault.as_ref()
    }

    /// The representation, or the fault
    pub fn check(&self) -> Result<&NativeRepr> {
        match &self.fault {
            Some(err) => Err(err.clone()),
            None => Ok(&self.repr),
        }
    }

    /// Cleanup guard
    pub fn cleanup(&mut self) -> &mut Cleanup {
        &mut self.cleanup
    }
}

type PendingMap = HashMap<ReprId, WeakForeignObject>;

/// `ReprId → original object` for values that are out on the native side
#[derive(Debug)]
pub struct PendingUnboxCache {
    entries: Arc<Mutex<PendingMap>>,
    threshold: usize,
    next_prune: usize,
}

impl PendingUnboxCache {
    /// Cache that prunes dead entries once it holds `threshold` of them
    pub fn new(threshold: usize) -> Self {
        let threshold = threshold.max(1);
        PendingUnboxCache {
            entries: Arc::new(Mutex::new(HashMap::new())),
            threshold,
            next_prune: threshold,
        }
    }

    /// Remember the original object of a repr until the ticket drops
    pub fn insert(&mut self, id: ReprId, original: WeakForeignObject) -> PendingTicket {
        if self.len() >= self.next_prune {
            self.prune();
            // live entries past the threshold double the distance to the next prune
            self.next_prune = self.threshold.max(self.len() * 2);
        }
        self.entries.lock().insert(id, original);
        PendingTicket {
            id,
            entries: Arc::downgrade(&self.entries),
        }
    }

    /// Original object of a repr, if its entry is pending and the object alive
    pub fn peek(&self, id: ReprId) -> Option<ForeignObject> {
        self.entries.lock().get(&id).and_then(WeakForeignObject::upgrade)
    }

    /// Forget and return the original object of a repr
    pub fn pop(&mut self, id: ReprId) -> Option<WeakForeignObject> {
        self.entries.lock().remove(&id)
    }

    /// Drop entries whose object has died; returns how many were dropped
    pub fn prune(&mut self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, weak| weak.is_alive());
        let pruned = before - entries.len();
        tracing::debug!(
            "pending unbox cache: pruned {} dead entries, {} left",
            pruned,
            entries.len()
        );
        pruned
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if no entry is pending
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for PendingUnboxCache {
    fn default() -> Self {
        Self::new(64)
    }
}

// =============================================================================
// UNBOX
// =============================================================================

/// Convert a foreign object into its native representation
pub fn unbox(
    ty: &InternalType,
    obj: &ForeignObject,
    runtime: &dyn ForeignRuntime,
    pending: &mut PendingUnboxCache,
) -> Result<NativeValue> {
    match ty {
        InternalType::Record(desc) => {
            let matches = obj
                .record_class()
                .is_some_and(|class| class.id() == desc.class_id());
            if !matches {
                return Err(Error::ClassMismatch {
                    expected: desc.name().to_string(),
                    got: obj.class().to_string(),
                });
            }
        }
        InternalType::OpaqueForeign => {}
        other => return Err(Error::unsupported_internal(other)),
    }

    let cleanup = Cleanup::hold(obj);
    let repr = NativeRepr::aliased(runtime.address_of(obj), obj.len());

    if let Some(message) = runtime.take_error() {
        tracing::warn!("unbox of {} faulted: {}", ty, message);
        return Ok(NativeValue {
            repr,
            fault: Some(Error::fault(message)),
            cleanup,
            ticket: None,
        });
    }

    let ticket = pending.insert(repr.id(), obj.downgrade());
    Ok(NativeValue {
        repr,
        fault: None,
        cleanup,
        ticket: Some(ticket),
    })
}

// =============================================================================
// BOX
// =============================================================================

/// Convert a native representation back into a foreign object
///
/// A repr produced by [`unbox`] yields the original object while it is
/// alive. For a record type the original must be an instance of the record's
/// class, otherwise the call fails with `ClassMismatch` and the entry stays
/// pending. An owned repr of a record type is copied into a new instance of
/// the record's class.
pub fn box_value(
    ty: &InternalType,
    repr: &NativeRepr,
    runtime: &dyn ForeignRuntime,
    pending: &mut PendingUnboxCache,
    composites: &CompositeTypeCache,
) -> Result<ForeignObject> {
    if let Some(original) = pending.peek(repr.id()) {
        if let InternalType::Record(desc) = ty {
            let matches = original
                .record_class()
                .is_some_and(|class| class.id() == desc.class_id());
            if !matches {
                return Err(Error::ClassMismatch {
                    expected: desc.name().to_string(),
                    got: original.class().to_string(),
                });
            }
        }
        pending.pop(repr.id());
        tracing::trace!("box of {}: returning original object", ty);
        return Ok(original);
    }

    match (ty, repr.storage()) {
        (InternalType::Record(desc), ReprStorage::Owned(bytes)) => {
            let class = composites
                .class_of(desc.class_id())
                .ok_or_else(|| Error::unsupported_internal(ty))?;
            let needed = desc.layout().size;
            if bytes.len() < needed {
                return Err(Error::BufferTooSmall {
                    record: desc.name().to_string(),
                    needed,
                    got: bytes.len(),
                });
            }
            let obj = runtime.construct_from_buffer(class, bytes)?;
            if let Some(message) = runtime.take_error() {
                tracing::warn!("box of {} faulted: {}", ty, message);
                return Err(Error::fault(message));
            }
            Ok(obj)
        }
        (InternalType::Record(_) | InternalType::OpaqueForeign, ReprStorage::Aliased { addr, .. }) => {
            Err(Error::fault(format!(
                "no live foreign object owns the representation at {:#x}",
                addr
            )))
        }
        _ => Err(Error::unsupported_internal(ty)),
    }
}
