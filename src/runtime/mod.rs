//! Runtime side of the bridge: foreign objects and value marshaling

mod foreign;
pub mod marshal;
pub mod support;
mod value;

pub use foreign::{ForeignRuntime, HostRuntime};
pub use marshal::{
    Cleanup, NativeRepr, NativeValue, PendingTicket, PendingUnboxCache, ReprId, ReprStorage,
};
pub use support::{CoreSupport, SupportModule, SupportRegistry};
pub use value::{ForeignObject, WeakForeignObject, SCALAR_MODULE};
