//! Support modules for foreign type families
//!
//! A foreign object's *family* is the first dotted segment of its declaring
//! module (`"native.records"` → `"native"`). Before the bridge types an
//! object of a family for the first time, the family's [`SupportModule`] is
//! initialized against the context so it can register scalar mappings or
//! anything else it needs. The family named by
//! [`BridgeOptions::core_family`](crate::config::BridgeOptions) is built in.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::context::InteropContext;
use crate::error::{Error, Result};

/// Support for one family of foreign types
pub trait SupportModule: Send + Sync {
    /// Family this module supports
    fn family(&self) -> &str;

    /// Prepare `ctx` for objects of this family; runs at most once per context
    fn init(&self, ctx: &mut InteropContext) -> Result<()>;
}

/// Builtin support for the core family; nothing to initialize
#[derive(Debug, Clone)]
pub struct CoreSupport {
    family: String,
}

impl CoreSupport {
    /// Core support under the given family name
    pub fn new(family: impl Into<String>) -> Self {
        CoreSupport {
            family: family.into(),
        }
    }
}

impl SupportModule for CoreSupport {
    fn family(&self) -> &str {
        &self.family
    }

    fn init(&self, _ctx: &mut InteropContext) -> Result<()> {
        Ok(())
    }
}

/// Family of a declaring module path
pub fn family_of(module: &str) -> &str {
    module.split('.').next().unwrap_or(module)
}

/// Registered support modules and which of them have been initialized
#[derive(Default)]
pub struct SupportRegistry {
    modules: HashMap<String, Arc<dyn SupportModule>>,
    initialized: HashSet<String>,
}

impl SupportRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module under its family, replacing any previous one
    pub fn register(&mut self, module: Arc<dyn SupportModule>) -> Option<Arc<dyn SupportModule>> {
        let family = module.family().to_string();
        tracing::debug!("support module registered for '{}'", family);
        self.modules.insert(family, module)
    }

    /// Module for a family
    pub fn get(&self, family: &str) -> Option<&Arc<dyn SupportModule>> {
        self.modules.get(family)
    }

    /// Returns true if a module is registered for the family
    pub fn contains(&self, family: &str) -> bool {
        self.modules.contains_key(family)
    }

    /// Returns true once the family has been initialized
    pub fn is_initialized(&self, family: &str) -> bool {
        self.initialized.contains(family)
    }

    /// Module to initialize for `family`, or `None` if that already happened
    ///
    /// The family is marked initialized before the module runs, so a module
    /// whose `init` types objects of its own family does not re-enter.
    pub(crate) fn begin_init(&mut self, family: &str) -> Result<Option<Arc<dyn SupportModule>>> {
        if self.initialized.contains(family) {
            return Ok(None);
        }
        let module = self.modules.get(family).cloned().ok_or_else(|| {
            tracing::warn!("no support module for family '{}'", family);
            Error::NotImplemented {
                family: family.to_string(),
            }
        })?;
        self.initialized.insert(family.to_string());
        Ok(Some(module))
    }

    /// Forget that a family was initialized (its `init` failed)
    pub(crate) fn abort_init(&mut self, family: &str) {
        self.initialized.remove(family);
    }

    /// Registered family names
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }
}

impl fmt::Debug for SupportRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut families: Vec<&str> = self.families().collect();
        families.sort_unstable();
        f.debug_struct("SupportRegistry")
            .field("families", &families)
            .field("initialized", &self.initialized)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_of() {
        assert_eq!(family_of("native.records"), "native");
        assert_eq!(family_of("gfx"), "gfx");
        assert_eq!(family_of(""), "");
    }

    #[test]
    fn test_missing_family() {
        let mut registry = SupportRegistry::new();
        match registry.begin_init("gfx") {
            Err(Error::NotImplemented { family }) => assert_eq!(family, "gfx"),
            other => panic!("Expected NotImplemented, got {:?}", other.map(|m| m.is_some())),
        }
        assert!(!registry.is_initialized("gfx"));
    }

    #[test]
    fn test_init_handed_out_once() {
        let mut registry = SupportRegistry::new();
        assert!(registry.register(Arc::new(CoreSupport::new("native"))).is_none());
        assert!(registry.begin_init("native").unwrap().is_some());
        assert!(registry.begin_init("native").unwrap().is_none());
        registry.abort_init("native");
        assert!(registry.begin_init("native").unwrap().is_some());
    }
}
