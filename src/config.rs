//! Bridge configuration
//!
//! Options are plain data with sensible defaults; they can also be read from
//! JSON so that a host compiler can ship them alongside its own settings:
//!
//! ```rust
//! use native_bridge::config::{BridgeOptions, ReversePolicy};
//!
//! let opts = BridgeOptions::from_json(r#"{ "reverse_policy": "last_inserted" }"#).unwrap();
//! assert_eq!(opts.reverse_policy, ReversePolicy::LastInserted);
//! assert_eq!(opts.pending_prune_threshold, 64);
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Target platform, as far as calling conventions are concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// 32-bit Windows, where stdcall and cdecl differ
    Windows32,
    /// Every other target (a single C calling convention)
    Other,
}

impl Platform {
    /// Platform of the running process
    pub fn host() -> Self {
        if cfg!(all(windows, target_pointer_width = "32")) {
            Platform::Windows32
        } else {
            Platform::Other
        }
    }

    /// Returns true if stdcall is distinct from the C convention here
    pub fn stdcall_significant(&self) -> bool {
        matches!(self, Platform::Windows32)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Platform::host()
    }
}

/// How the reverse scalar map picks a native tag when several map to one internal type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReversePolicy {
    /// One explicit canonical tag per internal type (the standard fixed-width variant)
    #[default]
    Canonical,
    /// Literal inversion of the forward table: the last inserted tag wins
    LastInserted,
}

/// Bridge options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeOptions {
    /// Platform used to pick calling conventions for function pointers
    pub platform: Platform,
    /// Reverse scalar map policy
    pub reverse_policy: ReversePolicy,
    /// Pending-unbox entries tolerated before dead entries are pruned
    pub pending_prune_threshold: usize,
    /// Family name whose support is built in
    pub core_family: String,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            platform: Platform::host(),
            reverse_policy: ReversePolicy::Canonical,
            pending_prune_threshold: 64,
            core_family: "native".to_string(),
        }
    }
}

impl BridgeOptions {
    /// Parse options from JSON (missing keys take their defaults)
    pub fn from_json(source: &str) -> Result<Self> {
        let opts: BridgeOptions =
            serde_json::from_str(source).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Check option invariants
    pub fn validate(&self) -> Result<()> {
        if self.pending_prune_threshold == 0 {
            return Err(Error::InvalidConfig(
                "pending_prune_threshold must be at least 1".to_string(),
            ));
        }
        if self.core_family.is_empty() || self.core_family.contains('.') {
            return Err(Error::InvalidConfig(format!(
                "core_family must be a single module segment, got '{}'",
                self.core_family
            )));
        }
        Ok(())
    }

    /// Builder-style platform override
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Builder-style reverse policy override
    pub fn with_reverse_policy(mut self, policy: ReversePolicy) -> Self {
        self.reverse_policy = policy;
        self
    }
}
