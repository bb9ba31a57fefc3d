//! Error types for the native bridge

use thiserror::Error;

/// Native bridge errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Type resolution errors
    /// Native type has no internal mapping
    ///
    /// **Triggered by:** A scalar tag absent from the scalar table, a pointer whose
    /// pointee cannot be resolved, or a nested record used as a field type
    /// **Example:** `Pointer(Scalar(HResult))` with the default table
    #[error("Unsupported native type: {ty}")]
    UnsupportedNativeType {
        /// Display form of the offending native type
        ty: String,
    },

    /// Internal type has no native mapping
    #[error("Cannot convert internal type '{ty}' to a native type")]
    UnsupportedInternalType {
        /// Display form of the offending internal type
        ty: String,
    },

    /// Record field declares an explicit bit-width
    ///
    /// **Triggered by:** `FieldDecl::bitfield("flags", tag, 3)` in a record's field list
    /// **Recovery:** None. The derivation aborts and nothing is cached
    #[error("Bitwidth specification not supported: field '{field}' of {record} declares {bits} bits")]
    UnsupportedBitfield {
        /// Record class name
        record: String,
        /// Field name
        field: String,
        /// Declared width
        bits: u32,
    },

    /// Record refers to itself, directly or through pointers
    #[error("Recursive record definition: {record} (via field '{field}')")]
    RecursiveRecord {
        /// Record class name
        record: String,
        /// Field that closes the cycle
        field: String,
    },

    /// Function pointer without declared argument types
    ///
    /// **Prevention:** Declare `argtypes` on the foreign function pointer
    #[error("native function {name} doesn't define its argument types")]
    MissingArgumentTypes {
        /// Function name
        name: String,
    },

    // Marshaling errors
    /// Foreign runtime reported an error while the bridge was marshaling
    #[error("Marshaling fault: {message}")]
    MarshalingFault {
        /// Error description
        message: String,
    },

    /// Foreign object does not belong to the record class of the internal type
    #[error("Class mismatch: expected {expected}, got {got}")]
    ClassMismatch {
        /// Expected record class
        expected: String,
        /// Class of the foreign object
        got: String,
    },

    /// Buffer shorter than the record it should hold
    #[error("Buffer too small for {record}: need {needed} bytes, got {got}")]
    BufferTooSmall {
        /// Record class name
        record: String,
        /// Required size in bytes
        needed: usize,
        /// Provided size in bytes
        got: usize,
    },

    // Support loading
    /// No support module registered for a foreign type family
    #[error("No support for {family} found. Register a support module for '{family}'")]
    NotImplemented {
        /// Family name (first segment of the declaring module)
        family: String,
    },

    // Configuration
    /// Invalid bridge options
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Fatal to the operation in progress, surfaced as a type error
    Fatal,
    /// The same call may succeed once the foreign runtime state changes
    Recoverable,
}

impl Error {
    /// Create an unsupported native type error
    pub fn unsupported_native(ty: impl ToString) -> Self {
        Error::UnsupportedNativeType { ty: ty.to_string() }
    }

    /// Create an unsupported internal type error
    pub fn unsupported_internal(ty: impl ToString) -> Self {
        Error::UnsupportedInternalType { ty: ty.to_string() }
    }

    /// Create a marshaling fault with a message
    pub fn fault(msg: impl Into<String>) -> Self {
        Error::MarshalingFault {
            message: msg.into(),
        }
    }

    /// Returns true for errors raised while resolving types
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedNativeType { .. }
                | Error::UnsupportedInternalType { .. }
                | Error::UnsupportedBitfield { .. }
                | Error::RecursiveRecord { .. }
                | Error::MissingArgumentTypes { .. }
        )
    }

    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self {
            Error::MarshalingFault { .. } => ErrorSeverity::Recoverable,
            Error::NotImplemented { .. } => ErrorSeverity::Recoverable,
            _ => ErrorSeverity::Fatal,
        }
    }
}

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, Error>;
