//! Error types for the Keepsake core library.

use thiserror::Error;

/// Top-level error type for all Keepsake operations.
#[derive(Error, Debug)]
pub enum KeepsakeError {
    /// A scalar could not be parsed from its textual form.
    #[error("Cannot parse {input:?} as {kind}")]
    Parse {
        /// Type identity the input was parsed against.
        kind: String,
        /// The offending input.
        input: String,
    },

    /// An enum variant name is not declared by the target enum.
    #[error("Unknown variant {variant:?} for enum {enum_name}")]
    UnknownVariant {
        /// Declared enum type name.
        enum_name: String,
        /// The name that failed the lookup.
        variant: String,
    },

    /// A value or saved record does not match the declared kind.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Declared type identity.
        expected: String,
        /// What was actually present.
        found: String,
    },

    /// A fixed-size array decoded to the wrong number of elements.
    #[error("Array length mismatch: expected {expected}, found {found}")]
    LengthMismatch {
        /// Declared array length.
        expected: usize,
        /// Decoded element count.
        found: usize,
    },

    /// An integer does not fit the target field's width.
    #[error("Value {value} out of range for {kind}")]
    OutOfRange {
        /// Rust type of the target field.
        kind: &'static str,
        /// The decoded value.
        value: String,
    },

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The component has no registry entry and could not be registered.
    #[error("Component not registered: {0}")]
    NotRegistered(String),

    /// A registered instance could not be accessed.
    #[error("Component {component} unavailable: {reason}")]
    Unavailable {
        /// Component type name.
        component: String,
        /// Dropped, or borrowed elsewhere.
        reason: String,
    },

    /// SQLite store error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for KeepsakeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, KeepsakeError>;
