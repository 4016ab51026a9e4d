//! Error types for serialization

use crate::admission::PolicyId;
use ledgerflow_core::{CoreError, SerializationMagic, UseCase};
use thiserror::Error;

/// Serialization errors
///
/// Admission and schema errors are raised synchronously to the caller of
/// `serialize` / `deserialize`; nothing here is retried internally.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// A batch repeats a type or names a type that is already admitted
    #[error("duplicate admission: {}", .types.join(", "))]
    DuplicateAdmission {
        /// Offending type names
        types: Vec<String>,
    },

    /// The generic object serializer met a type the policy does not admit
    #[error("type {type_name} is not admitted by policy {policy}")]
    UnadmittedType {
        /// Type name
        type_name: String,
        /// Policy that rejected it
        policy: PolicyId,
    },

    /// Encoded data does not match the expected type
    #[error("schema mismatch: expected {expected}, found {found}")]
    SchemaMismatch {
        /// What the reader expected
        expected: String,
        /// What the data contained
        found: String,
    },

    /// Type is neither handled by a registered serializer nor loaded in scope
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// The scheme refuses this use case
    #[error("{scheme} does not support use case {use_case}")]
    UnsupportedUseCase {
        /// Scheme name
        scheme: String,
        /// Requested use case
        use_case: UseCase,
    },

    /// Capability not implemented by this scheme variant
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// Capability deliberately unsupported by this scheme variant
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Buffer does not start with a known serialization magic
    #[error("unknown serialization magic: {0}")]
    UnknownMagic(String),

    /// No registered scheme accepts this magic and use case
    #[error("no serialization scheme for {magic} and use case {use_case}")]
    NoSchemeFor {
        /// Magic read from the buffer
        magic: SerializationMagic,
        /// Requested use case
        use_case: UseCase,
    },

    /// Payload could not be decoded (truncated, corrupt)
    #[error("malformed envelope: {0}")]
    Malformed(String),

    /// Decoded parts do not form a valid value
    #[error("invalid value: {0}")]
    InvalidValue(#[from] CoreError),

    /// A contributed serializer failed or panicked
    #[error("custom serializer {serializer} failed: {message}")]
    CustomSerializer {
        /// Serializer id
        serializer: String,
        /// Failure description
        message: String,
    },

    /// Two serializers for different types claim the same descriptor
    #[error("descriptor {0} is already bound to another type")]
    DescriptorConflict(String),
}

impl SerializationError {
    pub(crate) fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        SerializationError::SchemaMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// True for errors caused by the bytes rather than by configuration
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            SerializationError::SchemaMismatch { .. }
                | SerializationError::Malformed(_)
                | SerializationError::UnknownMagic(_)
                | SerializationError::InvalidValue(_)
        )
    }
}

/// Result type alias for serialization operations
pub type Result<T> = std::result::Result<T, SerializationError>;
