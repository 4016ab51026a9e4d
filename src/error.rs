//! Unified error types for ledgerflow.
//!
//! Wraps the errors of the member crates so callers of the node API deal with
//! one type.

use ledgerflow_core::CoreError;
use ledgerflow_serialization::SerializationError;
use ledgerflow_statemachine::StateMachineError;
use thiserror::Error;

/// All ledgerflow errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid value
    #[error("invalid value: {0}")]
    InvalidValue(#[from] CoreError),

    /// Serialization or admission failure
    #[error("serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// Verifier lifecycle failure
    #[error("state machine error: {0}")]
    StateMachine(StateMachineError),

    /// Configuration could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ledgerflow operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error was caused by bad input bytes rather than by
    /// configuration.
    pub fn is_data_error(&self) -> bool {
        match self {
            Error::Serialization(e) => e.is_data_error(),
            Error::StateMachine(StateMachineError::Serialization(e)) => e.is_data_error(),
            _ => false,
        }
    }

    /// Check if this is a type admission failure.
    pub fn is_unadmitted(&self) -> bool {
        matches!(
            self,
            Error::Serialization(SerializationError::UnadmittedType { .. })
                | Error::StateMachine(StateMachineError::Serialization(
                    SerializationError::UnadmittedType { .. }
                ))
        )
    }
}

// Serialization failures surface as Serialization whichever layer hit them
impl From<StateMachineError> for Error {
    fn from(e: StateMachineError) -> Self {
        match e {
            StateMachineError::Serialization(inner) => Error::Serialization(inner),
            other => Error::StateMachine(other),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
