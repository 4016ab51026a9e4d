//! Error types for the flow state machine

use ledgerflow_serialization::SerializationError;
use thiserror::Error;

/// State machine errors
#[derive(Debug, Error)]
pub enum StateMachineError {
    /// The checkpoint verifier was started twice
    #[error("checkpoint verifier already started")]
    DoubleStart,

    /// The verifier thread could not be spawned
    #[error("failed to spawn checkpoint verifier: {0}")]
    Spawn(#[source] std::io::Error),

    /// Freezing or thawing a fiber failed
    #[error("serialization error: {0}")]
    Serialization(#[from] SerializationError),
}

/// Result type alias for state machine operations
pub type Result<T> = std::result::Result<T, StateMachineError>;
