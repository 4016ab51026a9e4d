//! Convenient imports for ledgerflow.
//!
//! ```ignore
//! use ledgerflow::prelude::*;
//! ```

// Main entry point
pub use crate::node::{Node, NodeBuilder, ShutdownReport};
pub use crate::config::NodeOptions;

// Error handling
pub use crate::error::{Error, Result};

// Core types
pub use ledgerflow_core::{FlowId, OpaqueBytes, SerializationMagic, SerializedBytes, UseCase};

// Serialization
pub use ledgerflow_serialization::{
    AnyObject, Encodable, FieldReader, FieldWriter, Portable, ProxySerializer,
    WhitelistContributor,
};

// State machine
pub use ledgerflow_statemachine::{
    Action, ActionExecutor, Event, FiberSnapshot, FlowContinuation, FlowFiber, FlowState,
    ResumePoint, StateMachineState, TransitionExecutor, TransitionResult,
};
