//! Flow state machine for ledgerflow
//!
//! This crate drives flow state changes and guards their checkpoints:
//! - State model: checkpoints, flow states, error states, frozen fibers
//! - Events, actions and transition results
//! - `TransitionExecutor` and the terminal executor
//! - Interceptors: checkpoint verification, tracing, per-flow history
//! - `CheckpointVerifier`: background deserialization of new checkpoints

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chain;
pub mod error;
pub mod event;
pub mod executor;
pub mod fiber;
pub mod interceptors;
pub mod state;
pub mod transition;
pub mod verifier;

#[cfg(test)]
mod testing;

pub use chain::{build_executor_chain, StateMachineOptions};
pub use error::{Result, StateMachineError};
pub use event::{Event, FlowIoRequest, SessionId};
pub use executor::{TransitionExecutor, TransitionExecutorImpl};
pub use fiber::FlowFiber;
pub use interceptors::{
    CheckpointVerifyingInterceptor, HistoryInterceptor, TracingInterceptor, TransitionRecord,
};
pub use state::{
    checkpoint_scope, Checkpoint, ErrorState, FiberSnapshot, FlowError, FlowState, FrozenFiber,
    ResumePoint, StateMachineState,
};
pub use transition::{Action, ActionExecutor, FlowContinuation, TransitionResult};
pub use verifier::CheckpointVerifier;
