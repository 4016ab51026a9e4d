//! Transition results and actions
//!
//! A transition is computed purely from `(previous state, event)`; its side
//! effects are listed as [`Action`]s and carried out by an
//! [`ActionExecutor`] when the transition is executed.

use crate::event::{Event, SessionId};
use crate::fiber::FlowFiber;
use crate::state::{Checkpoint, StateMachineState};
use ledgerflow_core::{FlowId, OpaqueBytes, ThrowableValue};

/// What the fiber does after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowContinuation {
    /// Resume the fiber, optionally with a value
    Resume(Option<OpaqueBytes>),
    /// Resume the fiber by raising an error in it
    Throw(ThrowableValue),
    /// Keep the fiber suspended and process further events
    ProcessEvents,
    /// Stop the fiber without resuming it
    Abort,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Write the checkpoint to storage
    PersistCheckpoint {
        /// Flow
        id: FlowId,
        /// Checkpoint to write
        checkpoint: Checkpoint,
    },
    /// Delete the stored checkpoint
    RemoveCheckpoint {
        /// Flow
        id: FlowId,
    },
    /// Send a session message
    SendMessage {
        /// Session
        session: SessionId,
        /// Message body
        payload: OpaqueBytes,
    },
    /// Feed an event back to the flow
    ScheduleEvent(Event),
    /// Remove the flow from the state machine
    RemoveFlow {
        /// Flow
        id: FlowId,
    },
}

impl Action {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Action::PersistCheckpoint { .. } => "PersistCheckpoint",
            Action::RemoveCheckpoint { .. } => "RemoveCheckpoint",
            Action::SendMessage { .. } => "SendMessage",
            Action::ScheduleEvent(_) => "ScheduleEvent",
            Action::RemoveFlow { .. } => "RemoveFlow",
        }
    }
}

/// Outcome of computing a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// State after the transition
    pub new_state: StateMachineState,
    /// Side effects, in order
    pub actions: Vec<Action>,
    /// What the fiber does next
    pub continuation: FlowContinuation,
}

impl TransitionResult {
    /// Result with no side effects
    pub fn new(new_state: StateMachineState, continuation: FlowContinuation) -> Self {
        TransitionResult {
            new_state,
            actions: Vec::new(),
            continuation,
        }
    }

    /// Append an action
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }
}

/// Carries out actions
///
/// Implemented by the host (storage, messaging); failures are reported with
/// `anyhow` and recorded in the flow's error state.
pub trait ActionExecutor: Send + Sync {
    /// Execute one action for `fiber`
    fn execute_action(&self, fiber: &dyn FlowFiber, action: &Action) -> anyhow::Result<()>;
}
