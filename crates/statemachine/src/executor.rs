//! Transition executors
//!
//! [`TransitionExecutor`] is the seam the interceptors wrap. The innermost
//! executor, [`TransitionExecutorImpl`], runs the transition's actions and
//! turns a failed action into an error recorded on the previous state.

use crate::event::Event;
use crate::fiber::FlowFiber;
use crate::state::{FlowError, StateMachineState};
use crate::transition::{ActionExecutor, FlowContinuation, TransitionResult};
use ledgerflow_core::{FlowId, ThrowableValue};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

static NEXT_ERROR_ID: AtomicU64 = AtomicU64::new(1);

/// Executes computed transitions
pub trait TransitionExecutor: Send + Sync {
    /// Execute `transition`, returning what the fiber does next and the
    /// state the flow is in afterwards
    fn execute_transition(
        &self,
        fiber: &dyn FlowFiber,
        previous_state: &StateMachineState,
        event: &Event,
        transition: TransitionResult,
        action_executor: &dyn ActionExecutor,
    ) -> (FlowContinuation, StateMachineState);

    /// Drop everything held for a flow that is being removed out of band
    fn force_remove_flow(&self, id: FlowId);
}

/// Innermost executor
#[derive(Debug, Default)]
pub struct TransitionExecutorImpl;

impl TransitionExecutorImpl {
    /// New executor
    pub fn new() -> Self {
        TransitionExecutorImpl
    }
}

impl TransitionExecutor for TransitionExecutorImpl {
    fn execute_transition(
        &self,
        fiber: &dyn FlowFiber,
        previous_state: &StateMachineState,
        event: &Event,
        transition: TransitionResult,
        action_executor: &dyn ActionExecutor,
    ) -> (FlowContinuation, StateMachineState) {
        for action in &transition.actions {
            if let Err(e) = action_executor.execute_action(fiber, action) {
                warn!(
                    flow = %fiber.id(),
                    event = event.name(),
                    action = action.name(),
                    error = %format!("{:#}", e),
                    "action failed, recording flow error"
                );
                let error = FlowError {
                    error_id: NEXT_ERROR_ID.fetch_add(1, Ordering::Relaxed),
                    exception: ThrowableValue::capture::<dyn std::error::Error + Send + Sync>(e.as_ref()),
                };
                let mut state = previous_state.clone();
                state.checkpoint.error_state = state.checkpoint.error_state.add_error(error);
                state.is_flow_resumed = false;
                return (FlowContinuation::ProcessEvents, state);
            }
        }
        (transition.continuation, transition.new_state)
    }

    fn force_remove_flow(&self, id: FlowId) {
        debug!(flow = %id, "force removing flow");
    }
}
