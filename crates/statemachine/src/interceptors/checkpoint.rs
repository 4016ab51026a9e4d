//! Checkpoint verifying interceptor

use crate::event::Event;
use crate::executor::TransitionExecutor;
use crate::fiber::FlowFiber;
use crate::state::{FlowState, StateMachineState};
use crate::transition::{ActionExecutor, FlowContinuation, TransitionResult};
use crate::verifier::CheckpointVerifier;
use ledgerflow_core::FlowId;
use std::sync::Arc;

/// Hands every newly frozen fiber to a [`CheckpointVerifier`]
///
/// A fiber is new when the next state is started and the previous state was
/// not started or held a different fiber. The delegate's result is returned
/// unchanged.
pub struct CheckpointVerifyingInterceptor {
    verifier: Arc<CheckpointVerifier>,
    delegate: Box<dyn TransitionExecutor>,
}

impl CheckpointVerifyingInterceptor {
    /// Wrap `delegate`
    pub fn new(verifier: Arc<CheckpointVerifier>, delegate: Box<dyn TransitionExecutor>) -> Self {
        CheckpointVerifyingInterceptor { verifier, delegate }
    }
}

impl TransitionExecutor for CheckpointVerifyingInterceptor {
    fn execute_transition(
        &self,
        fiber: &dyn FlowFiber,
        previous_state: &StateMachineState,
        event: &Event,
        transition: TransitionResult,
        action_executor: &dyn ActionExecutor,
    ) -> (FlowContinuation, StateMachineState) {
        let (continuation, next_state) = self.delegate.execute_transition(
            fiber,
            previous_state,
            event,
            transition,
            action_executor,
        );
        if let FlowState::Started { frozen_fiber, .. } = &next_state.checkpoint.flow_state {
            let unchanged = previous_state.frozen_fiber() == Some(frozen_fiber);
            if !unchanged {
                self.verifier.submit_check(frozen_fiber.clone());
            }
        }
        (continuation, next_state)
    }

    fn force_remove_flow(&self, id: FlowId) {
        self.delegate.force_remove_flow(id);
    }
}
