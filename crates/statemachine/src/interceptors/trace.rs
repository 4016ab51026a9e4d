//! Transition logging

use crate::event::Event;
use crate::executor::TransitionExecutor;
use crate::fiber::FlowFiber;
use crate::state::StateMachineState;
use crate::transition::{ActionExecutor, FlowContinuation, TransitionResult};
use ledgerflow_core::FlowId;
use tracing::debug;

/// Logs every transition at `debug`
pub struct TracingInterceptor {
    delegate: Box<dyn TransitionExecutor>,
}

impl TracingInterceptor {
    /// Wrap `delegate`
    pub fn new(delegate: Box<dyn TransitionExecutor>) -> Self {
        TracingInterceptor { delegate }
    }
}

impl TransitionExecutor for TracingInterceptor {
    fn execute_transition(
        &self,
        fiber: &dyn FlowFiber,
        previous_state: &StateMachineState,
        event: &Event,
        transition: TransitionResult,
        action_executor: &dyn ActionExecutor,
    ) -> (FlowContinuation, StateMachineState) {
        let actions = transition.actions.len();
        let (continuation, next_state) = self.delegate.execute_transition(
            fiber,
            previous_state,
            event,
            transition,
            action_executor,
        );
        debug!(
            flow = %fiber.id(),
            flow_class = fiber.flow_class(),
            event = event.name(),
            actions,
            continuation = ?continuation,
            suspends = next_state.checkpoint.number_of_suspends,
            "transition"
        );
        (continuation, next_state)
    }

    fn force_remove_flow(&self, id: FlowId) {
        debug!(flow = %id, "force remove");
        self.delegate.force_remove_flow(id);
    }
}
