//! Per-flow transition history
//!
//! Keeps the last transitions of every live flow and dumps them at `warn`
//! when a flow records a new error, which is usually the first thing anyone
//! wants to see when a flow goes wrong in development.

use crate::event::Event;
use crate::executor::TransitionExecutor;
use crate::fiber::FlowFiber;
use crate::state::StateMachineState;
use crate::transition::{ActionExecutor, FlowContinuation, TransitionResult};
use dashmap::DashMap;
use ledgerflow_core::FlowId;
use std::collections::VecDeque;
use tracing::warn;

/// One recorded transition
#[derive(Debug, Clone)]
pub struct TransitionRecord {
    /// Event name
    pub event: &'static str,
    /// Action names, in order
    pub actions: Vec<&'static str>,
    /// Resulting continuation
    pub continuation: FlowContinuation,
    /// Errors recorded after the transition
    pub errors: usize,
}

/// Records transitions per flow, bounded by `limit`
pub struct HistoryInterceptor {
    limit: usize,
    histories: DashMap<FlowId, VecDeque<TransitionRecord>>,
    delegate: Box<dyn TransitionExecutor>,
}

impl HistoryInterceptor {
    /// Wrap `delegate`, keeping at most `limit` transitions per flow
    pub fn new(limit: usize, delegate: Box<dyn TransitionExecutor>) -> Self {
        HistoryInterceptor {
            limit: limit.max(1),
            histories: DashMap::new(),
            delegate,
        }
    }

    /// Recorded transitions of a flow, oldest first
    pub fn history(&self, id: FlowId) -> Vec<TransitionRecord> {
        self.histories
            .get(&id)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of flows with a history
    pub fn tracked_flows(&self) -> usize {
        self.histories.len()
    }
}

impl TransitionExecutor for HistoryInterceptor {
    fn execute_transition(
        &self,
        fiber: &dyn FlowFiber,
        previous_state: &StateMachineState,
        event: &Event,
        transition: TransitionResult,
        action_executor: &dyn ActionExecutor,
    ) -> (FlowContinuation, StateMachineState) {
        let actions: Vec<&'static str> = transition.actions.iter().map(|a| a.name()).collect();
        let (continuation, next_state) = self.delegate.execute_transition(
            fiber,
            previous_state,
            event,
            transition,
            action_executor,
        );
        let id = fiber.id();
        if next_state.is_removed {
            self.histories.remove(&id);
            return (continuation, next_state);
        }

        let errors = next_state.checkpoint.error_state.errors().len();
        let record = TransitionRecord {
            event: event.name(),
            actions,
            continuation: continuation.clone(),
            errors,
        };
        let mut history = self.histories.entry(id).or_default();
        if history.len() == self.limit {
            history.pop_front();
        }
        history.push_back(record);

        if errors > previous_state.checkpoint.error_state.errors().len() {
            let dump: Vec<String> = history
                .iter()
                .enumerate()
                .map(|(i, r)| format!("#{} {} {:?} -> {:?}", i, r.event, r.actions, r.continuation))
                .collect();
            warn!(
                flow = %id,
                flow_class = fiber.flow_class(),
                errors,
                history = %dump.join("; "),
                "flow errored"
            );
        }
        (continuation, next_state)
    }

    fn force_remove_flow(&self, id: FlowId) {
        self.histories.remove(&id);
        self.delegate.force_remove_flow(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::TransitionExecutorImpl;
    use crate::testing::{to, unstarted, RecordingActions, TestFiber};
    use crate::transition::Action;

    fn run(
        executor: &HistoryInterceptor,
        fiber: &TestFiber,
        actions: &RecordingActions,
        previous: &StateMachineState,
        transition: TransitionResult,
    ) -> StateMachineState {
        executor
            .execute_transition(fiber, previous, &Event::DoRemainingWork, transition, actions)
            .1
    }

    #[test]
    fn test_history_is_bounded() {
        let executor = HistoryInterceptor::new(3, Box::new(TransitionExecutorImpl::new()));
        let fiber = TestFiber::new();
        let actions = RecordingActions::new();
        let mut state = unstarted();
        for _ in 0..5 {
            state = run(&executor, &fiber, &actions, &state, to(unstarted()));
        }
        assert_eq!(executor.history(fiber.id()).len(), 3);
    }

    #[test]
    fn test_error_recorded_in_history() {
        let executor = HistoryInterceptor::new(8, Box::new(TransitionExecutorImpl::new()));
        let fiber = TestFiber::new();
        let actions = RecordingActions::failing_on("RemoveCheckpoint");
        let state = run(&executor, &fiber, &actions, &unstarted(), to(unstarted()));
        let failing = to(unstarted()).with_action(Action::RemoveCheckpoint { id: fiber.id() });
        let state = run(&executor, &fiber, &actions, &state, failing);

        assert!(state.checkpoint.error_state.is_errored());
        let history = executor.history(fiber.id());
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].actions, vec!["RemoveCheckpoint"]);
        assert_eq!(history[1].errors, 1);
        assert_eq!(history[1].continuation, FlowContinuation::ProcessEvents);
    }

    #[test]
    fn test_history_dropped_on_removal() {
        let executor = HistoryInterceptor::new(8, Box::new(TransitionExecutorImpl::new()));
        let fiber = TestFiber::new();
        let actions = RecordingActions::new();
        let state = run(&executor, &fiber, &actions, &unstarted(), to(unstarted()));
        assert_eq!(executor.tracked_flows(), 1);

        let mut removed = unstarted();
        removed.is_removed = true;
        run(&executor, &fiber, &actions, &state, to(removed));
        assert_eq!(executor.tracked_flows(), 0);
    }

    #[test]
    fn test_history_dropped_on_force_remove() {
        let executor = HistoryInterceptor::new(8, Box::new(TransitionExecutorImpl::new()));
        let fiber = TestFiber::new();
        run(&executor, &fiber, &RecordingActions::new(), &unstarted(), to(unstarted()));
        executor.force_remove_flow(fiber.id());
        assert!(executor.history(fiber.id()).is_empty());
    }
}
