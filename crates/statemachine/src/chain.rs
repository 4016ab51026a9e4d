//! Executor chain assembly

use crate::executor::{TransitionExecutor, TransitionExecutorImpl};
use crate::interceptors::{CheckpointVerifyingInterceptor, HistoryInterceptor, TracingInterceptor};
use crate::verifier::CheckpointVerifier;
use std::sync::Arc;
use tracing::debug;

/// Which interceptors wrap the terminal executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMachineOptions {
    /// Development mode: keeps per-flow history
    pub dev_mode: bool,
    /// Verify every new checkpoint in the background
    pub verify_checkpoints: bool,
    /// Log each transition
    pub trace_transitions: bool,
    /// Transitions kept per flow in development mode
    pub history_limit: usize,
}

impl Default for StateMachineOptions {
    fn default() -> Self {
        StateMachineOptions {
            dev_mode: false,
            verify_checkpoints: false,
            trace_transitions: false,
            history_limit: 64,
        }
    }
}

/// Assemble the executor chain, innermost first: terminal executor, history
/// (dev mode), tracing, checkpoint verification
///
/// Verification is only wired in when `verifier` is given and enabled.
pub fn build_executor_chain(
    options: &StateMachineOptions,
    verifier: Option<Arc<CheckpointVerifier>>,
) -> Box<dyn TransitionExecutor> {
    let mut executor: Box<dyn TransitionExecutor> = Box::new(TransitionExecutorImpl::new());
    let mut layers = vec!["terminal"];
    if options.dev_mode {
        executor = Box::new(HistoryInterceptor::new(options.history_limit, executor));
        layers.push("history");
    }
    if options.trace_transitions {
        executor = Box::new(TracingInterceptor::new(executor));
        layers.push("tracing");
    }
    if let Some(verifier) = verifier.filter(|_| options.verify_checkpoints) {
        executor = Box::new(CheckpointVerifyingInterceptor::new(verifier, executor));
        layers.push("checkpoint-verification");
    }
    debug!(layers = ?layers, "executor chain built");
    executor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::fiber::FlowFiber;
    use crate::testing::{checkpoint_environment, started, to, unstarted, RecordingActions, TestFiber};
    use ledgerflow_core::SerializedBytes;

    /// Drives one unstarted -> started transition through a chain built
    /// from `options` and returns how many checks the verifier ran
    fn checks_after_one_start(options: &StateMachineOptions) -> u64 {
        let (environment, context) = checkpoint_environment();
        let verifier = Arc::new(CheckpointVerifier::new());
        verifier.start(environment, context).unwrap();
        let chain = build_executor_chain(options, Some(Arc::clone(&verifier)));
        chain.execute_transition(
            &TestFiber::new(),
            &unstarted(),
            &Event::DoRemainingWork,
            to(started(SerializedBytes::from(vec![0u8; 4]))),
            &RecordingActions::new(),
        );
        verifier.stop();
        verifier.checks_completed()
    }

    #[test]
    fn test_verification_wired_when_enabled() {
        let options = StateMachineOptions {
            verify_checkpoints: true,
            ..Default::default()
        };
        assert_eq!(checks_after_one_start(&options), 1);
    }

    #[test]
    fn test_verification_skipped_when_disabled() {
        assert_eq!(checks_after_one_start(&StateMachineOptions::default()), 0);
    }

    #[test]
    fn test_full_chain() {
        let options = StateMachineOptions {
            dev_mode: true,
            verify_checkpoints: true,
            trace_transitions: true,
            history_limit: 4,
        };
        assert_eq!(checks_after_one_start(&options), 1);

        let chain = build_executor_chain(&options, None);
        chain.force_remove_flow(TestFiber::new().id());
    }
}
