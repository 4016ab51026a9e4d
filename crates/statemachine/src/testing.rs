//! Test doubles shared by the unit tests

use crate::event::{Event, FlowIoRequest};
use crate::executor::TransitionExecutor;
use crate::fiber::FlowFiber;
use crate::state::{checkpoint_scope, Checkpoint, FlowState, FrozenFiber, StateMachineState};
use crate::transition::{Action, ActionExecutor, FlowContinuation, TransitionResult};
use ledgerflow_core::FlowId;
use ledgerflow_serialization::{
    checkpoint_context, CheckpointSerializationScheme, SerializationContext,
    SerializationEnvironment, SerializationPlugins,
};
use parking_lot::Mutex;
use std::sync::Arc;

pub(crate) struct TestFiber {
    id: FlowId,
}

impl TestFiber {
    pub(crate) fn new() -> Self {
        TestFiber { id: FlowId::new() }
    }
}

impl FlowFiber for TestFiber {
    fn id(&self) -> FlowId {
        self.id
    }

    fn flow_class(&self) -> &str {
        "app.Pay"
    }
}

/// Records executed action names; fails on one of them
#[derive(Default)]
pub(crate) struct RecordingActions {
    fail_on: Option<&'static str>,
    executed: Mutex<Vec<&'static str>>,
}

impl RecordingActions {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_on(name: &'static str) -> Self {
        RecordingActions {
            fail_on: Some(name),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn executed(&self) -> Vec<&'static str> {
        self.executed.lock().clone()
    }
}

impl ActionExecutor for RecordingActions {
    fn execute_action(&self, _: &dyn FlowFiber, action: &Action) -> anyhow::Result<()> {
        self.executed.lock().push(action.name());
        if self.fail_on == Some(action.name()) {
            anyhow::bail!("{} refused", action.name());
        }
        Ok(())
    }
}

/// Innermost executor that applies the transition as given and counts
/// force removals
#[derive(Default)]
pub(crate) struct PassThrough {
    pub(crate) removed: Mutex<Vec<FlowId>>,
}

impl TransitionExecutor for PassThrough {
    fn execute_transition(
        &self,
        _: &dyn FlowFiber,
        _: &StateMachineState,
        _: &Event,
        transition: TransitionResult,
        _: &dyn ActionExecutor,
    ) -> (FlowContinuation, StateMachineState) {
        (transition.continuation, transition.new_state)
    }

    fn force_remove_flow(&self, id: FlowId) {
        self.removed.lock().push(id);
    }
}

pub(crate) fn unstarted() -> StateMachineState {
    StateMachineState::new(Checkpoint::unstarted("app.Pay"))
}

pub(crate) fn started(fiber: FrozenFiber) -> StateMachineState {
    StateMachineState::new(Checkpoint {
        flow_state: FlowState::Started {
            flow_io_request: FlowIoRequest::ForceCheckpoint,
            frozen_fiber: fiber,
        },
        error_state: Default::default(),
        number_of_suspends: 1,
    })
}

pub(crate) fn to(state: StateMachineState) -> TransitionResult {
    TransitionResult::new(state, FlowContinuation::ProcessEvents)
}

/// Environment with only the checkpoint scheme, plus its checkpoint context
pub(crate) fn checkpoint_environment() -> (Arc<SerializationEnvironment>, SerializationContext) {
    let context = checkpoint_context(Arc::new(checkpoint_scope("test")));
    let environment = SerializationEnvironment::builder()
        .scheme(Arc::new(CheckpointSerializationScheme::new(Arc::new(
            SerializationPlugins::new(),
        ))))
        .context(context.clone())
        .build();
    (Arc::new(environment), context)
}
