//! Checkpoint Verification Tests
//!
//! Frozen fibers flow through the node's executor chain; the background
//! verifier must try every new one and report the unreadable ones at stop.

use crate::*;
use ledgerflow_statemachine::{Checkpoint, FlowIoRequest, FrozenFiber};

fn started(frozen_fiber: FrozenFiber, suspends: u32) -> StateMachineState {
    let mut checkpoint = Checkpoint::unstarted("app.PayFlow");
    checkpoint.flow_state = FlowState::Started {
        flow_io_request: FlowIoRequest::ForceCheckpoint,
        frozen_fiber,
    };
    checkpoint.number_of_suspends = suspends;
    StateMachineState::new(checkpoint)
}

/// Run `previous -> next` through the node's chain and return the new state
fn transition(
    node: &Node,
    fiber: &TestFiber,
    previous: &StateMachineState,
    next: StateMachineState,
) -> StateMachineState {
    let (continuation, state) = node.executor().execute_transition(
        fiber,
        previous,
        &Event::DoRemainingWork,
        TransitionResult::new(next, FlowContinuation::ProcessEvents),
        &AcceptAll,
    );
    assert_eq!(continuation, FlowContinuation::ProcessEvents);
    state
}

// =============================================================================
// ALL CHECKS ATTEMPTED
// =============================================================================

#[test]
fn test_every_new_checkpoint_checked_before_stop() {
    let node = dev_node();
    node.start().unwrap();
    let fiber = TestFiber(FlowId::new());

    let mut state = StateMachineState::new(Checkpoint::unstarted("app.PayFlow"));
    for step in 1..=20 {
        let frozen = node.freeze(&snapshot(fiber.0, step)).unwrap();
        state = transition(&node, &fiber, &state, started(frozen, step));
    }

    let report = node.stop();
    assert!(!report.unrestorable_checkpoints);
    assert_eq!(report.checks_completed, 20);
}

#[test]
fn test_verified_fiber_thaws_to_same_snapshot() {
    let node = dev_node();
    let flow = FlowId::new();
    let original = snapshot(flow, 3);
    let frozen = node.freeze(&original).unwrap();

    let thawed = FiberSnapshot::thaw(&frozen, node.environment()).unwrap();
    assert_eq!(thawed.flow_id, flow);
    assert_eq!(thawed.resume_point.step, 3);
    let payment = thawed.locals["payment"].downcast_ref::<Payment>().unwrap();
    assert_eq!(payment.cents, 1250);
}

// =============================================================================
// UNRESTORABLE CHECKPOINTS
// =============================================================================

#[test]
fn test_corrupted_fiber_reported_at_stop() {
    let node = dev_node();
    node.start().unwrap();
    let fiber = TestFiber(FlowId::new());

    let mut bytes = node.freeze(&snapshot(fiber.0, 1)).unwrap().as_bytes().to_vec();
    bytes.truncate(bytes.len() / 2);
    let unstarted = StateMachineState::new(Checkpoint::unstarted("app.PayFlow"));
    transition(&node, &fiber, &unstarted, started(FrozenFiber::from(bytes), 1));

    let report = node.stop();
    assert!(report.unrestorable_checkpoints);
    assert_eq!(report.checks_completed, 1);
}

#[test]
fn test_local_of_unloaded_type_fails_to_freeze() {
    #[derive(Debug, Clone, PartialEq)]
    struct Receipt(i64);

    impl Encodable for Receipt {}

    impl Portable for Receipt {
        const TYPE_NAME: &'static str = "app.Receipt";

        fn write_fields(&self, fields: &mut FieldWriter<'_, '_>) -> SerResult<()> {
            fields.field("number", &self.0)
        }

        fn read_fields(fields: &mut FieldReader<'_, '_>) -> SerResult<Self> {
            Ok(Receipt(fields.field("number")?))
        }
    }

    let node = dev_node();
    let fiber = snapshot(FlowId::new(), 1).with_local("receipt", Receipt(7));
    let err = node.freeze(&fiber).unwrap_err();
    assert!(matches!(err, Error::Serialization(_)));
}

// =============================================================================
// UNCHANGED CHECKPOINTS
// =============================================================================

#[test]
fn test_unchanged_fiber_checked_once() {
    let node = dev_node();
    node.start().unwrap();
    let fiber = TestFiber(FlowId::new());

    let frozen = node.freeze(&snapshot(fiber.0, 1)).unwrap();
    let unstarted = StateMachineState::new(Checkpoint::unstarted("app.PayFlow"));
    let first = transition(&node, &fiber, &unstarted, started(frozen.clone(), 1));
    let second = transition(&node, &fiber, &first, started(frozen.clone(), 1));
    transition(&node, &fiber, &second, started(frozen, 1));

    assert_eq!(node.stop().checks_completed, 1);
}

#[test]
fn test_production_node_skips_verification() {
    let node = Node::builder()
        .whitelist(Arc::new(PaymentWhitelist))
        .load::<Payment>()
        .build()
        .unwrap();
    node.start().unwrap();
    let fiber = TestFiber(FlowId::new());
    let unstarted = StateMachineState::new(Checkpoint::unstarted("app.PayFlow"));
    transition(
        &node,
        &fiber,
        &unstarted,
        started(FrozenFiber::from(vec![0u8; 8]), 1),
    );
    assert_eq!(node.stop(), ShutdownReport::default());
}
