//! Flow Checkpoint Test Suite
//!
//! End-to-end tests for the node: type admission across schemes, background
//! checkpoint verification driven through the executor chain, and built-in
//! value round-trips through the node's contexts.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test flow_checkpoints
//!
//! # Verification tests only
//! cargo test --test flow_checkpoints verification::
//! ```

use std::sync::Arc;

use ledgerflow::prelude::*;
use ledgerflow_serialization::Result as SerResult;

// Test modules
pub mod admission;
pub mod builtins;
pub mod verification;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// Install a test subscriber once; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Application type used as a flow local
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub payee: String,
    pub cents: i64,
}

impl Encodable for Payment {}

impl Portable for Payment {
    const TYPE_NAME: &'static str = "app.Payment";

    fn write_fields(&self, fields: &mut FieldWriter<'_, '_>) -> SerResult<()> {
        fields.field("payee", &self.payee)?;
        fields.field("cents", &self.cents)
    }

    fn read_fields(fields: &mut FieldReader<'_, '_>) -> SerResult<Self> {
        Ok(Payment {
            payee: fields.field("payee")?,
            cents: fields.field("cents")?,
        })
    }
}

/// Admits [`Payment`]
pub struct PaymentWhitelist;

impl WhitelistContributor for PaymentWhitelist {
    fn name(&self) -> &str {
        "payments"
    }

    fn whitelist(&self) -> Vec<String> {
        vec![Payment::TYPE_NAME.to_string()]
    }
}

/// Development node that knows about [`Payment`]
pub fn dev_node() -> Node {
    init_tracing();
    Node::builder()
        .options(NodeOptions::development())
        .whitelist(Arc::new(PaymentWhitelist))
        .load::<Payment>()
        .build()
        .expect("node should build")
}

/// Minimal running flow
pub struct TestFiber(pub FlowId);

impl FlowFiber for TestFiber {
    fn id(&self) -> FlowId {
        self.0
    }

    fn flow_class(&self) -> &str {
        "app.PayFlow"
    }
}

/// Action executor that accepts everything
pub struct AcceptAll;

impl ActionExecutor for AcceptAll {
    fn execute_action(&self, _: &dyn FlowFiber, _: &Action) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Snapshot of a payment flow at `step`
pub fn snapshot(flow: FlowId, step: u32) -> FiberSnapshot {
    FiberSnapshot::new(
        flow,
        "app.PayFlow",
        ResumePoint {
            label: "await-confirmation".to_string(),
            step,
        },
    )
    .with_local(
        "payment",
        Payment {
            payee: "bob".to_string(),
            cents: 1250,
        },
    )
    .with_local("attempt", i64::from(step))
}
