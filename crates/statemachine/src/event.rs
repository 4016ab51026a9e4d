//! Flow events and I/O requests

use crate::state::FrozenFiber;
use chrono::{DateTime, Utc};
use ledgerflow_core::{OpaqueBytes, SecureHash, ThrowableValue};
use std::fmt;

/// Session identifier between two flows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// What a suspended flow is waiting for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowIoRequest {
    /// Send messages, then continue
    Send {
        /// Messages per session
        messages: Vec<(SessionId, OpaqueBytes)>,
    },
    /// Wait for a message on each session
    Receive {
        /// Sessions to receive from
        sessions: Vec<SessionId>,
    },
    /// Wait until a transaction is committed
    WaitForLedgerCommit {
        /// Transaction id
        tx_id: SecureHash,
    },
    /// Sleep until a point in time
    Sleep {
        /// Wake-up time
        until: DateTime<Utc>,
    },
    /// Persist a checkpoint and continue immediately
    ForceCheckpoint,
}

/// Input to a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Process pending work without new input
    DoRemainingWork,
    /// The fiber suspended
    Suspend {
        /// What it waits for
        io_request: FlowIoRequest,
        /// Serialized continuation
        fiber: FrozenFiber,
    },
    /// A session message arrived
    DeliverSessionMessage {
        /// Session
        session: SessionId,
        /// Message body
        payload: OpaqueBytes,
    },
    /// The flow raised an error
    Error(ThrowableValue),
    /// The flow returned
    FlowFinish {
        /// Serialized result
        result: OpaqueBytes,
    },
    /// The node is shutting down
    SoftShutdown,
}

impl Event {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Event::DoRemainingWork => "DoRemainingWork",
            Event::Suspend { .. } => "Suspend",
            Event::DeliverSessionMessage { .. } => "DeliverSessionMessage",
            Event::Error(_) => "Error",
            Event::FlowFinish { .. } => "FlowFinish",
            Event::SoftShutdown => "SoftShutdown",
        }
    }
}
