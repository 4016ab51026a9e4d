//! Running flow handle

use ledgerflow_core::FlowId;

/// The running computation of a flow, as seen by executors
pub trait FlowFiber: Send + Sync {
    /// Flow id
    fn id(&self) -> FlowId;

    /// Flow logic type name
    fn flow_class(&self) -> &str;
}
