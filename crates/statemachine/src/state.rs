//! Flow state model
//!
//! A flow's durable state is a [`Checkpoint`]; the in-memory wrapper
//! [`StateMachineState`] adds the runtime flags the executor needs. Once a
//! flow has started, its suspended computation lives in the checkpoint as a
//! frozen [`FiberSnapshot`]: a resume point plus the captured locals.

use crate::error::Result;
use crate::event::FlowIoRequest;
use ledgerflow_core::{FlowId, SerializedBytes, ThrowableValue};
use ledgerflow_serialization::{
    AnyObject, Encodable, FieldReader, FieldWriter, Portable, ResolutionScope,
    SerializationEnvironment,
};
use std::collections::BTreeMap;

/// Where a suspended flow continues
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumePoint {
    /// Suspension label, unique within the flow
    pub label: String,
    /// Step counter at suspension
    pub step: u32,
}

impl Encodable for ResumePoint {}

impl Portable for ResumePoint {
    const TYPE_NAME: &'static str = "flow.ResumePoint";

    fn write_fields(&self, fields: &mut FieldWriter<'_, '_>) -> ledgerflow_serialization::Result<()> {
        fields.field("label", &self.label)?;
        fields.field("step", &self.step)
    }

    fn read_fields(fields: &mut FieldReader<'_, '_>) -> ledgerflow_serialization::Result<Self> {
        Ok(ResumePoint {
            label: fields.field("label")?,
            step: fields.field("step")?,
        })
    }
}

/// Explicit continuation of a suspended flow
#[derive(Debug, Clone)]
pub struct FiberSnapshot {
    /// Flow being captured
    pub flow_id: FlowId,
    /// Flow logic type name
    pub flow_class: String,
    /// Where to continue
    pub resume_point: ResumePoint,
    /// Captured local state by name
    pub locals: BTreeMap<String, AnyObject>,
}

impl FiberSnapshot {
    /// Snapshot with no locals
    pub fn new(flow_id: FlowId, flow_class: impl Into<String>, resume_point: ResumePoint) -> Self {
        FiberSnapshot {
            flow_id,
            flow_class: flow_class.into(),
            resume_point,
            locals: BTreeMap::new(),
        }
    }

    /// Add a captured local
    pub fn with_local<T: Encodable>(mut self, name: impl Into<String>, value: T) -> Self {
        self.locals.insert(name.into(), AnyObject::new(value));
        self
    }

    /// Serialize with the environment's checkpoint context
    pub fn freeze(&self, environment: &SerializationEnvironment) -> Result<SerializedBytes<FiberSnapshot>> {
        Ok(environment.checkpoint_serialize(self)?)
    }

    /// Deserialize with the environment's checkpoint context
    pub fn thaw(
        frozen: &SerializedBytes<FiberSnapshot>,
        environment: &SerializationEnvironment,
    ) -> Result<FiberSnapshot> {
        Ok(environment.checkpoint_deserialize(frozen.as_bytes())?)
    }
}

impl Encodable for FiberSnapshot {}

impl Portable for FiberSnapshot {
    const TYPE_NAME: &'static str = "flow.FiberSnapshot";

    fn write_fields(&self, fields: &mut FieldWriter<'_, '_>) -> ledgerflow_serialization::Result<()> {
        fields.field("flowId", &self.flow_id)?;
        fields.field("flowClass", &self.flow_class)?;
        fields.field("resumePoint", &self.resume_point)?;
        fields.field("locals", &self.locals)
    }

    fn read_fields(fields: &mut FieldReader<'_, '_>) -> ledgerflow_serialization::Result<Self> {
        Ok(FiberSnapshot {
            flow_id: fields.field("flowId")?,
            flow_class: fields.field("flowClass")?,
            resume_point: fields.field("resumePoint")?,
            locals: fields.field("locals")?,
        })
    }
}

/// Resolution scope holding the framework's own checkpoint types
///
/// Applications load their local types into the returned scope.
pub fn checkpoint_scope(label: &str) -> ResolutionScope {
    ResolutionScope::new(label)
        .with::<FiberSnapshot>()
        .with::<ResumePoint>()
}

/// A frozen fiber
pub type FrozenFiber = SerializedBytes<FiberSnapshot>;

/// Lifecycle of a flow's computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    /// Created, not yet run
    Unstarted {
        /// Flow logic type name
        flow_class: String,
    },
    /// Suspended at least once
    Started {
        /// What the flow is waiting for
        flow_io_request: FlowIoRequest,
        /// Serialized continuation
        frozen_fiber: FrozenFiber,
    },
}

impl FlowState {
    /// Frozen fiber, if started
    pub fn frozen_fiber(&self) -> Option<&FrozenFiber> {
        match self {
            FlowState::Started { frozen_fiber, .. } => Some(frozen_fiber),
            FlowState::Unstarted { .. } => None,
        }
    }
}

/// One error raised inside a flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowError {
    /// Process-unique error id
    pub error_id: u64,
    /// Captured error
    pub exception: ThrowableValue,
}

/// Accumulated errors of a flow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ErrorState {
    /// No errors
    #[default]
    Clean,
    /// At least one error
    Errored {
        /// Errors in the order they were raised
        errors: Vec<FlowError>,
    },
}

impl ErrorState {
    /// Copy with `error` appended
    pub fn add_error(&self, error: FlowError) -> ErrorState {
        let mut errors = self.errors().to_vec();
        errors.push(error);
        ErrorState::Errored { errors }
    }

    /// Errors so far
    pub fn errors(&self) -> &[FlowError] {
        match self {
            ErrorState::Clean => &[],
            ErrorState::Errored { errors } => errors,
        }
    }

    /// True if any error was recorded
    pub fn is_errored(&self) -> bool {
        matches!(self, ErrorState::Errored { .. })
    }
}

/// Durable state of a flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    /// Computation state
    pub flow_state: FlowState,
    /// Errors
    pub error_state: ErrorState,
    /// How many times the flow has suspended
    pub number_of_suspends: u32,
}

impl Checkpoint {
    /// Checkpoint of a flow that has not run
    pub fn unstarted(flow_class: impl Into<String>) -> Self {
        Checkpoint {
            flow_state: FlowState::Unstarted {
                flow_class: flow_class.into(),
            },
            error_state: ErrorState::Clean,
            number_of_suspends: 0,
        }
    }
}

/// In-memory state of a flow between transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMachineState {
    /// Durable part
    pub checkpoint: Checkpoint,
    /// True while the fiber runs
    pub is_flow_resumed: bool,
    /// True once the flow has been removed
    pub is_removed: bool,
}

impl StateMachineState {
    /// State wrapping a checkpoint
    pub fn new(checkpoint: Checkpoint) -> Self {
        StateMachineState {
            checkpoint,
            is_flow_resumed: false,
            is_removed: false,
        }
    }

    /// Frozen fiber of the checkpoint, if started
    pub fn frozen_fiber(&self) -> Option<&FrozenFiber> {
        self.checkpoint.flow_state.frozen_fiber()
    }
}
