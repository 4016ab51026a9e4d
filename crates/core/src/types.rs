//! Identifiers and serialization markers
//!
//! This module defines the fundamental types used throughout the system:
//! - [`FlowId`]: Unique identifier for flows
//! - [`UseCase`]: Which call context a serialization is performed for
//! - [`SerializationMagic`]: Envelope version marker
//! - [`ClassRef`]: A reference to a type by its portable name

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a flow
///
/// FlowId is used throughout the system to identify individual flows.
/// It's used in:
/// - Checkpoint persistence
/// - Transition history
/// - Frozen fiber snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlowId(Uuid);

impl FlowId {
    /// Create a new random FlowId using UUID v4
    ///
    /// # Examples
    ///
    /// ```
    /// use ledgerflow_core::FlowId;
    ///
    /// let id1 = FlowId::new();
    /// let id2 = FlowId::new();
    /// assert_ne!(id1, id2);
    /// ```
    pub fn new() -> Self {
        FlowId(Uuid::new_v4())
    }

    /// Create FlowId from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        FlowId(Uuid::from_bytes(bytes))
    }

    /// Get raw bytes representation
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for FlowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FlowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The call context a serialization is performed in
///
/// Schemes accept or reject work based on the use case; the object-graph
/// scheme for instance never handles [`UseCase::Checkpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UseCase {
    /// Peer-to-peer messaging between nodes
    P2P,
    /// Client side of an RPC connection
    RpcClient,
    /// Server side of an RPC connection
    RpcServer,
    /// Persistent storage (vault, transaction storage)
    Storage,
    /// Flow checkpoints
    Checkpoint,
}

impl UseCase {
    /// Every use case, in declaration order
    pub const ALL: [UseCase; 5] = [
        UseCase::P2P,
        UseCase::RpcClient,
        UseCase::RpcServer,
        UseCase::Storage,
        UseCase::Checkpoint,
    ];
}

impl std::fmt::Display for UseCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UseCase::P2P => "P2P",
            UseCase::RpcClient => "RPCClient",
            UseCase::RpcServer => "RPCServer",
            UseCase::Storage => "Storage",
            UseCase::Checkpoint => "Checkpoint",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Serialization magic
// =============================================================================

/// Length of the magic marker in bytes
pub const MAGIC_LEN: usize = 7;

/// Fixed prefix shared by every ledgerflow envelope
pub const MAGIC_PREFIX: &[u8; 5] = b"lflow";

/// Version marker written at the start of every serialized envelope
///
/// Layout: 5-byte `lflow` prefix, one byte encoding family, one byte major
/// version. Matching is a plain byte-prefix comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SerializationMagic([u8; MAGIC_LEN]);

impl SerializationMagic {
    /// Build the magic for an encoding family and major version
    pub const fn new(family: u8, version: u8) -> Self {
        let p = MAGIC_PREFIX;
        SerializationMagic([p[0], p[1], p[2], p[3], p[4], family, version])
    }

    /// Read the magic from the start of a buffer
    ///
    /// Returns `None` if the buffer is shorter than the marker or does not
    /// carry the ledgerflow prefix.
    pub fn from_prefix(bytes: &[u8]) -> Option<Self> {
        let head = bytes.get(..MAGIC_LEN)?;
        if !head.starts_with(MAGIC_PREFIX) {
            return None;
        }
        let mut magic = [0u8; MAGIC_LEN];
        magic.copy_from_slice(head);
        Some(SerializationMagic(magic))
    }

    /// True if `bytes` starts with exactly this marker
    pub fn matches(&self, bytes: &[u8]) -> bool {
        bytes.starts_with(&self.0)
    }

    /// Encoding family byte
    pub fn family(&self) -> u8 {
        self.0[5]
    }

    /// Major version byte
    pub fn version(&self) -> u8 {
        self.0[6]
    }

    /// Raw marker bytes
    pub fn as_bytes(&self) -> &[u8; MAGIC_LEN] {
        &self.0
    }
}

impl std::fmt::Display for SerializationMagic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "lflow/{}.{}", self.family(), self.version())
    }
}

// =============================================================================
// Class references
// =============================================================================

/// A reference to a type by its portable name
///
/// Deserializing a `ClassRef` requires the name to be resolvable in the
/// reader's scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassRef(String);

impl ClassRef {
    /// Create a reference, validating the name
    ///
    /// Names are dotted identifiers, e.g. `ledgerflow.FlowId`.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let valid = !name.is_empty()
            && name.split('.').all(|segment| {
                let mut chars = segment.chars();
                matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
                    && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
            });
        if !valid {
            return Err(CoreError::InvalidClassName(name));
        }
        Ok(ClassRef(name))
    }

    /// The referenced type name
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClassRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
