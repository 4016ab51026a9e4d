//! # Ledgerflow
//!
//! Durable flow execution core for a permissioned ledger node.
//!
//! Flows run as suspendable computations whose execution state is frozen into
//! checkpoints. Ledgerflow provides the pieces that keep those checkpoints
//! trustworthy: a versioned serialization framework with type admission and
//! custom serializers, an interceptor-chained transition executor, and a
//! background verifier that deserializes every new checkpoint.
//!
//! ## Quick Start
//!
//! ```ignore
//! use ledgerflow::prelude::*;
//!
//! let node = Node::builder()
//!     .options(NodeOptions::development())
//!     .load::<MyLocal>()
//!     .build()?;
//! node.start()?;
//!
//! let frozen = node.freeze(&snapshot)?;
//! // drive transitions through node.executor()
//!
//! let report = node.stop();
//! assert!(!report.unrestorable_checkpoints);
//! ```
//!
//! ## Crates
//!
//! - [`ledgerflow_core`] - Value types shared by everything
//! - [`ledgerflow_serialization`] - Envelopes, admission, serializers, schemes
//! - [`ledgerflow_statemachine`] - Executors, interceptors, checkpoint verifier

#![warn(missing_docs)]

mod config;
mod error;
mod node;

pub mod prelude;

pub use config::NodeOptions;
pub use error::{Error, Result};
pub use node::{Node, NodeBuilder, ShutdownReport};

// Member crates
pub use ledgerflow_core;
pub use ledgerflow_serialization;
pub use ledgerflow_statemachine;
