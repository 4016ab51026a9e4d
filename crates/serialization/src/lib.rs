//! Serialization framework for ledgerflow
//!
//! Values cross process and persistence boundaries as envelopes:
//! `[magic][bincode(schema, body)]`. This crate provides:
//! - Element model and envelope framing
//! - Admission policies (allow-lists) and resolution scopes (loaded types)
//! - `Encodable` / `Portable` traits and the serializer registry
//! - Built-in serializers for keys, certificates, decimals, calendar types, etc.
//! - Contributed serializers, isolated behind a panic barrier
//! - Serializer factories, cached per (policy, scope)
//! - Object-graph and checkpoint schemes, routed by magic

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod admission;
pub mod any;
pub mod builtins;
pub mod codec;
pub mod context;
pub mod custom;
pub mod element;
pub mod environment;
pub mod error;
pub mod factory;
pub mod native;
pub mod plugins;
pub mod registry;
pub mod scheme;
pub mod scope;
pub mod serializer;

pub use admission::{AdmissionMode, AdmissionPolicy, PolicyId};
pub use any::AnyObject;
pub use codec::{DeserializationInput, Encodable, FieldReader, FieldWriter, Portable, SerializationOutput};
pub use context::SerializationContext;
pub use custom::{Isolated, ProxyAdapter, ProxySerializer};
pub use element::{Element, Envelope, FieldNotation, Schema, TypeNotation};
pub use environment::{DefaultContexts, SerializationEnvironment, SerializationEnvironmentBuilder};
pub use error::{Result, SerializationError};
pub use factory::{FactoryKey, SerializerFactory};
pub use native::{register_native, NativeCodec};
pub use plugins::{DefaultWhitelist, SerializationPlugins, WhitelistContributor};
pub use registry::{Registration, SerializerRegistry};
pub use scheme::{
    checkpoint_context, CheckpointSerializationScheme, ClientSerializationScheme, ObjectGraphScheme,
    SerializationScheme, SerializationSchemeExt, ServerSerializationScheme, StandardRegistration,
    CHECKPOINT_MAGIC, OBJECT_GRAPH_MAGIC,
};
pub use scope::{ClassInfo, ResolutionScope, ScopeId};
pub use serializer::{Serializer, SerializerId, TypedSerializer};
