//! Serialization schemes
//!
//! A scheme owns one envelope format (identified by its magic), decides
//! which use cases it serves and hands out the [`SerializerFactory`] for a
//! [`SerializationContext`].
//!
//! Both schemes in this crate keep factories in a [`FactoryCache`]: one
//! factory per (policy, scope) pair, created on first request, never
//! evicted. Every request re-runs [`StandardRegistration`] against the
//! cached factory; registration is idempotent, so racing first requests and
//! plugins added after the first request are both safe.

mod checkpoint;
mod object_graph;

pub use checkpoint::{checkpoint_context, CheckpointSerializationScheme, CHECKPOINT_MAGIC};
pub use object_graph::{
    ClientRole, ClientSerializationScheme, ObjectGraphScheme, RpcRole, ServerRole,
    ServerSerializationScheme, OBJECT_GRAPH_MAGIC,
};

use crate::builtins::{security_serializers, standard_serializers, PublicKeySerializer};
use crate::codec::Encodable;
use crate::context::SerializationContext;
use crate::error::Result;
use crate::factory::{FactoryKey, SerializerFactory};
use crate::plugins::SerializationPlugins;
use crate::serializer::Serializer;
use dashmap::DashMap;
use ledgerflow_core::{SerializationMagic, SerializedBytes, UseCase};
use std::sync::Arc;
use tracing::{debug, warn};

/// An envelope format plus its factory selection rules
pub trait SerializationScheme: Send + Sync {
    /// Scheme name, used in errors and logs
    fn name(&self) -> &str;

    /// Magic written by this scheme
    fn magic(&self) -> SerializationMagic;

    /// True if this scheme reads `magic` for `use_case`
    fn can_deserialize_version(&self, magic: SerializationMagic, use_case: UseCase) -> bool;

    /// Factory for a context
    ///
    /// Fails for use cases the scheme does not serve.
    fn serializer_factory(&self, context: &SerializationContext) -> Result<Arc<SerializerFactory>>;
}

/// Typed serialize / deserialize on any scheme
pub trait SerializationSchemeExt: SerializationScheme {
    /// Encode `value` under this scheme's magic
    fn serialize<T: Encodable>(
        &self,
        value: &T,
        context: &SerializationContext,
    ) -> Result<SerializedBytes<T>> {
        self.serializer_factory(context)?.serialize(value, self.magic())
    }

    /// Decode a `T`
    ///
    /// Factory selection comes first, so a refused use case is reported even
    /// when the bytes carry another scheme's magic.
    fn deserialize<T: Encodable>(&self, bytes: &[u8], context: &SerializationContext) -> Result<T> {
        self.serializer_factory(context)?.deserialize(bytes, self.magic())
    }
}

impl<S: SerializationScheme + ?Sized> SerializationSchemeExt for S {}

/// The registration sequence every factory goes through
pub struct StandardRegistration {
    plugins: Arc<SerializationPlugins>,
    public_key_serializer: Arc<dyn Serializer>,
}

impl StandardRegistration {
    /// Registration with the built-in public-key serializer
    pub fn new(plugins: Arc<SerializationPlugins>) -> Self {
        Self::with_public_key_serializer(plugins, Arc::new(PublicKeySerializer))
    }

    /// Registration with a deployment-specific public-key serializer
    pub fn with_public_key_serializer(
        plugins: Arc<SerializationPlugins>,
        public_key_serializer: Arc<dyn Serializer>,
    ) -> Self {
        StandardRegistration {
            plugins,
            public_key_serializer,
        }
    }

    /// Plugin registry read on every run
    pub fn plugins(&self) -> &Arc<SerializationPlugins> {
        &self.plugins
    }

    /// Register, in order: standard built-ins, the designated public-key
    /// serializer, security built-ins, plugin whitelists, plugin serializers
    ///
    /// A plugin serializer that fails to register is logged and skipped.
    pub fn apply(&self, factory: &SerializerFactory) -> Result<()> {
        for serializer in standard_serializers() {
            factory.register_default(serializer)?;
        }
        factory.register_default(Arc::clone(&self.public_key_serializer))?;
        for serializer in security_serializers() {
            factory.register_default(serializer)?;
        }
        self.plugins.apply_whitelists(factory.policy())?;
        for contributed in self.plugins.serializers() {
            if let Err(e) = factory.register(contributed.serializer) {
                warn!(
                    source = %contributed.source,
                    error = %e,
                    "skipping plugin serializer"
                );
            }
        }
        Ok(())
    }
}

/// Factories by (policy, scope), never evicted
#[derive(Default)]
pub struct FactoryCache {
    factories: DashMap<FactoryKey, Arc<SerializerFactory>>,
}

impl FactoryCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached factory for the context, created on first request, with
    /// `registration` applied on every request
    pub fn get_or_create(
        &self,
        context: &SerializationContext,
        registration: &StandardRegistration,
    ) -> Result<Arc<SerializerFactory>> {
        let key = context.factory_key();
        // the map guard must be gone before registration runs
        let factory = Arc::clone(
            self.factories
                .entry(key)
                .or_insert_with(|| {
                    debug!(policy = %key.policy, scope = %key.scope, "creating serializer factory");
                    Arc::new(SerializerFactory::new(
                        Arc::clone(context.policy()),
                        Arc::clone(context.scope()),
                    ))
                })
                .value(),
        );
        registration.apply(&factory)?;
        Ok(factory)
    }

    /// Number of cached factories
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// True if nothing has been created yet
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
