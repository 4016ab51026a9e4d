//! Serialization environment
//!
//! The process-wide entry point: a list of schemes plus the default contexts
//! for each use case. Reading bytes selects the scheme from the envelope's
//! magic and the context's use case; writing selects it from the context's
//! preferred magic.

use crate::codec::Encodable;
use crate::context::SerializationContext;
use crate::element::describe_prefix;
use crate::error::{Result, SerializationError};
use crate::scheme::{SerializationScheme, SerializationSchemeExt};
use dashmap::DashMap;
use ledgerflow_core::{SerializationMagic, SerializedBytes, UseCase};
use std::sync::Arc;
use tracing::debug;

/// Default contexts, one per use case
#[derive(Debug, Clone, Default)]
pub struct DefaultContexts {
    /// Peer-to-peer messages
    pub p2p: Option<SerializationContext>,
    /// RPC, node side
    pub rpc_server: Option<SerializationContext>,
    /// RPC, client side
    pub rpc_client: Option<SerializationContext>,
    /// Persistent storage
    pub storage: Option<SerializationContext>,
    /// Flow checkpoints
    pub checkpoint: Option<SerializationContext>,
}

/// Registered schemes plus default contexts
pub struct SerializationEnvironment {
    schemes: Vec<Arc<dyn SerializationScheme>>,
    contexts: DefaultContexts,
    selected: DashMap<(SerializationMagic, UseCase), usize>,
}

impl SerializationEnvironment {
    /// Start building an environment
    pub fn builder() -> SerializationEnvironmentBuilder {
        SerializationEnvironmentBuilder::default()
    }

    /// Registered schemes, in selection order
    pub fn schemes(&self) -> &[Arc<dyn SerializationScheme>] {
        &self.schemes
    }

    /// Default context for a use case
    pub fn context(&self, use_case: UseCase) -> Option<&SerializationContext> {
        match use_case {
            UseCase::P2P => self.contexts.p2p.as_ref(),
            UseCase::RpcServer => self.contexts.rpc_server.as_ref(),
            UseCase::RpcClient => self.contexts.rpc_client.as_ref(),
            UseCase::Storage => self.contexts.storage.as_ref(),
            UseCase::Checkpoint => self.contexts.checkpoint.as_ref(),
        }
    }

    /// Default checkpoint context
    pub fn checkpoint_context(&self) -> Result<&SerializationContext> {
        self.context(UseCase::Checkpoint)
            .ok_or_else(|| SerializationError::UnsupportedOperation("no checkpoint context configured".to_string()))
    }

    /// First scheme that reads `magic` for `use_case`
    pub fn scheme_for(
        &self,
        magic: SerializationMagic,
        use_case: UseCase,
    ) -> Result<Arc<dyn SerializationScheme>> {
        if let Some(index) = self.selected.get(&(magic, use_case)) {
            return Ok(Arc::clone(&self.schemes[*index]));
        }
        let index = self
            .schemes
            .iter()
            .position(|scheme| scheme.can_deserialize_version(magic, use_case))
            .ok_or(SerializationError::NoSchemeFor { magic, use_case })?;
        debug!(%magic, %use_case, scheme = self.schemes[index].name(), "selected scheme");
        self.selected.insert((magic, use_case), index);
        Ok(Arc::clone(&self.schemes[index]))
    }

    /// Encode with the scheme owning the context's preferred magic
    pub fn serialize<T: Encodable>(
        &self,
        value: &T,
        context: &SerializationContext,
    ) -> Result<SerializedBytes<T>> {
        let magic = context.preferred_magic();
        let scheme = self
            .schemes
            .iter()
            .find(|scheme| scheme.magic() == magic)
            .ok_or(SerializationError::NoSchemeFor {
                magic,
                use_case: context.use_case(),
            })?;
        scheme.serialize(value, context)
    }

    /// Decode with the scheme selected by the envelope's magic
    pub fn deserialize<T: Encodable>(&self, bytes: &[u8], context: &SerializationContext) -> Result<T> {
        let magic = SerializationMagic::from_prefix(bytes)
            .ok_or_else(|| SerializationError::UnknownMagic(describe_prefix(bytes)))?;
        self.scheme_for(magic, context.use_case())?
            .deserialize(bytes, context)
    }

    /// Encode with the default checkpoint context
    pub fn checkpoint_serialize<T: Encodable>(&self, value: &T) -> Result<SerializedBytes<T>> {
        self.serialize(value, self.checkpoint_context()?)
    }

    /// Decode with the default checkpoint context
    pub fn checkpoint_deserialize<T: Encodable>(&self, bytes: &[u8]) -> Result<T> {
        self.deserialize(bytes, self.checkpoint_context()?)
    }
}

/// Builder for [`SerializationEnvironment`]
#[derive(Default)]
pub struct SerializationEnvironmentBuilder {
    schemes: Vec<Arc<dyn SerializationScheme>>,
    contexts: DefaultContexts,
}

impl SerializationEnvironmentBuilder {
    /// Add a scheme; earlier schemes win selection
    pub fn scheme(mut self, scheme: Arc<dyn SerializationScheme>) -> Self {
        self.schemes.push(scheme);
        self
    }

    /// Set the default context for its use case
    pub fn context(mut self, context: SerializationContext) -> Self {
        let slot = match context.use_case() {
            UseCase::P2P => &mut self.contexts.p2p,
            UseCase::RpcServer => &mut self.contexts.rpc_server,
            UseCase::RpcClient => &mut self.contexts.rpc_client,
            UseCase::Storage => &mut self.contexts.storage,
            UseCase::Checkpoint => &mut self.contexts.checkpoint,
        };
        *slot = Some(context);
        self
    }

    /// Finish
    pub fn build(self) -> SerializationEnvironment {
        SerializationEnvironment {
            schemes: self.schemes,
            contexts: self.contexts,
            selected: DashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::AdmissionPolicy;
    use crate::plugins::SerializationPlugins;
    use crate::scheme::{
        checkpoint_context, CheckpointSerializationScheme, ServerSerializationScheme,
        CHECKPOINT_MAGIC, OBJECT_GRAPH_MAGIC,
    };
    use crate::scope::ResolutionScope;

    fn environment() -> SerializationEnvironment {
        let plugins = Arc::new(SerializationPlugins::new());
        let scope = Arc::new(ResolutionScope::new("env"));
        let p2p = SerializationContext::new(
            OBJECT_GRAPH_MAGIC,
            Arc::new(AdmissionPolicy::new()),
            Arc::clone(&scope),
            UseCase::P2P,
        );
        SerializationEnvironment::builder()
            .scheme(Arc::new(ServerSerializationScheme::new(Arc::clone(&plugins))))
            .scheme(Arc::new(CheckpointSerializationScheme::new(plugins)))
            .context(p2p.with_use_case(UseCase::Storage))
            .context(p2p)
            .context(checkpoint_context(scope))
            .build()
    }

    #[test]
    fn test_routes_by_magic() {
        let env = environment();
        let p2p = env.context(UseCase::P2P).unwrap().clone();

        let message = env.serialize(&"hello".to_string(), &p2p).unwrap();
        assert!(OBJECT_GRAPH_MAGIC.matches(message.as_bytes()));
        assert_eq!(env.deserialize::<String>(message.as_bytes(), &p2p).unwrap(), "hello");

        let checkpoint = env.checkpoint_serialize(&vec![1i64, 2]).unwrap();
        assert!(CHECKPOINT_MAGIC.matches(checkpoint.as_bytes()));
        assert_eq!(
            env.checkpoint_deserialize::<Vec<i64>>(checkpoint.as_bytes()).unwrap(),
            vec![1, 2]
        );
    }

    #[test]
    fn test_unknown_magic() {
        let env = environment();
        let p2p = env.context(UseCase::P2P).unwrap().clone();
        let err = env.deserialize::<String>(b"other\x01\x00rest", &p2p).unwrap_err();
        assert!(matches!(err, SerializationError::UnknownMagic(_)));
        let err = env.deserialize::<String>(b"lf", &p2p).unwrap_err();
        assert!(matches!(err, SerializationError::UnknownMagic(_)));
    }

    #[test]
    fn test_no_scheme_for_magic_and_use_case() {
        let env = environment();
        let checkpoint = env.checkpoint_serialize(&1i64).unwrap();
        let storage = env.context(UseCase::Storage).unwrap().clone();
        let err = env
            .deserialize::<i64>(checkpoint.as_bytes(), &storage)
            .unwrap_err();
        assert!(matches!(
            err,
            SerializationError::NoSchemeFor { use_case: UseCase::Storage, .. }
        ));
    }

    #[test]
    fn test_selection_is_memoized() {
        let env = environment();
        let first = env.scheme_for(OBJECT_GRAPH_MAGIC, UseCase::P2P).unwrap();
        let second = env.scheme_for(OBJECT_GRAPH_MAGIC, UseCase::P2P).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.name(), "object-graph/server");
        assert_eq!(env.scheme_for(CHECKPOINT_MAGIC, UseCase::Checkpoint).unwrap().name(), "checkpoint");
    }

    #[test]
    fn test_missing_checkpoint_context() {
        let env = SerializationEnvironment::builder().build();
        assert!(matches!(
            env.checkpoint_serialize(&1i64),
            Err(SerializationError::UnsupportedOperation(_))
        ));
    }

    static_assertions::assert_impl_all!(SerializationEnvironment: Send, Sync);
}
