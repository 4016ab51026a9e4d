//! Checkpoint scheme

use super::{FactoryCache, SerializationScheme, StandardRegistration};
use crate::admission::AdmissionPolicy;
use crate::context::SerializationContext;
use crate::error::{Result, SerializationError};
use crate::factory::SerializerFactory;
use crate::plugins::SerializationPlugins;
use crate::scope::ResolutionScope;
use ledgerflow_core::{SerializationMagic, UseCase};
use std::sync::Arc;

/// Magic of checkpoint envelopes
pub const CHECKPOINT_MAGIC: SerializationMagic = SerializationMagic::new(0, 1);

/// Scheme that writes and reads flow checkpoints and nothing else
pub struct CheckpointSerializationScheme {
    cache: FactoryCache,
    registration: StandardRegistration,
}

impl CheckpointSerializationScheme {
    /// Scheme reading plugins from `plugins`
    pub fn new(plugins: Arc<SerializationPlugins>) -> Self {
        Self::with_registration(StandardRegistration::new(plugins))
    }

    /// Scheme with a custom registration
    pub fn with_registration(registration: StandardRegistration) -> Self {
        CheckpointSerializationScheme {
            cache: FactoryCache::new(),
            registration,
        }
    }

    /// Factory cache
    pub fn cached_factories(&self) -> &FactoryCache {
        &self.cache
    }
}

impl SerializationScheme for CheckpointSerializationScheme {
    fn name(&self) -> &str {
        "checkpoint"
    }

    fn magic(&self) -> SerializationMagic {
        CHECKPOINT_MAGIC
    }

    fn can_deserialize_version(&self, magic: SerializationMagic, use_case: UseCase) -> bool {
        magic == CHECKPOINT_MAGIC && use_case == UseCase::Checkpoint
    }

    fn serializer_factory(&self, context: &SerializationContext) -> Result<Arc<SerializerFactory>> {
        if context.use_case() != UseCase::Checkpoint {
            return Err(SerializationError::UnsupportedUseCase {
                scheme: self.name().to_string(),
                use_case: context.use_case(),
            });
        }
        self.cache.get_or_create(context, &self.registration)
    }
}

/// Checkpoint context over `scope` with a permissive policy
///
/// Checkpoints capture whatever a flow holds at suspension, so the generic
/// serializer admits every type loaded in the scope.
pub fn checkpoint_context(scope: Arc<ResolutionScope>) -> SerializationContext {
    SerializationContext::new(
        CHECKPOINT_MAGIC,
        Arc::new(AdmissionPolicy::admit_all()),
        scope,
        UseCase::Checkpoint,
    )
}
