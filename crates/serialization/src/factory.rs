//! Serializer factory
//!
//! A factory binds an [`AdmissionPolicy`] and a [`ResolutionScope`] to its
//! own [`SerializerRegistry`] and turns values into envelopes and back.
//! Schemes create one factory per distinct (policy, scope) pair and keep it
//! for the life of the process.

use crate::admission::{AdmissionPolicy, PolicyId};
use crate::codec::{DeserializationInput, Encodable, SerializationOutput};
use crate::element::Envelope;
use crate::error::{Result, SerializationError};
use crate::registry::{Registration, SerializerRegistry};
use crate::scope::{ResolutionScope, ScopeId};
use crate::serializer::Serializer;
use ledgerflow_core::{SerializationMagic, SerializedBytes};
use std::fmt;
use std::sync::Arc;

/// Cache key of a factory: policy identity plus scope identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FactoryKey {
    /// Admission policy identity
    pub policy: PolicyId,
    /// Resolution scope identity
    pub scope: ScopeId,
}

/// Produces and consumes envelopes for one (policy, scope) pair
pub struct SerializerFactory {
    policy: Arc<AdmissionPolicy>,
    scope: Arc<ResolutionScope>,
    registry: SerializerRegistry,
}

impl SerializerFactory {
    /// Factory with an empty registry
    pub fn new(policy: Arc<AdmissionPolicy>, scope: Arc<ResolutionScope>) -> Self {
        SerializerFactory {
            policy,
            scope,
            registry: SerializerRegistry::new(),
        }
    }

    /// Cache key
    pub fn key(&self) -> FactoryKey {
        FactoryKey {
            policy: self.policy.id(),
            scope: self.scope.id(),
        }
    }

    /// Bound admission policy
    pub fn policy(&self) -> &Arc<AdmissionPolicy> {
        &self.policy
    }

    /// Bound resolution scope
    pub fn scope(&self) -> &Arc<ResolutionScope> {
        &self.scope
    }

    /// Serializer bindings
    pub fn registry(&self) -> &SerializerRegistry {
        &self.registry
    }

    /// Bind a serializer, replacing a different one for the same type
    pub fn register(&self, serializer: Arc<dyn Serializer>) -> Result<Registration> {
        self.registry.register(serializer)
    }

    /// Bind a serializer unless the type is already bound
    pub fn register_default(&self, serializer: Arc<dyn Serializer>) -> Result<Registration> {
        self.registry.register_default(serializer)
    }

    pub(crate) fn check_admitted(&self, type_name: &str) -> Result<()> {
        if self.policy.is_admitted(type_name) {
            Ok(())
        } else {
            Err(SerializationError::UnadmittedType {
                type_name: type_name.to_string(),
                policy: self.policy.id(),
            })
        }
    }

    /// Encode a value into `magic || payload`
    pub fn serialize<T: Encodable>(
        &self,
        value: &T,
        magic: SerializationMagic,
    ) -> Result<SerializedBytes<T>> {
        let mut output = SerializationOutput::new(self);
        let body = output.write(value)?;
        let envelope = Envelope {
            schema: output.into_schema(),
            body,
        };
        Ok(SerializedBytes::new(envelope.encode(magic)?))
    }

    /// Decode an envelope as a `T`
    ///
    /// The magic is checked before the payload is touched.
    pub fn deserialize<T: Encodable>(&self, bytes: &[u8], magic: SerializationMagic) -> Result<T> {
        let envelope = Envelope::decode(magic, bytes)?;
        let mut input = DeserializationInput::new(self, &envelope.schema);
        input.read(&envelope.body)
    }
}

impl fmt::Debug for SerializerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerFactory")
            .field("policy", &self.policy.id())
            .field("scope", &self.scope.id())
            .field("serializers", &self.registry.len())
            .finish()
    }
}
