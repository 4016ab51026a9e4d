//! Serialization context

use crate::admission::AdmissionPolicy;
use crate::factory::FactoryKey;
use crate::scope::ResolutionScope;
use ledgerflow_core::{SerializationMagic, UseCase};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Immutable call context for one serialize / deserialize request
///
/// The `with_*` methods return a modified copy. Only the policy and scope
/// take part in factory selection; see [`SerializationContext::factory_key`].
#[derive(Debug, Clone)]
pub struct SerializationContext {
    preferred_magic: SerializationMagic,
    policy: Arc<AdmissionPolicy>,
    scope: Arc<ResolutionScope>,
    use_case: UseCase,
    properties: BTreeMap<String, String>,
}

impl SerializationContext {
    /// New context
    pub fn new(
        preferred_magic: SerializationMagic,
        policy: Arc<AdmissionPolicy>,
        scope: Arc<ResolutionScope>,
        use_case: UseCase,
    ) -> Self {
        SerializationContext {
            preferred_magic,
            policy,
            scope,
            use_case,
            properties: BTreeMap::new(),
        }
    }

    /// Magic written by `serialize`
    pub fn preferred_magic(&self) -> SerializationMagic {
        self.preferred_magic
    }

    /// Admission policy
    pub fn policy(&self) -> &Arc<AdmissionPolicy> {
        &self.policy
    }

    /// Resolution scope
    pub fn scope(&self) -> &Arc<ResolutionScope> {
        &self.scope
    }

    /// Use case
    pub fn use_case(&self) -> UseCase {
        self.use_case
    }

    /// Format option
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// All format options
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Copy with another use case
    pub fn with_use_case(&self, use_case: UseCase) -> Self {
        SerializationContext {
            use_case,
            ..self.clone()
        }
    }

    /// Copy with another preferred magic
    pub fn with_preferred_magic(&self, preferred_magic: SerializationMagic) -> Self {
        SerializationContext {
            preferred_magic,
            ..self.clone()
        }
    }

    /// Copy with another admission policy
    pub fn with_policy(&self, policy: Arc<AdmissionPolicy>) -> Self {
        SerializationContext {
            policy,
            ..self.clone()
        }
    }

    /// Copy with another resolution scope
    pub fn with_scope(&self, scope: Arc<ResolutionScope>) -> Self {
        SerializationContext {
            scope,
            ..self.clone()
        }
    }

    /// Copy with a format option set
    pub fn with_property(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.properties.insert(key.into(), value.into());
        next
    }

    /// Factory cache identity
    ///
    /// Use case, magic and properties are deliberately absent: contexts that
    /// differ only in those share one factory.
    pub fn factory_key(&self) -> FactoryKey {
        FactoryKey {
            policy: self.policy.id(),
            scope: self.scope.id(),
        }
    }
}
