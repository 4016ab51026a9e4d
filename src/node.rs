//! Node runtime.
//!
//! A [`Node`] owns the serialization environment, the executor chain and,
//! when verification is enabled, the checkpoint verifier.

use crate::config::NodeOptions;
use crate::error::Result;
use ledgerflow_core::{SerializedBytes, UseCase};
use ledgerflow_serialization::{
    checkpoint_context, AdmissionPolicy, CheckpointSerializationScheme, Encodable, Portable,
    ProxySerializer, ResolutionScope, SerializationContext, SerializationEnvironment,
    SerializationError, SerializationPlugins, Serializer, ServerSerializationScheme,
    StandardRegistration, WhitelistContributor, OBJECT_GRAPH_MAGIC,
};
use ledgerflow_statemachine::{
    build_executor_chain, checkpoint_scope, CheckpointVerifier, FiberSnapshot, FrozenFiber,
    TransitionExecutor,
};
use std::sync::Arc;
use tracing::info;

/// What `stop` found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShutdownReport {
    /// True if any verified checkpoint could not be deserialized.
    pub unrestorable_checkpoints: bool,
    /// Checks the verifier ran.
    pub checks_completed: u64,
}

/// Builder for [`Node`].
pub struct NodeBuilder {
    options: NodeOptions,
    plugins: Arc<SerializationPlugins>,
    scope: Arc<ResolutionScope>,
    public_key_serializer: Option<Arc<dyn Serializer>>,
}

impl NodeBuilder {
    /// Create a new builder with production options.
    pub fn new() -> Self {
        Self {
            options: NodeOptions::production(),
            plugins: Arc::new(SerializationPlugins::new()),
            scope: Arc::new(checkpoint_scope("node")),
            public_key_serializer: None,
        }
    }

    /// Use these options.
    pub fn options(mut self, options: NodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Admit the types listed by `contributor`.
    pub fn whitelist(self, contributor: Arc<dyn WhitelistContributor>) -> Self {
        self.plugins.add_whitelist(contributor);
        self
    }

    /// Add a custom serializer contributed by `source`.
    pub fn proxy_serializer<P: ProxySerializer>(self, source: &str, serializer: P) -> Self {
        self.plugins.add_proxy_serializer(source, serializer);
        self
    }

    /// Load an application type into the node's resolution scope.
    pub fn load<T: Portable>(self) -> Self {
        self.scope.load::<T>();
        self
    }

    /// Replace the built-in public-key serializer.
    pub fn public_key_serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.public_key_serializer = Some(serializer);
        self
    }

    fn registration(&self) -> StandardRegistration {
        match &self.public_key_serializer {
            Some(serializer) => StandardRegistration::with_public_key_serializer(
                Arc::clone(&self.plugins),
                Arc::clone(serializer),
            ),
            None => StandardRegistration::new(Arc::clone(&self.plugins)),
        }
    }

    /// Build the node. The verifier is not running until [`Node::start`].
    pub fn build(self) -> Result<Node> {
        let policy = Arc::new(self.plugins.default_policy()?);
        let base = SerializationContext::new(
            OBJECT_GRAPH_MAGIC,
            policy,
            Arc::clone(&self.scope),
            UseCase::P2P,
        );
        let environment = SerializationEnvironment::builder()
            .scheme(Arc::new(ServerSerializationScheme::with_registration(
                self.registration(),
            )))
            .scheme(Arc::new(CheckpointSerializationScheme::with_registration(
                self.registration(),
            )))
            .context(base.with_use_case(UseCase::Storage))
            .context(base.with_use_case(UseCase::RpcServer))
            .context(base.with_use_case(UseCase::RpcClient))
            .context(base)
            .context(checkpoint_context(Arc::clone(&self.scope)))
            .build();

        let verifier = self
            .options
            .verifies_checkpoints()
            .then(|| Arc::new(CheckpointVerifier::new()));
        let executor = build_executor_chain(&self.options.state_machine(), verifier.clone());

        Ok(Node {
            options: self.options,
            environment: Arc::new(environment),
            verifier,
            executor,
        })
    }
}

impl Default for NodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running flow state machine with its serialization stack.
pub struct Node {
    options: NodeOptions,
    environment: Arc<SerializationEnvironment>,
    verifier: Option<Arc<CheckpointVerifier>>,
    executor: Box<dyn TransitionExecutor>,
}

impl Node {
    /// Create a builder.
    pub fn builder() -> NodeBuilder {
        NodeBuilder::new()
    }

    /// Start the checkpoint verifier, if enabled.
    pub fn start(&self) -> Result<()> {
        if let Some(verifier) = &self.verifier {
            let context = self.environment.checkpoint_context()?.clone();
            verifier.start(Arc::clone(&self.environment), context)?;
        }
        info!(
            dev_mode = self.options.dev_mode,
            verify_checkpoints = self.verifier.is_some(),
            "node started"
        );
        Ok(())
    }

    /// Drain and stop the verifier.
    pub fn stop(&self) -> ShutdownReport {
        let report = match &self.verifier {
            Some(verifier) => ShutdownReport {
                unrestorable_checkpoints: verifier.stop(),
                checks_completed: verifier.checks_completed(),
            },
            None => ShutdownReport::default(),
        };
        info!(
            unrestorable_checkpoints = report.unrestorable_checkpoints,
            checks = report.checks_completed,
            "node stopped"
        );
        report
    }

    /// Options the node was built with.
    pub fn options(&self) -> &NodeOptions {
        &self.options
    }

    /// Serialization environment.
    pub fn environment(&self) -> &Arc<SerializationEnvironment> {
        &self.environment
    }

    /// Transition executor chain.
    pub fn executor(&self) -> &dyn TransitionExecutor {
        self.executor.as_ref()
    }

    /// Checkpoint verifier, if enabled.
    pub fn verifier(&self) -> Option<&Arc<CheckpointVerifier>> {
        self.verifier.as_ref()
    }

    /// Freeze a fiber into checkpoint bytes.
    pub fn freeze(&self, snapshot: &FiberSnapshot) -> Result<FrozenFiber> {
        Ok(snapshot.freeze(&self.environment)?)
    }

    /// Serialize with the default context of `use_case`.
    pub fn serialize<T: Encodable>(&self, value: &T, use_case: UseCase) -> Result<SerializedBytes<T>> {
        let context = self.context(use_case)?;
        Ok(self.environment.serialize(value, context)?)
    }

    /// Deserialize with the default context of `use_case`.
    pub fn deserialize<T: Encodable>(&self, bytes: &[u8], use_case: UseCase) -> Result<T> {
        let context = self.context(use_case)?;
        Ok(self.environment.deserialize(bytes, context)?)
    }

    /// Admission policy of the non-checkpoint contexts.
    pub fn policy(&self) -> Result<&Arc<AdmissionPolicy>> {
        Ok(self.context(UseCase::P2P)?.policy())
    }

    fn context(&self, use_case: UseCase) -> Result<&SerializationContext> {
        self.environment.context(use_case).ok_or_else(|| {
            SerializationError::UnsupportedOperation(format!("no {} context configured", use_case))
                .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_node_has_no_verifier() {
        let node = NodeBuilder::new().build().unwrap();
        assert!(node.verifier().is_none());
        node.start().unwrap();
        assert_eq!(node.stop(), ShutdownReport::default());
    }

    #[test]
    fn test_development_node_verifies() {
        let node = Node::builder()
            .options(NodeOptions::development())
            .build()
            .unwrap();
        node.start().unwrap();
        assert!(node.verifier().unwrap().is_running());
        let report = node.stop();
        assert!(!report.unrestorable_checkpoints);
        assert_eq!(report.checks_completed, 0);
    }

    #[test]
    fn test_default_policy_seeded() {
        let node = NodeBuilder::new().build().unwrap();
        assert!(node.policy().unwrap().is_admitted("flow.FiberSnapshot"));
    }

    #[test]
    fn test_checkpoint_use_case_not_served_by_object_graph() {
        let node = NodeBuilder::new().build().unwrap();
        let bytes = node.serialize(&5i64, UseCase::Checkpoint).unwrap();
        assert_eq!(node.deserialize::<i64>(bytes.as_bytes(), UseCase::Checkpoint).unwrap(), 5);
        // checkpoint bytes are not readable as storage data
        assert!(node.deserialize::<i64>(bytes.as_bytes(), UseCase::Storage).is_err());
    }
}
