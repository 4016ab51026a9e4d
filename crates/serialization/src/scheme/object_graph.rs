//! Object-graph scheme for P2P, storage and RPC traffic

use super::{FactoryCache, SerializationScheme, StandardRegistration};
use crate::context::SerializationContext;
use crate::error::{Result, SerializationError};
use crate::factory::SerializerFactory;
use crate::plugins::SerializationPlugins;
use ledgerflow_core::{SerializationMagic, UseCase};
use std::marker::PhantomData;
use std::sync::Arc;

/// Magic of object-graph envelopes
pub const OBJECT_GRAPH_MAGIC: SerializationMagic = SerializationMagic::new(1, 0);

/// Which side of RPC this process plays
///
/// Each side can build factories for its own direction only.
pub trait RpcRole: Send + Sync + 'static {
    /// Role name
    const NAME: &'static str;

    /// Factory for [`UseCase::RpcClient`]
    fn rpc_client_factory(
        cache: &FactoryCache,
        registration: &StandardRegistration,
        context: &SerializationContext,
    ) -> Result<Arc<SerializerFactory>>;

    /// Factory for [`UseCase::RpcServer`]
    fn rpc_server_factory(
        cache: &FactoryCache,
        registration: &StandardRegistration,
        context: &SerializationContext,
    ) -> Result<Arc<SerializerFactory>>;
}

/// Node side: serves RPC, never acts as an RPC client
#[derive(Debug, Clone, Copy)]
pub struct ServerRole;

impl RpcRole for ServerRole {
    const NAME: &'static str = "server";

    fn rpc_client_factory(
        _: &FactoryCache,
        _: &StandardRegistration,
        _: &SerializationContext,
    ) -> Result<Arc<SerializerFactory>> {
        Err(SerializationError::UnsupportedOperation(
            "a node does not serialize as an RPC client".to_string(),
        ))
    }

    fn rpc_server_factory(
        _: &FactoryCache,
        _: &StandardRegistration,
        _: &SerializationContext,
    ) -> Result<Arc<SerializerFactory>> {
        Err(SerializationError::NotImplemented(
            "RPC server serialization needs the RPC transport".to_string(),
        ))
    }
}

/// Client side: talks to a node over RPC
#[derive(Debug, Clone, Copy)]
pub struct ClientRole;

impl RpcRole for ClientRole {
    const NAME: &'static str = "client";

    fn rpc_client_factory(
        _: &FactoryCache,
        _: &StandardRegistration,
        _: &SerializationContext,
    ) -> Result<Arc<SerializerFactory>> {
        Err(SerializationError::NotImplemented(
            "RPC client serialization needs the RPC transport".to_string(),
        ))
    }

    fn rpc_server_factory(
        _: &FactoryCache,
        _: &StandardRegistration,
        _: &SerializationContext,
    ) -> Result<Arc<SerializerFactory>> {
        Err(SerializationError::UnsupportedOperation(
            "a client does not serialize as an RPC server".to_string(),
        ))
    }
}

/// Scheme for application object graphs
pub struct ObjectGraphScheme<R: RpcRole> {
    name: String,
    cache: FactoryCache,
    registration: StandardRegistration,
    _role: PhantomData<fn() -> R>,
}

/// Object-graph scheme as configured inside a node
pub type ServerSerializationScheme = ObjectGraphScheme<ServerRole>;

/// Object-graph scheme as configured in an RPC client
pub type ClientSerializationScheme = ObjectGraphScheme<ClientRole>;

impl<R: RpcRole> ObjectGraphScheme<R> {
    /// Scheme reading plugins from `plugins`
    pub fn new(plugins: Arc<SerializationPlugins>) -> Self {
        Self::with_registration(StandardRegistration::new(plugins))
    }

    /// Scheme with a custom registration, e.g. another public-key serializer
    pub fn with_registration(registration: StandardRegistration) -> Self {
        ObjectGraphScheme {
            name: format!("object-graph/{}", R::NAME),
            cache: FactoryCache::new(),
            registration,
            _role: PhantomData,
        }
    }

    /// Factory cache
    pub fn cached_factories(&self) -> &FactoryCache {
        &self.cache
    }
}

impl<R: RpcRole> SerializationScheme for ObjectGraphScheme<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn magic(&self) -> SerializationMagic {
        OBJECT_GRAPH_MAGIC
    }

    fn can_deserialize_version(&self, magic: SerializationMagic, use_case: UseCase) -> bool {
        magic == OBJECT_GRAPH_MAGIC && matches!(use_case, UseCase::P2P | UseCase::Storage)
    }

    fn serializer_factory(&self, context: &SerializationContext) -> Result<Arc<SerializerFactory>> {
        match context.use_case() {
            UseCase::Checkpoint => Err(SerializationError::UnsupportedUseCase {
                scheme: self.name.clone(),
                use_case: UseCase::Checkpoint,
            }),
            UseCase::RpcClient => R::rpc_client_factory(&self.cache, &self.registration, context),
            UseCase::RpcServer => R::rpc_server_factory(&self.cache, &self.registration, context),
            UseCase::P2P | UseCase::Storage => self.cache.get_or_create(context, &self.registration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::AdmissionPolicy;
    use crate::codec::{Encodable, FieldReader, FieldWriter, Portable};
    use crate::custom::ProxySerializer;
    use crate::scheme::SerializationSchemeExt;
    use crate::scope::ResolutionScope;
    use crate::serializer::SerializerId;

    #[derive(Debug, Clone, PartialEq)]
    struct Order {
        id: u64,
        memo: String,
    }

    impl Encodable for Order {}

    impl Portable for Order {
        const TYPE_NAME: &'static str = "app.Order";

        fn write_fields(&self, fields: &mut FieldWriter<'_, '_>) -> Result<()> {
            fields.field("id", &self.id)?;
            fields.field("memo", &self.memo)
        }

        fn read_fields(fields: &mut FieldReader<'_, '_>) -> Result<Self> {
            Ok(Order {
                id: fields.field("id")?,
                memo: fields.field("memo")?,
            })
        }
    }

    #[derive(Debug, PartialEq)]
    struct Ticket(u32);

    impl Encodable for Ticket {}

    struct TicketSerializer;

    impl ProxySerializer for TicketSerializer {
        type Target = Ticket;
        type Proxy = u32;
        const DESCRIPTOR: &'static str = "app.Ticket";

        fn to_proxy(&self, value: &Ticket) -> anyhow::Result<u32> {
            Ok(value.0)
        }

        fn from_proxy(&self, proxy: u32) -> anyhow::Result<Ticket> {
            Ok(Ticket(proxy))
        }
    }

    fn context(use_case: UseCase) -> SerializationContext {
        SerializationContext::new(
            OBJECT_GRAPH_MAGIC,
            Arc::new(AdmissionPolicy::new()),
            Arc::new(ResolutionScope::new("orders").with::<Order>()),
            use_case,
        )
    }

    fn scheme() -> ServerSerializationScheme {
        let plugins = SerializationPlugins::new();
        plugins.add_whitelist(Arc::new(OrderWhitelist));
        ObjectGraphScheme::new(Arc::new(plugins))
    }

    struct OrderWhitelist;

    impl crate::plugins::WhitelistContributor for OrderWhitelist {
        fn name(&self) -> &str {
            "orders"
        }

        fn whitelist(&self) -> Vec<String> {
            vec!["app.Order".to_string()]
        }
    }

    // ========================================================================
    // Factory cache
    // ========================================================================

    #[test]
    fn test_same_key_reuses_factory() {
        let scheme = scheme();
        let ctx = context(UseCase::P2P);
        let first = scheme.serializer_factory(&ctx).unwrap();
        let second = scheme.serializer_factory(&ctx).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(scheme.cached_factories().len(), 1);
    }

    #[test]
    fn test_use_case_does_not_split_cache() {
        let scheme = scheme();
        let ctx = context(UseCase::P2P);
        let p2p = scheme.serializer_factory(&ctx).unwrap();
        let storage = scheme
            .serializer_factory(&ctx.with_use_case(UseCase::Storage))
            .unwrap();
        assert!(Arc::ptr_eq(&p2p, &storage));
    }

    #[test]
    fn test_distinct_policy_gets_new_factory() {
        let scheme = scheme();
        let ctx = context(UseCase::P2P);
        let a = scheme.serializer_factory(&ctx).unwrap();
        let b = scheme
            .serializer_factory(&ctx.with_policy(Arc::new(AdmissionPolicy::new())))
            .unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(scheme.cached_factories().len(), 2);
    }

    #[test]
    fn test_registration_rerun_is_idempotent() {
        let scheme = scheme();
        let ctx = context(UseCase::P2P);
        let factory = scheme.serializer_factory(&ctx).unwrap();
        let bound = factory.registry().len();
        let admitted = ctx.policy().len();
        scheme.serializer_factory(&ctx).unwrap();
        assert_eq!(factory.registry().len(), bound);
        assert_eq!(ctx.policy().len(), admitted);
    }

    #[test]
    fn test_plugin_added_later_reaches_cached_factory() {
        let plugins = Arc::new(SerializationPlugins::new());
        let scheme = ServerSerializationScheme::new(Arc::clone(&plugins));
        let ctx = context(UseCase::P2P);
        let factory = scheme.serializer_factory(&ctx).unwrap();
        assert!(factory.registry().by_descriptor("app.Ticket").is_none());

        plugins.add_proxy_serializer("tickets", TicketSerializer);
        scheme.serializer_factory(&ctx).unwrap();
        let bound = factory.registry().by_descriptor("app.Ticket").unwrap();
        assert_eq!(bound.id(), SerializerId::custom("tickets", "app.Ticket"));
    }

    #[test]
    fn test_registration_order_lets_plugins_shadow() {
        let factory = scheme().serializer_factory(&context(UseCase::P2P)).unwrap();
        assert!(factory.registry().by_descriptor("security.PublicKey").is_some());
        assert!(factory.registry().by_descriptor("crypto.SecureHash").is_some());
        assert!(factory.policy().is_admitted("app.Order"));
        assert!(factory.policy().is_admitted("flow.FiberSnapshot"));
    }

    // ========================================================================
    // Use cases
    // ========================================================================

    #[test]
    fn test_roundtrip_through_scheme() {
        let scheme = scheme();
        let ctx = context(UseCase::Storage);
        let order = Order {
            id: 9,
            memo: "rush".into(),
        };
        let bytes = scheme.serialize(&order, &ctx).unwrap();
        assert!(OBJECT_GRAPH_MAGIC.matches(bytes.as_bytes()));
        assert_eq!(scheme.deserialize::<Order>(bytes.as_bytes(), &ctx).unwrap(), order);
    }

    #[test]
    fn test_checkpoint_rejected_regardless_of_magic() {
        let scheme = scheme();
        let ctx = context(UseCase::Checkpoint);
        let err = scheme.serializer_factory(&ctx).unwrap_err();
        assert!(matches!(
            err,
            SerializationError::UnsupportedUseCase { use_case: UseCase::Checkpoint, .. }
        ));

        let valid = scheme.serialize(&7i64, &context(UseCase::P2P)).unwrap();
        for bytes in [valid.as_bytes(), b"garbage".as_slice(), b"".as_slice()] {
            let err = scheme.deserialize::<i64>(bytes, &ctx).unwrap_err();
            assert!(matches!(err, SerializationError::UnsupportedUseCase { .. }));
        }
    }

    #[test]
    fn test_rpc_capability_gaps() {
        let server = scheme();
        assert!(matches!(
            server.serializer_factory(&context(UseCase::RpcClient)),
            Err(SerializationError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            server.serializer_factory(&context(UseCase::RpcServer)),
            Err(SerializationError::NotImplemented(_))
        ));

        let client = ClientSerializationScheme::new(Arc::new(SerializationPlugins::new()));
        assert!(matches!(
            client.serializer_factory(&context(UseCase::RpcClient)),
            Err(SerializationError::NotImplemented(_))
        ));
        assert!(matches!(
            client.serializer_factory(&context(UseCase::RpcServer)),
            Err(SerializationError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_can_deserialize_version() {
        let scheme = scheme();
        assert!(scheme.can_deserialize_version(OBJECT_GRAPH_MAGIC, UseCase::P2P));
        assert!(scheme.can_deserialize_version(OBJECT_GRAPH_MAGIC, UseCase::Storage));
        assert!(!scheme.can_deserialize_version(OBJECT_GRAPH_MAGIC, UseCase::RpcServer));
        assert!(!scheme.can_deserialize_version(OBJECT_GRAPH_MAGIC, UseCase::Checkpoint));
        assert!(!scheme.can_deserialize_version(SerializationMagic::new(1, 1), UseCase::P2P));
    }

    #[test]
    fn test_names() {
        assert_eq!(scheme().name(), "object-graph/server");
        let client = ClientSerializationScheme::new(Arc::new(SerializationPlugins::new()));
        assert_eq!(client.name(), "object-graph/client");
    }

    static_assertions::assert_impl_all!(ServerSerializationScheme: Send, Sync);
    static_assertions::assert_impl_all!(ClientSerializationScheme: Send, Sync);
}
