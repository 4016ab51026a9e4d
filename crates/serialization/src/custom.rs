//! Contributed serializers
//!
//! Applications contribute serializers for their own types by implementing
//! [`ProxySerializer`]: the value is converted to a proxy type the framework
//! already knows how to encode, and rebuilt from it on the way back.
//!
//! Contributed code runs behind [`Isolated`], which turns errors and panics
//! into [`SerializationError::CustomSerializer`] so a faulty contribution
//! cannot leave a factory half-updated or take down the caller.

use crate::codec::{DeserializationInput, Encodable, SerializationOutput};
use crate::element::Element;
use crate::error::{Result, SerializationError};
use crate::serializer::{Serializer, SerializerId};
use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Proxy-based serializer for an application type
pub trait ProxySerializer: Send + Sync + 'static {
    /// Type being serialized
    type Target: Encodable;
    /// Encodable stand-in
    type Proxy: Encodable;

    /// Wire descriptor for `Target`
    const DESCRIPTOR: &'static str;

    /// Convert to the proxy
    fn to_proxy(&self, value: &Self::Target) -> anyhow::Result<Self::Proxy>;

    /// Rebuild from the proxy
    fn from_proxy(&self, proxy: Self::Proxy) -> anyhow::Result<Self::Target>;
}

/// Adapts a [`ProxySerializer`] to the object-safe [`Serializer`]
pub struct ProxyAdapter<P: ProxySerializer> {
    inner: P,
    id: SerializerId,
    _marker: PhantomData<fn() -> P::Target>,
}

impl<P: ProxySerializer> ProxyAdapter<P> {
    /// Wrap a proxy serializer contributed by `source`
    pub fn new(source: &str, inner: P) -> Self {
        ProxyAdapter {
            inner,
            id: SerializerId::custom(source, P::DESCRIPTOR),
            _marker: PhantomData,
        }
    }

    fn failure(&self, error: anyhow::Error) -> SerializationError {
        SerializationError::CustomSerializer {
            serializer: self.id.to_string(),
            message: format!("{:#}", error),
        }
    }
}

impl<P: ProxySerializer> Serializer for ProxyAdapter<P> {
    fn id(&self) -> SerializerId {
        self.id.clone()
    }

    fn descriptor(&self) -> &str {
        P::DESCRIPTOR
    }

    fn target_type(&self) -> TypeId {
        TypeId::of::<P::Target>()
    }

    fn write(&self, value: &dyn Any, output: &mut SerializationOutput<'_>) -> Result<Element> {
        let value = value.downcast_ref::<P::Target>().ok_or_else(|| {
            SerializationError::mismatch(P::DESCRIPTOR, "value of another type")
        })?;
        let proxy = self.inner.to_proxy(value).map_err(|e| self.failure(e))?;
        output.write(&proxy)
    }

    fn read(
        &self,
        element: &Element,
        input: &mut DeserializationInput<'_>,
    ) -> Result<Box<dyn Any + Send + Sync>> {
        let proxy: P::Proxy = input.read(element)?;
        let value = self.inner.from_proxy(proxy).map_err(|e| self.failure(e))?;
        Ok(Box::new(value))
    }
}

/// Panic barrier around a contributed serializer
pub struct Isolated {
    inner: Arc<dyn Serializer>,
}

impl Isolated {
    /// Wrap a serializer
    pub fn new(inner: Arc<dyn Serializer>) -> Self {
        Isolated { inner }
    }

    fn panicked(&self, operation: &str) -> SerializationError {
        SerializationError::CustomSerializer {
            serializer: self.inner.id().to_string(),
            message: format!("panicked during {}", operation),
        }
    }
}

impl Serializer for Isolated {
    fn id(&self) -> SerializerId {
        self.inner.id()
    }

    fn descriptor(&self) -> &str {
        self.inner.descriptor()
    }

    fn target_type(&self) -> TypeId {
        self.inner.target_type()
    }

    fn write(&self, value: &dyn Any, output: &mut SerializationOutput<'_>) -> Result<Element> {
        catch_unwind(AssertUnwindSafe(|| self.inner.write(value, output)))
            .unwrap_or_else(|_| Err(self.panicked("write")))
    }

    fn read(
        &self,
        element: &Element,
        input: &mut DeserializationInput<'_>,
    ) -> Result<Box<dyn Any + Send + Sync>> {
        catch_unwind(AssertUnwindSafe(|| self.inner.read(element, input)))
            .unwrap_or_else(|_| Err(self.panicked("read")))
    }
}
