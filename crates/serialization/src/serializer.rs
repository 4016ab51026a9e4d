//! Serializer traits
//!
//! [`Serializer`] is the object-safe strategy stored in the registry.
//! [`TypedSerializer`] is the convenient typed form; every `TypedSerializer`
//! is a `Serializer` through a blanket impl.

use crate::codec::{DeserializationInput, Encodable, SerializationOutput};
use crate::element::Element;
use crate::error::{Result, SerializationError};
use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;

/// Identity of a serializer implementation
///
/// Registering a serializer whose id is already bound to the same type is a
/// no-op, which is what makes repeated registration runs idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SerializerId(Cow<'static, str>);

impl SerializerId {
    /// Id of a serializer shipped with this crate
    pub const fn builtin(name: &'static str) -> Self {
        SerializerId(Cow::Borrowed(name))
    }

    /// Id of a contributed serializer, qualified by its source
    pub fn custom(source: &str, descriptor: &str) -> Self {
        SerializerId(Cow::Owned(format!("custom:{}:{}", source, descriptor)))
    }

    /// Id text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SerializerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode/decode strategy for one Rust type
pub trait Serializer: Send + Sync {
    /// Implementation identity
    fn id(&self) -> SerializerId;

    /// Descriptor written ahead of every value this serializer produces
    fn descriptor(&self) -> &str;

    /// Rust type handled
    fn target_type(&self) -> TypeId;

    /// Encode a value of [`Serializer::target_type`]
    fn write(&self, value: &dyn Any, output: &mut SerializationOutput<'_>) -> Result<Element>;

    /// Decode a body produced by [`Serializer::write`]
    fn read(
        &self,
        element: &Element,
        input: &mut DeserializationInput<'_>,
    ) -> Result<Box<dyn Any + Send + Sync>>;
}

/// Typed serializer for `Target`
pub trait TypedSerializer: Send + Sync + 'static {
    /// Handled type
    type Target: Encodable;

    /// Wire descriptor
    const DESCRIPTOR: &'static str;

    /// Implementation identity
    fn serializer_id(&self) -> SerializerId;

    /// Encode a value
    fn write_value(&self, value: &Self::Target, output: &mut SerializationOutput<'_>)
        -> Result<Element>;

    /// Decode a value
    fn read_value(
        &self,
        element: &Element,
        input: &mut DeserializationInput<'_>,
    ) -> Result<Self::Target>;
}

impl<S: TypedSerializer> Serializer for S {
    fn id(&self) -> SerializerId {
        self.serializer_id()
    }

    fn descriptor(&self) -> &str {
        S::DESCRIPTOR
    }

    fn target_type(&self) -> TypeId {
        TypeId::of::<S::Target>()
    }

    fn write(&self, value: &dyn Any, output: &mut SerializationOutput<'_>) -> Result<Element> {
        let value = value.downcast_ref::<S::Target>().ok_or_else(|| {
            SerializationError::mismatch(std::any::type_name::<S::Target>(), "value of another type")
        })?;
        self.write_value(value, output)
    }

    fn read(
        &self,
        element: &Element,
        input: &mut DeserializationInput<'_>,
    ) -> Result<Box<dyn Any + Send + Sync>> {
        Ok(Box::new(self.read_value(element, input)?))
    }
}
