//! Type-erased values

use crate::codec::{DeserializationInput, Encodable, SerializationOutput};
use crate::element::Element;
use crate::error::Result;
use crate::native::{register_native, NativeCodec};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A value whose concrete type is recovered from its descriptor on decode
///
/// Holds registry-handled values (including the boxed primitives `i64`,
/// `u64`, `bool`, `f64`, `char`, `String`), [`Portable`] types loaded in the
/// reader's scope, or natively encoded primitives and collections of them
/// (`u32`, `Vec<i64>`, `Option<String>`, `BTreeMap<String, u8>`, ...). Used
/// for polymorphic slots such as the captured locals of a frozen fiber.
///
/// A collection of registry or [`Portable`] types has no descriptor and
/// fails to encode with [`UnknownType`].
///
/// [`Portable`]: crate::codec::Portable
/// [`UnknownType`]: crate::error::SerializationError::UnknownType
#[derive(Clone)]
pub struct AnyObject {
    value: Arc<dyn Any + Send + Sync>,
    type_name: String,
    native: Option<Arc<NativeCodec>>,
}

impl AnyObject {
    /// Erase a value
    pub fn new<T: Encodable>(value: T) -> Self {
        AnyObject {
            value: Arc::new(value),
            type_name: std::any::type_name::<T>().to_string(),
            native: register_native::<T>(),
        }
    }

    pub(crate) fn from_boxed(
        value: Box<dyn Any + Send + Sync>,
        type_name: &str,
        native: Option<Arc<NativeCodec>>,
    ) -> Self {
        AnyObject {
            value: Arc::from(value),
            type_name: type_name.to_string(),
            native,
        }
    }

    /// Borrow as `T` if that is the concrete type
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// True if the concrete type is `T`
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Rust type name when built locally, descriptor when decoded
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

impl fmt::Debug for AnyObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnyObject({})", self.type_name)
    }
}

impl Encodable for AnyObject {
    fn encode(&self, output: &mut SerializationOutput<'_>) -> Result<Element> {
        output.write_dyn(&*self.value, &self.type_name, self.native.as_deref())
    }

    fn decode(element: &Element, input: &mut DeserializationInput<'_>) -> Result<Self> {
        input.read_dynamic(element)
    }
}
