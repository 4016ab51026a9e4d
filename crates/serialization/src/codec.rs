//! Encoding traits and the object-graph walkers
//!
//! # Encoding dispatch
//!
//! | Value | Path |
//! |-------|------|
//! | primitives, `String`, collections | native [`Encodable`] impls, never gated |
//! | type with a registered serializer | registry lookup by `TypeId` |
//! | [`Portable`] type loaded in the scope | generic object serializer, gated by the admission policy |
//! | primitive or collection inside an [`AnyObject`] | native encoding under a composed descriptor, see [`native`](crate::native) |
//! | anything else | [`SerializationError::UnknownType`] |
//!
//! Decoding mirrors this: the expected type picks the serializer, and the
//! descriptor found in the data must agree with it.

use crate::any::AnyObject;
use crate::element::{Element, FieldNotation, Schema, TypeNotation};
use crate::error::{Result, SerializationError};
use crate::factory::SerializerFactory;
use crate::native::{self, NativeCodec};
use crate::scope::ClassInfo;
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;

/// A value that can cross the serialization boundary
///
/// The default methods route through the factory's registry and scope;
/// value types only need an empty `impl Encodable for T {}` plus either a
/// registered serializer or a [`Portable`] impl.
pub trait Encodable: Any + Send + Sync + Sized {
    /// Encode `self` into an element
    fn encode(&self, output: &mut SerializationOutput<'_>) -> Result<Element> {
        output.write_object(self)
    }

    /// Decode an element into `Self`
    fn decode(element: &Element, input: &mut DeserializationInput<'_>) -> Result<Self> {
        input.read_object::<Self>(element)
    }

    /// Descriptor used when a natively encoded value sits in a type-erased
    /// slot; `None` for registry and [`Portable`] types, which carry their
    /// own descriptor
    fn native_descriptor() -> Option<String> {
        None
    }
}

/// An ordinary application type handled by the generic object serializer
///
/// The type must be loaded into the reader's scope and admitted by the
/// policy of both the writer and the reader.
///
/// ```ignore
/// struct Iou { lender: String, amount: i64 }
///
/// impl Encodable for Iou {}
///
/// impl Portable for Iou {
///     const TYPE_NAME: &'static str = "app.Iou";
///
///     fn write_fields(&self, fields: &mut FieldWriter<'_, '_>) -> Result<()> {
///         fields.field("lender", &self.lender)?;
///         fields.field("amount", &self.amount)
///     }
///
///     fn read_fields(fields: &mut FieldReader<'_, '_>) -> Result<Self> {
///         Ok(Iou { lender: fields.field("lender")?, amount: fields.field("amount")? })
///     }
/// }
/// ```
pub trait Portable: Encodable {
    /// Stable portable name; this is what appears on the wire
    const TYPE_NAME: &'static str;

    /// Write each field in a fixed order
    fn write_fields(&self, fields: &mut FieldWriter<'_, '_>) -> Result<()>;

    /// Rebuild the value from named fields
    fn read_fields(fields: &mut FieldReader<'_, '_>) -> Result<Self>;
}

// =============================================================================
// Serialization side
// =============================================================================

/// Encoder state for one envelope
pub struct SerializationOutput<'a> {
    factory: &'a SerializerFactory,
    schema: Schema,
}

impl<'a> SerializationOutput<'a> {
    pub(crate) fn new(factory: &'a SerializerFactory) -> Self {
        SerializationOutput {
            factory,
            schema: Schema::default(),
        }
    }

    pub(crate) fn into_schema(self) -> Schema {
        self.schema
    }

    /// Encode any value
    pub fn write<T: Encodable>(&mut self, value: &T) -> Result<Element> {
        value.encode(self)
    }

    /// Encode through the registry or the generic object serializer
    pub fn write_object<T: Encodable>(&mut self, value: &T) -> Result<Element> {
        self.write_dyn(value, std::any::type_name::<T>(), None)
    }

    /// Registry first, then a class loaded in scope, then `native` if the
    /// value is a primitive or collection held in a type-erased slot
    pub(crate) fn write_dyn(
        &mut self,
        value: &dyn Any,
        rust_name: &str,
        native: Option<&NativeCodec>,
    ) -> Result<Element> {
        let factory = self.factory;
        let type_id = value.type_id();

        if let Some(serializer) = factory.registry().by_type(type_id) {
            let body = serializer.write(value, self)?;
            self.schema.add(TypeNotation::Restricted {
                name: serializer.descriptor().to_string(),
                serializer: serializer.id().to_string(),
            });
            return Ok(Element::described(serializer.descriptor(), body));
        }

        let class = match (factory.scope().class_of(type_id), native) {
            (Some(class), _) => class,
            (None, Some(native)) => {
                let body = native.encode(value, self)?;
                return Ok(Element::described(native.descriptor(), body));
            }
            (None, None) => return Err(SerializationError::UnknownType(rust_name.to_string())),
        };
        factory.check_admitted(class.name())?;

        let mut writer = FieldWriter {
            output: self,
            names: Vec::new(),
            values: Vec::new(),
        };
        class.write_fields(value, &mut writer)?;
        let FieldWriter { names, values, .. } = writer;

        match self.schema.composite_fields(class.name()) {
            Some(existing) if existing != names.as_slice() => {
                return Err(SerializationError::mismatch(
                    format!("consistent field layout for {}", class.name()),
                    "a different layout",
                ));
            }
            Some(_) => {}
            None => self.schema.add(TypeNotation::Composite {
                name: class.name().to_string(),
                fields: names,
            }),
        }
        Ok(Element::described(class.name(), Element::List(values)))
    }
}

/// Named-field writer handed to [`Portable::write_fields`]
pub struct FieldWriter<'w, 'a> {
    output: &'w mut SerializationOutput<'a>,
    names: Vec<FieldNotation>,
    values: Vec<Element>,
}

impl<'w, 'a> FieldWriter<'w, 'a> {
    /// Write one field
    pub fn field<T: Encodable>(&mut self, name: &str, value: &T) -> Result<()> {
        if self.names.iter().any(|f| f.name == name) {
            return Err(SerializationError::mismatch(
                "unique field names",
                format!("field {} written twice", name),
            ));
        }
        let element = self.output.write(value)?;
        self.names.push(FieldNotation {
            name: name.to_string(),
        });
        self.values.push(element);
        Ok(())
    }
}

// =============================================================================
// Deserialization side
// =============================================================================

/// Decoder state for one envelope
pub struct DeserializationInput<'a> {
    factory: &'a SerializerFactory,
    schema: &'a Schema,
}

impl<'a> DeserializationInput<'a> {
    pub(crate) fn new(factory: &'a SerializerFactory, schema: &'a Schema) -> Self {
        DeserializationInput { factory, schema }
    }

    /// Decode any value
    pub fn read<T: Encodable>(&mut self, element: &Element) -> Result<T> {
        T::decode(element, self)
    }

    /// Decode through the registry or the generic object serializer
    pub fn read_object<T: Encodable>(&mut self, element: &Element) -> Result<T> {
        let rust_name = std::any::type_name::<T>();
        let boxed = self.read_typed(TypeId::of::<T>(), rust_name, element)?;
        boxed
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| SerializationError::mismatch(rust_name, "value of another type"))
    }

    fn read_typed(
        &mut self,
        type_id: TypeId,
        rust_name: &str,
        element: &Element,
    ) -> Result<Box<dyn Any + Send + Sync>> {
        let factory = self.factory;
        let (descriptor, body) = split_described(element, rust_name)?;

        if let Some(serializer) = factory.registry().by_type(type_id) {
            if serializer.descriptor() != descriptor {
                return Err(SerializationError::mismatch(serializer.descriptor(), descriptor));
            }
            return serializer.read(body, self);
        }

        let class = factory
            .scope()
            .class_of(type_id)
            .ok_or_else(|| SerializationError::UnknownType(rust_name.to_string()))?;
        if class.name() != descriptor {
            return Err(SerializationError::mismatch(class.name(), descriptor));
        }
        self.read_composite(&class, body)
    }

    /// True if `name` is a registered descriptor or a type loaded in scope
    pub fn resolves(&self, name: &str) -> bool {
        self.factory.registry().by_descriptor(name).is_some()
            || self.factory.scope().resolve(name).is_some()
    }

    /// Decode a value whose type is only known from its descriptor
    pub fn read_dynamic(&mut self, element: &Element) -> Result<AnyObject> {
        let factory = self.factory;
        let (descriptor, body) = split_described(element, "described value")?;

        if let Some(serializer) = factory.registry().by_descriptor(descriptor) {
            let value = serializer.read(body, self)?;
            return Ok(AnyObject::from_boxed(value, descriptor, None));
        }

        if let Some(class) = factory.scope().resolve(descriptor) {
            let value = self.read_composite(&class, body)?;
            return Ok(AnyObject::from_boxed(value, descriptor, None));
        }

        let native = native::native_codec(descriptor)
            .ok_or_else(|| SerializationError::UnknownType(descriptor.to_string()))?;
        let value = native.decode(body, self)?;
        Ok(AnyObject::from_boxed(value, descriptor, Some(native)))
    }

    fn read_composite(
        &mut self,
        class: &ClassInfo,
        body: &Element,
    ) -> Result<Box<dyn Any + Send + Sync>> {
        self.factory.check_admitted(class.name())?;
        let schema: &'a Schema = self.schema;
        let names = schema.composite_fields(class.name()).ok_or_else(|| {
            SerializationError::mismatch(
                format!("schema entry for {}", class.name()),
                "no entry",
            )
        })?;
        let values = body.as_list(class.name())?;
        if values.len() != names.len() {
            return Err(SerializationError::mismatch(
                format!("{} fields", names.len()),
                format!("{} values", values.len()),
            ));
        }
        let mut reader = FieldReader {
            input: self,
            type_name: class.name(),
            names,
            values,
        };
        class.read_fields(&mut reader)
    }
}

fn split_described<'e>(element: &'e Element, expected: &str) -> Result<(&'e str, &'e Element)> {
    match element {
        Element::Described { descriptor, value } => Ok((descriptor.as_str(), value.as_ref())),
        other => Err(SerializationError::mismatch(expected, other.kind())),
    }
}

/// Named-field reader handed to [`Portable::read_fields`]
pub struct FieldReader<'r, 'a> {
    input: &'r mut DeserializationInput<'a>,
    type_name: &'static str,
    names: &'r [FieldNotation],
    values: &'r [Element],
}

impl<'r, 'a> FieldReader<'r, 'a> {
    /// Read a required field
    pub fn field<T: Encodable>(&mut self, name: &str) -> Result<T> {
        match self.optional_field(name)? {
            Some(value) => Ok(value),
            None => Err(SerializationError::mismatch(
                format!("field {} of {}", name, self.type_name),
                "absent",
            )),
        }
    }

    /// Read a field that older writers may not have produced
    pub fn optional_field<T: Encodable>(&mut self, name: &str) -> Result<Option<T>> {
        let values = self.values;
        match self.names.iter().position(|f| f.name == name) {
            Some(index) => {
                let element = values.get(index).ok_or_else(|| {
                    SerializationError::mismatch(format!("value for {}", name), "none")
                })?;
                self.input.read(element).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Portable name of the type being read
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// =============================================================================
// Native encodings
// =============================================================================

macro_rules! signed_encodable {
    ($($t:ty => $name:literal),*) => {$(
        impl Encodable for $t {
            fn native_descriptor() -> Option<String> {
                Some($name.to_string())
            }

            fn encode(&self, _: &mut SerializationOutput<'_>) -> Result<Element> {
                Ok(Element::Long(i64::from(*self)))
            }

            fn decode(element: &Element, _: &mut DeserializationInput<'_>) -> Result<Self> {
                let v = element.as_long(stringify!($t))?;
                <$t>::try_from(v).map_err(|_| {
                    SerializationError::mismatch(stringify!($t), format!("out of range {}", v))
                })
            }
        }
    )*};
}

macro_rules! unsigned_encodable {
    ($($t:ty => $name:literal),*) => {$(
        impl Encodable for $t {
            fn native_descriptor() -> Option<String> {
                Some($name.to_string())
            }

            fn encode(&self, _: &mut SerializationOutput<'_>) -> Result<Element> {
                Ok(Element::ULong(u64::from(*self)))
            }

            fn decode(element: &Element, _: &mut DeserializationInput<'_>) -> Result<Self> {
                match element {
                    Element::ULong(v) => <$t>::try_from(*v).map_err(|_| {
                        SerializationError::mismatch(stringify!($t), format!("out of range {}", v))
                    }),
                    other => Err(SerializationError::mismatch(stringify!($t), other.kind())),
                }
            }
        }
    )*};
}

signed_encodable!(i8 => "byte", i16 => "short", i32 => "int", i64 => "long");
unsigned_encodable!(u8 => "ubyte", u16 => "ushort", u32 => "uint", u64 => "ulong");

impl Encodable for bool {
    fn native_descriptor() -> Option<String> {
        Some("boolean".to_string())
    }

    fn encode(&self, _: &mut SerializationOutput<'_>) -> Result<Element> {
        Ok(Element::Bool(*self))
    }

    fn decode(element: &Element, _: &mut DeserializationInput<'_>) -> Result<Self> {
        match element {
            Element::Bool(v) => Ok(*v),
            other => Err(SerializationError::mismatch("bool", other.kind())),
        }
    }
}

impl Encodable for f64 {
    fn native_descriptor() -> Option<String> {
        Some("double".to_string())
    }

    fn encode(&self, _: &mut SerializationOutput<'_>) -> Result<Element> {
        Ok(Element::Double(*self))
    }

    fn decode(element: &Element, _: &mut DeserializationInput<'_>) -> Result<Self> {
        match element {
            Element::Double(v) => Ok(*v),
            other => Err(SerializationError::mismatch("f64", other.kind())),
        }
    }
}

impl Encodable for char {
    fn native_descriptor() -> Option<String> {
        Some("char".to_string())
    }

    fn encode(&self, _: &mut SerializationOutput<'_>) -> Result<Element> {
        Ok(Element::Char(*self))
    }

    fn decode(element: &Element, _: &mut DeserializationInput<'_>) -> Result<Self> {
        match element {
            Element::Char(v) => Ok(*v),
            other => Err(SerializationError::mismatch("char", other.kind())),
        }
    }
}

impl Encodable for String {
    fn native_descriptor() -> Option<String> {
        Some("string".to_string())
    }

    fn encode(&self, _: &mut SerializationOutput<'_>) -> Result<Element> {
        Ok(Element::String(self.clone()))
    }

    fn decode(element: &Element, _: &mut DeserializationInput<'_>) -> Result<Self> {
        element.as_str("string").map(str::to_string)
    }
}

impl<T: Encodable> Encodable for Vec<T> {
    fn native_descriptor() -> Option<String> {
        native::list_of::<T>("list")
    }

    fn encode(&self, output: &mut SerializationOutput<'_>) -> Result<Element> {
        let items = self
            .iter()
            .map(|item| output.write(item))
            .collect::<Result<Vec<_>>>()?;
        Ok(Element::List(items))
    }

    fn decode(element: &Element, input: &mut DeserializationInput<'_>) -> Result<Self> {
        element
            .as_list("list")?
            .iter()
            .map(|item| input.read(item))
            .collect()
    }
}

impl<T: Encodable> Encodable for Option<T> {
    fn native_descriptor() -> Option<String> {
        native::list_of::<T>("optional")
    }

    fn encode(&self, output: &mut SerializationOutput<'_>) -> Result<Element> {
        match self {
            Some(value) => Ok(Element::List(vec![output.write(value)?])),
            None => Ok(Element::Null),
        }
    }

    fn decode(element: &Element, input: &mut DeserializationInput<'_>) -> Result<Self> {
        match element {
            Element::Null => Ok(None),
            other => {
                let items = other.as_tuple("optional value", 1)?;
                input.read(&items[0]).map(Some)
            }
        }
    }
}

impl<T: Encodable + Ord> Encodable for BTreeSet<T> {
    fn native_descriptor() -> Option<String> {
        native::list_of::<T>("set")
    }

    fn encode(&self, output: &mut SerializationOutput<'_>) -> Result<Element> {
        let items = self
            .iter()
            .map(|item| output.write(item))
            .collect::<Result<Vec<_>>>()?;
        Ok(Element::List(items))
    }

    fn decode(element: &Element, input: &mut DeserializationInput<'_>) -> Result<Self> {
        element
            .as_list("set")?
            .iter()
            .map(|item| input.read(item))
            .collect()
    }
}

fn encode_entries<'e, K, V, I>(entries: I, output: &mut SerializationOutput<'_>) -> Result<Element>
where
    K: Encodable,
    V: Encodable,
    I: Iterator<Item = (&'e K, &'e V)>,
{
    let pairs = entries
        .map(|(k, v)| -> Result<(Element, Element)> { Ok((output.write(k)?, output.write(v)?)) })
        .collect::<Result<Vec<_>>>()?;
    Ok(Element::Map(pairs))
}

fn decode_entries<K, V, C>(element: &Element, input: &mut DeserializationInput<'_>) -> Result<C>
where
    K: Encodable,
    V: Encodable,
    C: FromIterator<(K, V)>,
{
    match element {
        Element::Map(pairs) => pairs
            .iter()
            .map(|(k, v)| -> Result<(K, V)> { Ok((input.read(k)?, input.read(v)?)) })
            .collect(),
        other => Err(SerializationError::mismatch("map", other.kind())),
    }
}

impl<K: Encodable + Ord, V: Encodable> Encodable for BTreeMap<K, V> {
    fn native_descriptor() -> Option<String> {
        native::map_of::<K, V>("map")
    }

    fn encode(&self, output: &mut SerializationOutput<'_>) -> Result<Element> {
        encode_entries(self.iter(), output)
    }

    fn decode(element: &Element, input: &mut DeserializationInput<'_>) -> Result<Self> {
        decode_entries(element, input)
    }
}

impl<K: Encodable + Eq + Hash, V: Encodable> Encodable for HashMap<K, V> {
    fn native_descriptor() -> Option<String> {
        native::map_of::<K, V>("hashmap")
    }

    fn encode(&self, output: &mut SerializationOutput<'_>) -> Result<Element> {
        encode_entries(self.iter(), output)
    }

    fn decode(element: &Element, input: &mut DeserializationInput<'_>) -> Result<Self> {
        decode_entries(element, input)
    }
}

impl<A: Encodable, B: Encodable> Encodable for (A, B) {
    fn native_descriptor() -> Option<String> {
        native::map_of::<A, B>("pair")
    }

    fn encode(&self, output: &mut SerializationOutput<'_>) -> Result<Element> {
        Ok(Element::List(vec![output.write(&self.0)?, output.write(&self.1)?]))
    }

    fn decode(element: &Element, input: &mut DeserializationInput<'_>) -> Result<Self> {
        let items = element.as_tuple("pair", 2)?;
        Ok((input.read(&items[0])?, input.read(&items[1])?))
    }
}
