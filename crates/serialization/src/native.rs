//! Descriptors for natively encoded values in type-erased slots
//!
//! Primitives and collections encode without a descriptor. When one of them
//! sits in an [`AnyObject`](crate::any::AnyObject) it is wrapped in a
//! composed descriptor such as `list<int>` or `map<string,optional<uint>>`,
//! and the reader looks the descriptor up here to pick the decoder.
//!
//! The table is process-wide. Primitives are present from the start;
//! composed types are added the first time a value of that type is erased,
//! or up front through [`register_native`] when a process must restore
//! values it has not produced itself.

use crate::codec::{DeserializationInput, Encodable, SerializationOutput};
use crate::element::Element;
use crate::error::{Result, SerializationError};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

type EncodeFn = fn(&dyn Any, &mut SerializationOutput<'_>) -> Result<Element>;
type DecodeFn = fn(&Element, &mut DeserializationInput<'_>) -> Result<Box<dyn Any + Send + Sync>>;

/// Erased encoder and decoder for one native type
pub struct NativeCodec {
    descriptor: String,
    encode: EncodeFn,
    decode: DecodeFn,
}

impl NativeCodec {
    fn of<T: Encodable>(descriptor: String) -> Self {
        NativeCodec {
            descriptor,
            encode: encode_erased::<T>,
            decode: decode_erased::<T>,
        }
    }

    /// Composed descriptor
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub(crate) fn encode(&self, value: &dyn Any, output: &mut SerializationOutput<'_>) -> Result<Element> {
        (self.encode)(value, output)
    }

    pub(crate) fn decode(
        &self,
        element: &Element,
        input: &mut DeserializationInput<'_>,
    ) -> Result<Box<dyn Any + Send + Sync>> {
        (self.decode)(element, input)
    }
}

impl std::fmt::Debug for NativeCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NativeCodec({})", self.descriptor)
    }
}

fn encode_erased<T: Encodable>(value: &dyn Any, output: &mut SerializationOutput<'_>) -> Result<Element> {
    let value = value.downcast_ref::<T>().ok_or_else(|| {
        SerializationError::mismatch(std::any::type_name::<T>(), "value of another type")
    })?;
    value.encode(output)
}

fn decode_erased<T: Encodable>(
    element: &Element,
    input: &mut DeserializationInput<'_>,
) -> Result<Box<dyn Any + Send + Sync>> {
    Ok(Box::new(T::decode(element, input)?))
}

static NATIVE_CODECS: Lazy<RwLock<FxHashMap<String, Arc<NativeCodec>>>> = Lazy::new(|| {
    let mut table = FxHashMap::default();
    seed::<i8>(&mut table);
    seed::<i16>(&mut table);
    seed::<i32>(&mut table);
    seed::<i64>(&mut table);
    seed::<u8>(&mut table);
    seed::<u16>(&mut table);
    seed::<u32>(&mut table);
    seed::<u64>(&mut table);
    seed::<bool>(&mut table);
    seed::<f64>(&mut table);
    seed::<char>(&mut table);
    seed::<String>(&mut table);
    RwLock::new(table)
});

fn seed<T: Encodable>(table: &mut FxHashMap<String, Arc<NativeCodec>>) {
    if let Some(descriptor) = T::native_descriptor() {
        table.insert(descriptor.clone(), Arc::new(NativeCodec::of::<T>(descriptor)));
    }
}

/// Make `T` decodable from a type-erased slot
///
/// Returns the codec, or `None` if `T` has no native descriptor (registry
/// and [`Portable`](crate::codec::Portable) types are resolved elsewhere).
pub fn register_native<T: Encodable>() -> Option<Arc<NativeCodec>> {
    let descriptor = T::native_descriptor()?;
    if let Some(codec) = NATIVE_CODECS.read().get(&descriptor) {
        return Some(Arc::clone(codec));
    }
    let mut table = NATIVE_CODECS.write();
    let codec = table.entry(descriptor.clone()).or_insert_with(|| {
        debug!(descriptor = %descriptor, "registering native codec");
        Arc::new(NativeCodec::of::<T>(descriptor.clone()))
    });
    Some(Arc::clone(codec))
}

pub(crate) fn native_codec(descriptor: &str) -> Option<Arc<NativeCodec>> {
    NATIVE_CODECS.read().get(descriptor).cloned()
}

pub(crate) fn list_of<T: Encodable>(kind: &str) -> Option<String> {
    T::native_descriptor().map(|inner| format!("{}<{}>", kind, inner))
}

pub(crate) fn map_of<K: Encodable, V: Encodable>(kind: &str) -> Option<String> {
    Some(format!(
        "{}<{},{}>",
        kind,
        K::native_descriptor()?,
        V::native_descriptor()?
    ))
}
