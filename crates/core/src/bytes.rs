//! Byte buffers
//!
//! [`OpaqueBytes`] is an owned, uninterpreted byte buffer. [`SerializedBytes`]
//! is a cheaply clonable, immutable buffer tagged with the type it decodes to.

use crate::crypto::SecureHash;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Raw bytes with no interpretation attached
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct OpaqueBytes(Vec<u8>);

impl OpaqueBytes {
    /// Wrap a buffer
    pub fn new(bytes: Vec<u8>) -> Self {
        OpaqueBytes(bytes)
    }

    /// Borrow the contents
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume into the inner buffer
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for OpaqueBytes {
    fn from(bytes: Vec<u8>) -> Self {
        OpaqueBytes(bytes)
    }
}

impl From<&[u8]> for OpaqueBytes {
    fn from(bytes: &[u8]) -> Self {
        OpaqueBytes(bytes.to_vec())
    }
}

impl fmt::Debug for OpaqueBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpaqueBytes({} bytes)", self.0.len())
    }
}

/// Serialized form of a `T`
///
/// The buffer is shared: clones point at the same allocation, which makes
/// the identity check in [`SerializedBytes::same_buffer`] meaningful. Equality
/// compares contents, short-circuiting when both sides share a buffer.
pub struct SerializedBytes<T: ?Sized> {
    bytes: Arc<[u8]>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ?Sized> SerializedBytes<T> {
    /// Wrap an encoded buffer
    pub fn new(bytes: Vec<u8>) -> Self {
        SerializedBytes {
            bytes: Arc::from(bytes),
            _marker: PhantomData,
        }
    }

    /// Borrow the encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True if both values share the same underlying allocation
    pub fn same_buffer(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }

    /// SHA-256 of the encoded bytes
    pub fn hash(&self) -> SecureHash {
        SecureHash::sha256(&self.bytes)
    }

    /// Reinterpret the buffer as the serialized form of another type
    pub fn cast<U: ?Sized>(self) -> SerializedBytes<U> {
        SerializedBytes {
            bytes: self.bytes,
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> Clone for SerializedBytes<T> {
    fn clone(&self) -> Self {
        SerializedBytes {
            bytes: Arc::clone(&self.bytes),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> PartialEq for SerializedBytes<T> {
    fn eq(&self, other: &Self) -> bool {
        self.same_buffer(other) || self.bytes[..] == other.bytes[..]
    }
}

impl<T: ?Sized> Eq for SerializedBytes<T> {}

impl<T: ?Sized> std::hash::Hash for SerializedBytes<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl<T: ?Sized> fmt::Debug for SerializedBytes<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SerializedBytes<{}>({} bytes)",
            std::any::type_name::<T>(),
            self.bytes.len()
        )
    }
}

impl<T: ?Sized> From<Vec<u8>> for SerializedBytes<T> {
    fn from(bytes: Vec<u8>) -> Self {
        SerializedBytes::new(bytes)
    }
}
