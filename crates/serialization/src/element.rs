//! Envelope format
//!
//! A serialized envelope is the scheme's magic followed by a bincode encoded
//! [`Envelope`]:
//!
//! ```text
//! ┌───────────────────┬──────────────────────────────────────┐
//! │ magic (7 bytes)   │ bincode(Envelope { schema, body })   │
//! │ "lflow" fam ver   │                                      │
//! └───────────────────┴──────────────────────────────────────┘
//! ```
//!
//! The body is a tree of [`Element`]s. Anything that is not a primitive or a
//! collection is wrapped in [`Element::Described`], whose descriptor names
//! either a registered serializer or a composite type listed in the schema.
//!
//! The magic is compared before any payload byte is decoded. Payloads are
//! read with a byte limit of [`MAX_PAYLOAD_LEN`] and elements may nest at
//! most [`MAX_ELEMENT_DEPTH`] deep; past either bound the envelope is
//! [`SerializationError::Malformed`].

use crate::error::{Result, SerializationError};
use bincode::Options;
use ledgerflow_core::types::MAGIC_LEN;
use ledgerflow_core::SerializationMagic;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::cell::Cell;

/// Largest payload an envelope may carry, in bytes
pub const MAX_PAYLOAD_LEN: u64 = 64 * 1024 * 1024;

/// Deepest element nesting accepted when decoding
pub const MAX_ELEMENT_DEPTH: usize = 128;

/// One node of an encoded object graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Element {
    /// Absent value
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Long(i64),
    /// Unsigned integer
    ULong(u64),
    /// Floating point
    Double(f64),
    /// Unicode scalar
    Char(char),
    /// Text
    String(String),
    /// Raw bytes
    Binary(Vec<u8>),
    /// Ordered sequence
    List(Vec<Element>),
    /// Key/value pairs in encounter order
    Map(Vec<(Element, Element)>),
    /// A typed value: descriptor plus its encoded body
    Described {
        /// Serializer descriptor or composite type name
        descriptor: String,
        /// Encoded body
        value: Box<Element>,
    },
}

// Decoding goes through `ElementDef` so every nested element passes the
// depth guard below.
#[allow(dead_code)]
#[derive(Deserialize)]
#[serde(remote = "Element")]
enum ElementDef {
    Null,
    Bool(bool),
    Long(i64),
    ULong(u64),
    Double(f64),
    Char(char),
    String(String),
    Binary(Vec<u8>),
    List(Vec<Element>),
    Map(Vec<(Element, Element)>),
    Described {
        descriptor: String,
        value: Box<Element>,
    },
}

thread_local! {
    static DECODE_DEPTH: Cell<usize> = Cell::new(0);
}

struct DepthGuard;

impl DepthGuard {
    fn enter() -> Option<DepthGuard> {
        DECODE_DEPTH.with(|depth| {
            if depth.get() >= MAX_ELEMENT_DEPTH {
                None
            } else {
                depth.set(depth.get() + 1);
                Some(DepthGuard)
            }
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DECODE_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let _guard = DepthGuard::enter().ok_or_else(|| {
            D::Error::custom(format!("elements nested deeper than {}", MAX_ELEMENT_DEPTH))
        })?;
        ElementDef::deserialize(deserializer)
    }
}

impl Element {
    /// Short name of the element kind, used in mismatch errors
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Null => "null",
            Element::Bool(_) => "bool",
            Element::Long(_) => "long",
            Element::ULong(_) => "ulong",
            Element::Double(_) => "double",
            Element::Char(_) => "char",
            Element::String(_) => "string",
            Element::Binary(_) => "binary",
            Element::List(_) => "list",
            Element::Map(_) => "map",
            Element::Described { .. } => "described",
        }
    }

    /// Wrap a body under a descriptor
    pub fn described(descriptor: impl Into<String>, value: Element) -> Self {
        Element::Described {
            descriptor: descriptor.into(),
            value: Box::new(value),
        }
    }

    /// Borrow the items of a list, or fail with a mismatch naming `expected`
    pub fn as_list(&self, expected: &str) -> Result<&[Element]> {
        match self {
            Element::List(items) => Ok(items),
            other => Err(SerializationError::mismatch(expected, other.kind())),
        }
    }

    /// Borrow the items of a list of exactly `len` elements
    pub fn as_tuple(&self, expected: &str, len: usize) -> Result<&[Element]> {
        let items = self.as_list(expected)?;
        if items.len() != len {
            return Err(SerializationError::mismatch(
                format!("{} with {} parts", expected, len),
                format!("{} parts", items.len()),
            ));
        }
        Ok(items)
    }

    /// Signed integer value
    pub fn as_long(&self, expected: &str) -> Result<i64> {
        match self {
            Element::Long(v) => Ok(*v),
            other => Err(SerializationError::mismatch(expected, other.kind())),
        }
    }

    /// Text value
    pub fn as_str(&self, expected: &str) -> Result<&str> {
        match self {
            Element::String(v) => Ok(v),
            other => Err(SerializationError::mismatch(expected, other.kind())),
        }
    }

    /// Byte value
    pub fn as_binary(&self, expected: &str) -> Result<&[u8]> {
        match self {
            Element::Binary(v) => Ok(v),
            other => Err(SerializationError::mismatch(expected, other.kind())),
        }
    }
}

// =============================================================================
// Schema
// =============================================================================

/// A named field of a composite type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldNotation {
    /// Field name
    pub name: String,
}

/// How a descriptor found in the body is encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeNotation {
    /// Generic object: positional list of the named fields
    Composite {
        /// Portable type name
        name: String,
        /// Fields in encoding order
        fields: Vec<FieldNotation>,
    },
    /// Handled by a registered serializer
    Restricted {
        /// Serializer descriptor
        name: String,
        /// Serializer id that produced it
        serializer: String,
    },
}

impl TypeNotation {
    /// Descriptor this notation describes
    pub fn name(&self) -> &str {
        match self {
            TypeNotation::Composite { name, .. } | TypeNotation::Restricted { name, .. } => name,
        }
    }
}

/// Type notations for every descriptor used in an envelope body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    types: Vec<TypeNotation>,
}

impl Schema {
    /// Add a notation unless one with the same name is present
    pub fn add(&mut self, notation: TypeNotation) {
        if self.get(notation.name()).is_none() {
            self.types.push(notation);
        }
    }

    /// Notation for a descriptor
    pub fn get(&self, name: &str) -> Option<&TypeNotation> {
        self.types.iter().find(|t| t.name() == name)
    }

    /// Field list of a composite type
    pub fn composite_fields(&self, name: &str) -> Option<&[FieldNotation]> {
        match self.get(name) {
            Some(TypeNotation::Composite { fields, .. }) => Some(fields),
            _ => None,
        }
    }

    /// All notations in first-use order
    pub fn types(&self) -> &[TypeNotation] {
        &self.types
    }
}

/// Schema plus body: the decoded payload of an envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Type notations
    pub schema: Schema,
    /// Encoded value
    pub body: Element,
}

impl Envelope {
    /// Frame as `magic || bincode(self)`
    pub fn encode(&self, magic: SerializationMagic) -> Result<Vec<u8>> {
        let payload = payload_codec()
            .serialize(self)
            .map_err(|e| SerializationError::Malformed(e.to_string()))?;
        let mut out = Vec::with_capacity(MAGIC_LEN + payload.len());
        out.extend_from_slice(magic.as_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Check the magic, then decode the payload
    pub fn decode(magic: SerializationMagic, bytes: &[u8]) -> Result<Self> {
        if !magic.matches(bytes) {
            return Err(SerializationError::UnknownMagic(describe_prefix(bytes)));
        }
        payload_codec()
            .deserialize(&bytes[MAGIC_LEN..])
            .map_err(|e| SerializationError::Malformed(e.to_string()))
    }
}

// Same layout as `bincode::serialize`, with a byte limit
fn payload_codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_PAYLOAD_LEN)
        .with_fixint_encoding()
        .allow_trailing_bytes()
}

/// Render the leading bytes of a buffer for error messages
pub(crate) fn describe_prefix(bytes: &[u8]) -> String {
    match SerializationMagic::from_prefix(bytes) {
        Some(magic) => magic.to_string(),
        None => {
            let head = &bytes[..bytes.len().min(MAGIC_LEN)];
            let hex: Vec<String> = head.iter().map(|b| format!("{:02x}", b)).collect();
            format!("[{}]", hex.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAGIC: SerializationMagic = SerializationMagic::new(9, 9);

    fn sample() -> Envelope {
        let mut schema = Schema::default();
        schema.add(TypeNotation::Composite {
            name: "test.Point".into(),
            fields: vec![FieldNotation { name: "x".into() }, FieldNotation { name: "y".into() }],
        });
        Envelope {
            schema,
            body: Element::described(
                "test.Point",
                Element::List(vec![Element::Long(1), Element::Long(-2)]),
            ),
        }
    }

    #[test]
    fn test_envelope_roundtrip() {
        let env = sample();
        let bytes = env.encode(MAGIC).unwrap();
        assert!(MAGIC.matches(&bytes));
        assert_eq!(Envelope::decode(MAGIC, &bytes).unwrap(), env);
    }

    #[test]
    fn test_wrong_magic_fails_before_payload() {
        let bytes = sample().encode(MAGIC).unwrap();
        let err = Envelope::decode(SerializationMagic::new(1, 0), &bytes).unwrap_err();
        assert!(matches!(err, SerializationError::UnknownMagic(ref m) if m == "lflow/9.9"));
    }

    #[test]
    fn test_foreign_prefix_rendered_as_hex() {
        let err = Envelope::decode(MAGIC, b"\x00\x01garbage").unwrap_err();
        assert!(matches!(err, SerializationError::UnknownMagic(ref m) if m.starts_with("[00 01")));
    }

    #[test]
    fn test_truncated_payload_is_malformed() {
        let bytes = sample().encode(MAGIC).unwrap();
        let truncated = &bytes[..bytes.len() - 3];
        let err = Envelope::decode(MAGIC, truncated).unwrap_err();
        assert!(matches!(err, SerializationError::Malformed(_)));
    }

    fn nested(depth: usize) -> Element {
        (0..depth).fold(Element::Null, |inner, _| Element::List(vec![inner]))
    }

    /// `[List tag, len = 1]` repeated `depth` times, written by hand so the
    /// encoder's own recursion is not involved
    fn nested_payload(depth: usize) -> Vec<u8> {
        let mut bytes = MAGIC.as_bytes().to_vec();
        bytes.extend_from_slice(&0u64.to_le_bytes()); // empty schema
        for _ in 0..depth {
            bytes.extend_from_slice(&8u32.to_le_bytes());
            bytes.extend_from_slice(&1u64.to_le_bytes());
        }
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes
    }

    #[test]
    fn test_nesting_within_limit() {
        let env = Envelope {
            schema: Schema::default(),
            body: nested(MAX_ELEMENT_DEPTH - 1),
        };
        let bytes = env.encode(MAGIC).unwrap();
        assert_eq!(bytes, nested_payload(MAX_ELEMENT_DEPTH - 1));
        assert_eq!(Envelope::decode(MAGIC, &bytes).unwrap(), env);
    }

    #[test]
    fn test_deep_nesting_is_malformed() {
        let err = Envelope::decode(MAGIC, &nested_payload(500_000)).unwrap_err();
        assert!(matches!(err, SerializationError::Malformed(ref m) if m.contains("nested deeper")));

        // the guard unwinds, so the next decode starts from zero
        let ok = sample().encode(MAGIC).unwrap();
        assert!(Envelope::decode(MAGIC, &ok).is_ok());
    }

    #[test]
    fn test_oversized_length_is_malformed() {
        let mut bytes = MAGIC.as_bytes().to_vec();
        bytes.extend_from_slice(&0u64.to_le_bytes());
        bytes.extend_from_slice(&7u32.to_le_bytes()); // Binary
        bytes.extend_from_slice(&(MAX_PAYLOAD_LEN + 1).to_le_bytes());
        let err = Envelope::decode(MAGIC, &bytes).unwrap_err();
        assert!(matches!(err, SerializationError::Malformed(_)));
    }

    #[test]
    fn test_schema_dedup() {
        let mut schema = Schema::default();
        let notation = TypeNotation::Restricted {
            name: "time.Instant".into(),
            serializer: "builtin:time.Instant".into(),
        };
        schema.add(notation.clone());
        schema.add(notation);
        assert_eq!(schema.types().len(), 1);
        assert!(schema.composite_fields("time.Instant").is_none());
    }
}
