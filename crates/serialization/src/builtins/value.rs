//! Value serializers: throwables, keys, decimals, class references, sets,
//! raw bytes and boxed primitives

use crate::codec::Encodable;
use crate::element::Element;
use crate::error::SerializationError;
use ledgerflow_core::{
    BigDecimal, BitSet, ClassRef, Currency, EnumSet, FlowId, KeyAlgorithm, OpaqueBytes,
    PrivateKey, ThrowableValue,
};
use std::collections::BTreeSet;

impl Encodable for ThrowableValue {}
impl Encodable for PrivateKey {}
impl Encodable for BigDecimal {}
impl Encodable for Currency {}
impl Encodable for ClassRef {}
impl Encodable for BitSet {}
impl Encodable for EnumSet {}
impl Encodable for OpaqueBytes {}
impl Encodable for FlowId {}

builtin_serializer! {
    /// Error type, message and cause chain
    ThrowableSerializer: ThrowableValue = "error.Throwable";
    write(value, output) {
        Ok(Element::List(vec![
            Element::String(value.type_name().to_string()),
            output.write(&value.message().map(str::to_string))?,
            output.write(&ThrowableValue::cause(value).cloned())?,
        ]))
    }
    read(element, input) {
        let parts = element.as_tuple("throwable", 3)?;
        let type_name = parts[0].as_str("throwable type")?;
        let message: Option<String> = input.read(&parts[1])?;
        let cause: Option<ThrowableValue> = input.read(&parts[2])?;
        let throwable = ThrowableValue::new(type_name, message);
        Ok(match cause {
            Some(cause) => throwable.with_cause(cause),
            None => throwable,
        })
    }
}

builtin_serializer! {
    /// Algorithm name plus encoded key
    PrivateKeySerializer: PrivateKey = "security.PrivateKey";
    write(value, output) {
        Ok(Element::List(vec![
            Element::String(value.algorithm().name().to_string()),
            Element::Binary(value.encoded().to_vec()),
        ]))
    }
    read(element, input) {
        let parts = element.as_tuple("private key", 2)?;
        let algorithm = KeyAlgorithm::from_name(parts[0].as_str("key algorithm")?);
        Ok(PrivateKey::new(algorithm, parts[1].as_binary("key bytes")?.to_vec())?)
    }
}

builtin_serializer! {
    /// Unscaled digits and scale
    BigDecimalSerializer: BigDecimal = "math.BigDecimal";
    write(value, output) {
        Ok(Element::List(vec![
            Element::String(value.unscaled()),
            Element::Long(i64::from(value.scale())),
        ]))
    }
    read(element, input) {
        let parts = element.as_tuple("decimal", 2)?;
        let scale = parts[1].as_long("decimal scale")?;
        let scale = u32::try_from(scale)
            .map_err(|_| SerializationError::mismatch("decimal scale", scale.to_string()))?;
        Ok(BigDecimal::from_unscaled(parts[0].as_str("decimal digits")?, scale)?)
    }
}

builtin_serializer! {
    /// ISO-4217 code
    CurrencySerializer: Currency = "money.Currency";
    write(value, output) {
        Ok(Element::String(value.code().to_string()))
    }
    read(element, input) {
        Ok(Currency::new(element.as_str("currency code")?)?)
    }
}

builtin_serializer! {
    /// Type name; decoding requires the name to resolve in the reader's scope
    ClassRefSerializer: ClassRef = "lang.Class";
    write(value, output) {
        Ok(Element::String(value.name().to_string()))
    }
    read(element, input) {
        let name = element.as_str("class name")?;
        if !input.resolves(name) {
            return Err(SerializationError::UnknownType(name.to_string()));
        }
        Ok(ClassRef::new(name)?)
    }
}

builtin_serializer! {
    /// Little-endian bytes with trailing zero bytes dropped
    BitSetSerializer: BitSet = "util.BitSet";
    write(value, output) {
        let mut bytes: Vec<u8> = value.words().iter().flat_map(|w| w.to_le_bytes()).collect();
        while bytes.last() == Some(&0) {
            bytes.pop();
        }
        Ok(Element::Binary(bytes))
    }
    read(element, input) {
        let words = element
            .as_binary("bit-set bytes")?
            .chunks(8)
            .map(|chunk| {
                let mut word = [0u8; 8];
                word[..chunk.len()].copy_from_slice(chunk);
                u64::from_le_bytes(word)
            })
            .collect();
        Ok(BitSet::from_words(words))
    }
}

builtin_serializer! {
    /// Element type plus constant names
    EnumSetSerializer: EnumSet = "util.EnumSet";
    write(value, output) {
        Ok(Element::List(vec![
            Element::String(value.element_type().to_string()),
            output.write(value.constants())?,
        ]))
    }
    read(element, input) {
        let parts = element.as_tuple("enum set", 2)?;
        let constants: BTreeSet<String> = input.read(&parts[1])?;
        Ok(EnumSet::of(parts[0].as_str("enum type")?, constants))
    }
}

builtin_serializer! {
    /// Raw bytes
    OpaqueBytesSerializer: OpaqueBytes = "bytes.OpaqueBytes";
    write(value, output) {
        Ok(Element::Binary(value.as_slice().to_vec()))
    }
    read(element, input) {
        Ok(OpaqueBytes::from(element.as_binary("opaque bytes")?))
    }
}

builtin_serializer! {
    /// UUID bytes
    FlowIdSerializer: FlowId = "flow.FlowId";
    write(value, output) {
        Ok(Element::Binary(value.as_bytes().to_vec()))
    }
    read(element, input) {
        let bytes = element.as_binary("flow id")?;
        let bytes: [u8; 16] = bytes
            .try_into()
            .map_err(|_| SerializationError::mismatch("16 byte flow id", format!("{} bytes", bytes.len())))?;
        Ok(FlowId::from_bytes(bytes))
    }
}

macro_rules! boxed_serializer {
    ($name:ident, $target:ty, $descriptor:literal) => {
        builtin_serializer! {
            /// Boxed primitive, used when the value sits in a type-erased slot
            $name: $target = $descriptor;
            write(value, output) {
                output.write(value)
            }
            read(element, input) {
                input.read(element)
            }
        }
    };
}

boxed_serializer!(BoxedLongSerializer, i64, "primitive.long");
boxed_serializer!(BoxedULongSerializer, u64, "primitive.ulong");
boxed_serializer!(BoxedBoolSerializer, bool, "primitive.boolean");
boxed_serializer!(BoxedDoubleSerializer, f64, "primitive.double");
boxed_serializer!(BoxedCharSerializer, char, "primitive.char");
boxed_serializer!(BoxedStringSerializer, String, "primitive.string");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::test_support::roundtrip;

    #[test]
    fn test_throwable_with_causes() {
        let t = ThrowableValue::new("app.TransferFailed", Some("insufficient funds".into()))
            .with_cause(ThrowableValue::new("io.Timeout", None));
        assert_eq!(roundtrip(&t), t);
    }

    #[test]
    fn test_private_key() {
        let key = PrivateKey::new(KeyAlgorithm::Ed25519, vec![9; 32]).unwrap();
        assert_eq!(roundtrip(&key), key);
    }

    #[test]
    fn test_decimals() {
        for text in ["0", "0.000", "-1", "-123.456", "0.1", "98765432109876543210.0123456789"] {
            let d: BigDecimal = text.parse().unwrap();
            assert_eq!(roundtrip(&d), d, "{text}");
        }
    }

    #[test]
    fn test_currency() {
        let c = Currency::new("CHF").unwrap();
        assert_eq!(roundtrip(&c), c);
    }

    #[test]
    fn test_bit_sets() {
        let empty = BitSet::new();
        let full = BitSet::from_words(vec![u64::MAX; 3]);
        let sparse: BitSet = [0usize, 9, 64, 1000].into_iter().collect();
        for set in [empty, full, sparse] {
            assert_eq!(roundtrip(&set), set);
        }
    }

    #[test]
    fn test_enum_sets() {
        let empty = EnumSet::empty("app.Colour");
        let some = EnumSet::of("app.Colour", ["RED", "GREEN"]);
        assert_eq!(roundtrip(&empty), empty);
        assert_eq!(roundtrip(&some), some);
    }

    #[test]
    fn test_opaque_bytes_and_flow_id() {
        let bytes = OpaqueBytes::new(vec![0, 1, 2, 255]);
        assert_eq!(roundtrip(&bytes), bytes);
        let empty = OpaqueBytes::default();
        assert_eq!(roundtrip(&empty), empty);
        let id = FlowId::new();
        assert_eq!(roundtrip(&id), id);
    }

    #[test]
    fn test_class_ref_requires_resolvable_name() {
        use crate::builtins::test_support::{factory, MAGIC};
        let factory = factory();
        let known = ClassRef::new("math.BigDecimal").unwrap();
        let bytes = factory.serialize(&known, MAGIC).unwrap();
        assert_eq!(factory.deserialize::<ClassRef>(bytes.as_bytes(), MAGIC).unwrap(), known);

        let unknown = ClassRef::new("app.Missing").unwrap();
        let bytes = factory.serialize(&unknown, MAGIC).unwrap();
        let err = factory.deserialize::<ClassRef>(bytes.as_bytes(), MAGIC).unwrap_err();
        assert!(matches!(err, SerializationError::UnknownType(ref n) if n == "app.Missing"));
    }
}
