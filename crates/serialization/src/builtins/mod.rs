//! Built-in serializers
//!
//! Serializers for the value types every deployment needs, registered ahead
//! of anything contributed by plugins:
//!
//! | Group | Types |
//! |-------|-------|
//! | [`value`] | throwables, private keys, decimals, currencies, class references, bit-sets, enum-sets, raw bytes, flow ids, boxed primitives |
//! | [`temporal`] | instants, durations, local/zoned/offset date-times, zone ids, year, year-month, month-day, periods |
//! | [`security`] | public keys, certificates, certificate paths, hashes, contract attachments |
//!
//! Every serializer round-trips its value exactly under the value's own
//! equality.

use crate::serializer::Serializer;
use std::sync::Arc;

macro_rules! builtin_serializer {
    (
        $(#[$meta:meta])*
        $name:ident: $target:ty = $descriptor:literal;
        write($value:ident, $output:ident) $write:block
        read($element:ident, $input:ident) $read:block
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl $crate::serializer::TypedSerializer for $name {
            type Target = $target;
            const DESCRIPTOR: &'static str = $descriptor;

            fn serializer_id(&self) -> $crate::serializer::SerializerId {
                $crate::serializer::SerializerId::builtin(concat!("builtin:", $descriptor))
            }

            #[allow(unused_variables)]
            fn write_value(
                &self,
                $value: &$target,
                $output: &mut $crate::codec::SerializationOutput<'_>,
            ) -> $crate::error::Result<$crate::element::Element> $write

            #[allow(unused_variables)]
            fn read_value(
                &self,
                $element: &$crate::element::Element,
                $input: &mut $crate::codec::DeserializationInput<'_>,
            ) -> $crate::error::Result<$target> $read
        }
    };
}

pub mod security;
pub mod temporal;
pub mod value;

pub use security::PublicKeySerializer;

/// General-purpose serializers, in registration order
///
/// The public-key serializer is not part of this list: the scheme registers
/// its designated one right after these.
pub fn standard_serializers() -> Vec<Arc<dyn Serializer>> {
    vec![
        Arc::new(value::ThrowableSerializer),
        Arc::new(value::PrivateKeySerializer),
        Arc::new(value::BigDecimalSerializer),
        Arc::new(value::CurrencySerializer),
        Arc::new(temporal::InstantSerializer),
        Arc::new(temporal::DurationSerializer),
        Arc::new(temporal::LocalDateSerializer),
        Arc::new(temporal::LocalDateTimeSerializer),
        Arc::new(temporal::LocalTimeSerializer),
        Arc::new(temporal::ZonedDateTimeSerializer),
        Arc::new(temporal::ZoneIdSerializer),
        Arc::new(temporal::OffsetTimeSerializer),
        Arc::new(temporal::OffsetDateTimeSerializer),
        Arc::new(temporal::YearSerializer),
        Arc::new(temporal::YearMonthSerializer),
        Arc::new(temporal::MonthDaySerializer),
        Arc::new(temporal::PeriodSerializer),
        Arc::new(value::ClassRefSerializer),
        Arc::new(security::X509CertificateSerializer),
        Arc::new(security::CertPathSerializer),
        Arc::new(value::BitSetSerializer),
        Arc::new(value::EnumSetSerializer),
        Arc::new(value::OpaqueBytesSerializer),
        Arc::new(value::FlowIdSerializer),
        Arc::new(value::BoxedLongSerializer),
        Arc::new(value::BoxedULongSerializer),
        Arc::new(value::BoxedBoolSerializer),
        Arc::new(value::BoxedDoubleSerializer),
        Arc::new(value::BoxedCharSerializer),
        Arc::new(value::BoxedStringSerializer),
    ]
}

/// Security and attachment serializers, registered after the public-key
/// serializer
pub fn security_serializers() -> Vec<Arc<dyn Serializer>> {
    vec![
        Arc::new(security::SecureHashSerializer),
        Arc::new(security::ContractAttachmentSerializer),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::admission::AdmissionPolicy;
    use crate::codec::Encodable;
    use crate::factory::SerializerFactory;
    use crate::scope::ResolutionScope;
    use ledgerflow_core::SerializationMagic;
    use std::sync::Arc;

    pub const MAGIC: SerializationMagic = SerializationMagic::new(7, 7);

    pub fn factory() -> SerializerFactory {
        let factory = SerializerFactory::new(
            Arc::new(AdmissionPolicy::new()),
            Arc::new(ResolutionScope::new("builtins")),
        );
        for serializer in super::standard_serializers() {
            factory.register_default(serializer).unwrap();
        }
        factory
            .register_default(Arc::new(super::PublicKeySerializer))
            .unwrap();
        for serializer in super::security_serializers() {
            factory.register_default(serializer).unwrap();
        }
        factory
    }

    pub fn roundtrip<T: Encodable>(value: &T) -> T {
        let factory = factory();
        let bytes = factory.serialize(value, MAGIC).unwrap();
        factory.deserialize::<T>(bytes.as_bytes(), MAGIC).unwrap()
    }
}
