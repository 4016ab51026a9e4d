//! Built-in Serializer Tests
//!
//! Values with dedicated serializers round-trip through the node's contexts
//! without being whitelisted.

use crate::*;
use chrono::{DateTime, TimeZone, Utc};
use ledgerflow_core::{BigDecimal, BitSet, Currency};
use proptest::prelude::*;

fn round_trip<T>(node: &Node, value: &T, use_case: UseCase)
where
    T: Encodable + PartialEq + std::fmt::Debug,
{
    let bytes = node.serialize(value, use_case).unwrap();
    let back: T = node.deserialize(bytes.as_bytes(), use_case).unwrap();
    assert_eq!(&back, value);
}

fn decimal(text: &str) -> BigDecimal {
    text.parse().unwrap()
}

// =============================================================================
// INSTANTS
// =============================================================================

#[test]
fn test_epoch_instant() {
    let node = dev_node();
    let epoch: DateTime<Utc> = Utc.timestamp_opt(0, 0).unwrap();
    round_trip(&node, &epoch, UseCase::P2P);
    round_trip(&node, &epoch, UseCase::Checkpoint);
}

#[test]
fn test_far_future_instant() {
    let node = dev_node();
    let far = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
    round_trip(&node, &far, UseCase::Storage);
}

#[test]
fn test_instant_with_nanos() {
    let node = dev_node();
    let instant = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
    round_trip(&node, &instant, UseCase::Checkpoint);
}

// =============================================================================
// BIT SETS
// =============================================================================

#[test]
fn test_empty_bitset() {
    let node = dev_node();
    round_trip(&node, &BitSet::new(), UseCase::P2P);
}

#[test]
fn test_bitset_across_words() {
    let node = dev_node();
    let mut bits = BitSet::new();
    for index in [0, 63, 64, 200] {
        bits.insert(index);
    }
    let bytes = node.serialize(&bits, UseCase::Storage).unwrap();
    let back: BitSet = node.deserialize(bytes.as_bytes(), UseCase::Storage).unwrap();
    assert_eq!(back.iter().collect::<Vec<_>>(), vec![0, 63, 64, 200]);
}

// =============================================================================
// DECIMALS AND CURRENCIES
// =============================================================================

#[test]
fn test_zero_negative_and_fractional_decimals() {
    let node = dev_node();
    for text in ["0", "0.000", "-42", "3.14159", "-0.5", "123456789012345678901234567890.01"] {
        round_trip(&node, &decimal(text), UseCase::P2P);
    }
}

#[test]
fn test_decimal_scale_preserved() {
    let node = dev_node();
    let bytes = node.serialize(&decimal("1.50"), UseCase::Checkpoint).unwrap();
    let back: BigDecimal = node.deserialize(bytes.as_bytes(), UseCase::Checkpoint).unwrap();
    assert_eq!(back.to_string(), "1.50");
    assert_ne!(back, decimal("1.5"));
}

#[test]
fn test_currency() {
    let node = dev_node();
    round_trip(&node, &Currency::new("EUR").unwrap(), UseCase::Storage);
}

#[test]
fn test_rpc_server_needs_transport() {
    let node = dev_node();
    let err = node.serialize(&Currency::new("EUR").unwrap(), UseCase::RpcServer).unwrap_err();
    assert!(matches!(
        err,
        Error::Serialization(ledgerflow_serialization::SerializationError::NotImplemented(_))
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_decimal_round_trip(unscaled in any::<i64>(), scale in 0u32..30) {
        let node = dev_node();
        let value = BigDecimal::from_unscaled(&unscaled.to_string(), scale).unwrap();
        let bytes = node.serialize(&value, UseCase::P2P).unwrap();
        let back: BigDecimal = node.deserialize(bytes.as_bytes(), UseCase::P2P).unwrap();
        prop_assert_eq!(back.to_string(), value.to_string());
    }
}
