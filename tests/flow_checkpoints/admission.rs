//! Type Admission Tests
//!
//! Admission policies, factory caching and use-case routing as seen through
//! the public scheme API.

use crate::*;
use ledgerflow_serialization::{
    AdmissionPolicy, ResolutionScope, SerializationContext, SerializationError,
    SerializationPlugins, SerializationScheme, SerializationSchemeExt, ServerSerializationScheme,
    OBJECT_GRAPH_MAGIC,
};

fn scheme() -> ServerSerializationScheme {
    ServerSerializationScheme::new(Arc::new(SerializationPlugins::new()))
}

fn context(policy: Arc<AdmissionPolicy>, scope: Arc<ResolutionScope>) -> SerializationContext {
    SerializationContext::new(OBJECT_GRAPH_MAGIC, policy, scope, UseCase::P2P)
}

fn payment() -> Payment {
    Payment {
        payee: "carol".to_string(),
        cents: 99,
    }
}

// =============================================================================
// ADMIT
// =============================================================================

#[test]
fn test_admit_twice_fails() {
    let policy = AdmissionPolicy::new();
    policy.admit(["app.Payment"]).unwrap();
    let err = policy.admit(["app.Payment"]).unwrap_err();
    assert!(matches!(err, SerializationError::DuplicateAdmission { .. }));
    assert_eq!(policy.len(), 1);
}

#[test]
fn test_distinct_types_in_two_calls() {
    let policy = AdmissionPolicy::new();
    policy.admit(["app.Payment"]).unwrap();
    policy.admit(["app.Invoice"]).unwrap();
    assert!(policy.is_admitted("app.Payment"));
    assert!(policy.is_admitted("app.Invoice"));
}

#[test]
fn test_batch_with_clash_admits_nothing() {
    let policy = AdmissionPolicy::new();
    policy.admit(["app.Payment"]).unwrap();
    assert!(policy.admit(["app.Invoice", "app.Payment"]).is_err());
    assert!(!policy.is_admitted("app.Invoice"));
}

// =============================================================================
// SERIALIZE / DESERIALIZE UNDER DIFFERENT POLICIES
// =============================================================================

#[test]
fn test_deserialize_under_policy_lacking_type() {
    let scheme = scheme();
    let scope = Arc::new(ResolutionScope::new("payments").with::<Payment>());

    let admitting = AdmissionPolicy::new();
    admitting.admit(["app.Payment"]).unwrap();
    let writer = context(Arc::new(admitting), Arc::clone(&scope));
    let bytes = scheme.serialize(&payment(), &writer).unwrap();
    assert_eq!(scheme.deserialize::<Payment>(bytes.as_bytes(), &writer).unwrap(), payment());

    let reader = context(Arc::new(AdmissionPolicy::new()), scope);
    let err = scheme
        .deserialize::<Payment>(bytes.as_bytes(), &reader)
        .unwrap_err();
    match err {
        SerializationError::UnadmittedType { type_name, .. } => assert_eq!(type_name, "app.Payment"),
        other => panic!("expected UnadmittedType, got {other}"),
    }
}

#[test]
fn test_node_admits_contributed_types() {
    let node = dev_node();
    let bytes = node.serialize(&payment(), UseCase::Storage).unwrap();
    let back: Payment = node.deserialize(bytes.as_bytes(), UseCase::Storage).unwrap();
    assert_eq!(back, payment());
}

#[test]
fn test_node_without_whitelist_rejects() {
    let node = Node::builder().load::<Payment>().build().unwrap();
    let err = node.serialize(&payment(), UseCase::P2P).unwrap_err();
    assert!(err.is_unadmitted());
}

// =============================================================================
// FACTORY CACHE AND USE CASES
// =============================================================================

#[test]
fn test_same_policy_and_scope_reuses_factory() {
    let scheme = scheme();
    let ctx = context(
        Arc::new(AdmissionPolicy::new()),
        Arc::new(ResolutionScope::new("cache")),
    );
    let first = scheme.serializer_factory(&ctx).unwrap();
    let second = scheme.serializer_factory(&ctx).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_checkpoint_use_case_always_rejected() {
    let scheme = scheme();
    let ctx = context(
        Arc::new(AdmissionPolicy::new()),
        Arc::new(ResolutionScope::new("cp")),
    )
    .with_use_case(UseCase::Checkpoint);
    let valid = scheme
        .serialize(&1i64, &ctx.with_use_case(UseCase::P2P))
        .unwrap();
    for bytes in [valid.as_bytes(), &[0u8; 3][..]] {
        let err = scheme.deserialize::<i64>(bytes, &ctx).unwrap_err();
        assert!(matches!(
            err,
            SerializationError::UnsupportedUseCase { use_case: UseCase::Checkpoint, .. }
        ));
    }
}

#[test]
fn test_unknown_magic_fails_fast() {
    let node = dev_node();
    let err = node
        .deserialize::<i64>(b"\x00\x01\x02\x03\x04\x05\x06\x07", UseCase::P2P)
        .unwrap_err();
    assert!(err.is_data_error());
}
