//! Core value types for ledgerflow
//!
//! This crate defines the values shared by the serialization framework and the
//! flow state machine:
//! - [`FlowId`]: unique identifier for a flow
//! - [`UseCase`]: the call context a serialization happens in
//! - [`SerializationMagic`]: the version marker that prefixes every envelope
//! - [`OpaqueBytes`] / [`SerializedBytes`]: raw and typed serialized buffers
//! - Value types with built-in serializers: keys, certificates, decimals,
//!   currencies, calendar types, bit-sets, enum-sets and throwables

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bits;
pub mod bytes;
pub mod crypto;
pub mod decimal;
pub mod error;
pub mod temporal;
pub mod throwable;
pub mod types;

pub use bits::{BitSet, EnumSet};
pub use bytes::{OpaqueBytes, SerializedBytes};
pub use crypto::{
    CertPath, ContractAttachment, KeyAlgorithm, PrivateKey, PublicKey, SecureHash,
    X509Certificate,
};
pub use decimal::{BigDecimal, Currency};
pub use error::{CoreError, Result};
pub use temporal::{MonthDay, OffsetTime, Period, Year, YearMonth, ZoneId, ZonedDateTime};
pub use throwable::ThrowableValue;
pub use types::{ClassRef, FlowId, SerializationMagic, UseCase};
