//! Hashes, key material and certificates

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 digest
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SecureHash([u8; 32]);

impl SecureHash {
    /// Hash a buffer
    pub fn sha256(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        SecureHash(out)
    }

    /// Wrap an existing digest
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        SecureHash(bytes)
    }

    /// Digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Upper-case hex rendering
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02X}", b)).collect()
    }
}

impl fmt::Display for SecureHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for SecureHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureHash({})", &self.to_hex()[..12])
    }
}

/// Signature scheme a key belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyAlgorithm {
    /// Ed25519 (EdDSA over Curve25519)
    Ed25519,
    /// ECDSA over secp256r1
    EcdsaSecp256r1,
    /// ECDSA over secp256k1
    EcdsaSecp256k1,
    /// RSA with SHA-256
    RsaSha256,
    /// A scheme not known to this crate, carried by name
    Other(String),
}

impl KeyAlgorithm {
    /// Stable name used on the wire
    pub fn name(&self) -> &str {
        match self {
            KeyAlgorithm::Ed25519 => "EDDSA_ED25519_SHA512",
            KeyAlgorithm::EcdsaSecp256r1 => "ECDSA_SECP256R1_SHA256",
            KeyAlgorithm::EcdsaSecp256k1 => "ECDSA_SECP256K1_SHA256",
            KeyAlgorithm::RsaSha256 => "RSA_SHA256",
            KeyAlgorithm::Other(name) => name,
        }
    }

    /// Inverse of [`KeyAlgorithm::name`]
    pub fn from_name(name: &str) -> Self {
        match name {
            "EDDSA_ED25519_SHA512" => KeyAlgorithm::Ed25519,
            "ECDSA_SECP256R1_SHA256" => KeyAlgorithm::EcdsaSecp256r1,
            "ECDSA_SECP256K1_SHA256" => KeyAlgorithm::EcdsaSecp256k1,
            "RSA_SHA256" => KeyAlgorithm::RsaSha256,
            other => KeyAlgorithm::Other(other.to_string()),
        }
    }
}

macro_rules! key_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            algorithm: KeyAlgorithm,
            encoded: Vec<u8>,
        }

        impl $name {
            /// Build a key from its algorithm and encoded form
            pub fn new(algorithm: KeyAlgorithm, encoded: Vec<u8>) -> Result<Self> {
                if encoded.is_empty() {
                    return Err(CoreError::InvalidKey(format!(
                        "empty {} encoding",
                        stringify!($name)
                    )));
                }
                Ok($name { algorithm, encoded })
            }

            /// Signature scheme
            pub fn algorithm(&self) -> &KeyAlgorithm {
                &self.algorithm
            }

            /// Encoded key bytes
            pub fn encoded(&self) -> &[u8] {
                &self.encoded
            }
        }
    };
}

key_type!(
    /// A public key: algorithm plus encoded bytes
    PublicKey
);

key_type!(
    /// A private key: algorithm plus encoded bytes
    ///
    /// `Debug` never prints key material.
    PrivateKey
);

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PublicKey({}, {})",
            self.algorithm.name(),
            SecureHash::sha256(&self.encoded)
        )
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({}, <redacted>)", self.algorithm.name())
    }
}

// =============================================================================
// Certificates
// =============================================================================

const DER_SEQUENCE: u8 = 0x30;

/// An X.509 certificate in DER form
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct X509Certificate(Vec<u8>);

impl X509Certificate {
    /// Wrap DER bytes; the outer structure must be an ASN.1 SEQUENCE
    pub fn from_der(der: Vec<u8>) -> Result<Self> {
        match der.first() {
            Some(&DER_SEQUENCE) if der.len() >= 2 => Ok(X509Certificate(der)),
            Some(tag) => Err(CoreError::InvalidCertificate(format!(
                "expected SEQUENCE tag, found 0x{:02x}",
                tag
            ))),
            None => Err(CoreError::InvalidCertificate("empty encoding".into())),
        }
    }

    /// DER bytes
    pub fn der(&self) -> &[u8] {
        &self.0
    }

    /// SHA-256 fingerprint of the DER encoding
    pub fn fingerprint(&self) -> SecureHash {
        SecureHash::sha256(&self.0)
    }
}

impl fmt::Debug for X509Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X509Certificate({})", self.fingerprint())
    }
}

/// An ordered certificate chain, leaf first
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CertPath {
    cert_type: String,
    certificates: Vec<X509Certificate>,
}

impl CertPath {
    /// Build an X.509 path
    pub fn x509(certificates: Vec<X509Certificate>) -> Self {
        CertPath {
            cert_type: "X.509".to_string(),
            certificates,
        }
    }

    /// Build a path with an explicit certificate type label
    pub fn new(cert_type: impl Into<String>, certificates: Vec<X509Certificate>) -> Self {
        CertPath {
            cert_type: cert_type.into(),
            certificates,
        }
    }

    /// Certificate type label
    pub fn cert_type(&self) -> &str {
        &self.cert_type
    }

    /// Certificates, leaf first
    pub fn certificates(&self) -> &[X509Certificate] {
        &self.certificates
    }
}

/// A contract attachment reference
///
/// Serialized by id rather than by content: the attachment bytes live in
/// attachment storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContractAttachment {
    /// Attachment content hash
    pub attachment_id: SecureHash,
    /// Contract class the attachment provides
    pub contract: String,
    /// Keys that signed the attachment
    pub signers: Vec<PublicKey>,
}
