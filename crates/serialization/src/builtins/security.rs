//! Key, certificate, hash and attachment serializers

use crate::codec::Encodable;
use crate::element::Element;
use crate::error::SerializationError;
use ledgerflow_core::{
    CertPath, ContractAttachment, KeyAlgorithm, PublicKey, SecureHash, X509Certificate,
};

impl Encodable for PublicKey {}
impl Encodable for X509Certificate {}
impl Encodable for CertPath {}
impl Encodable for SecureHash {}
impl Encodable for ContractAttachment {}

builtin_serializer! {
    /// Algorithm name plus encoded key
    ///
    /// The default designated public-key serializer; deployments may supply
    /// another one to the scheme.
    PublicKeySerializer: PublicKey = "security.PublicKey";
    write(value, output) {
        Ok(Element::List(vec![
            Element::String(value.algorithm().name().to_string()),
            Element::Binary(value.encoded().to_vec()),
        ]))
    }
    read(element, input) {
        let parts = element.as_tuple("public key", 2)?;
        let algorithm = KeyAlgorithm::from_name(parts[0].as_str("key algorithm")?);
        Ok(PublicKey::new(algorithm, parts[1].as_binary("key bytes")?.to_vec())?)
    }
}

builtin_serializer! {
    /// DER bytes
    X509CertificateSerializer: X509Certificate = "security.X509Certificate";
    write(value, output) {
        Ok(Element::Binary(value.der().to_vec()))
    }
    read(element, input) {
        Ok(X509Certificate::from_der(element.as_binary("certificate")?.to_vec())?)
    }
}

builtin_serializer! {
    /// Certificate type plus the chain
    CertPathSerializer: CertPath = "security.CertPath";
    write(value, output) {
        Ok(Element::List(vec![
            Element::String(value.cert_type().to_string()),
            output.write(&value.certificates().to_vec())?,
        ]))
    }
    read(element, input) {
        let parts = element.as_tuple("certificate path", 2)?;
        let certificates: Vec<X509Certificate> = input.read(&parts[1])?;
        Ok(CertPath::new(parts[0].as_str("certificate type")?, certificates))
    }
}

builtin_serializer! {
    /// 32 digest bytes
    SecureHashSerializer: SecureHash = "crypto.SecureHash";
    write(value, output) {
        Ok(Element::Binary(value.as_bytes().to_vec()))
    }
    read(element, input) {
        let bytes = element.as_binary("hash")?;
        let digest: [u8; 32] = bytes.try_into().map_err(|_| {
            SerializationError::mismatch("32 byte digest", format!("{} bytes", bytes.len()))
        })?;
        Ok(SecureHash::from_bytes(digest))
    }
}

builtin_serializer! {
    /// Attachment id, contract and signers; the content stays in storage
    ContractAttachmentSerializer: ContractAttachment = "ledger.ContractAttachment";
    write(value, output) {
        Ok(Element::List(vec![
            output.write(&value.attachment_id)?,
            Element::String(value.contract.clone()),
            output.write(&value.signers)?,
        ]))
    }
    read(element, input) {
        let parts = element.as_tuple("contract attachment", 3)?;
        Ok(ContractAttachment {
            attachment_id: input.read(&parts[0])?,
            contract: parts[1].as_str("contract")?.to_string(),
            signers: input.read(&parts[2])?,
        })
    }
}
