pub mod extensions;
pub mod template;

use const_oid::ObjectIdentifier;
use der::{Decode, Encode};
use time::OffsetDateTime;
use x509_cert::name::Name;
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::error::{CaError, Result};
use crate::key::{KeyAlgorithm, PublicKey};
use crate::serial::Serial;
use extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, ExtendedKeyUsageOption, KeyUsage,
    SubjectAltName, SubjectKeyIdentifier, ToAndFromX509Extension,
};
use template::{DistinguishedName, Validity};

/// DER encoding of an ASN.1 NULL, the parameter RSA signature algorithms carry.
const DER_NULL: [u8; 2] = [0x05, 0x00];

/// Represents the supported signature algorithms for certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption (PKCS#1 v1.5).
    Sha256WithRsa,
    /// SHA-512 with RSA encryption (PKCS#1 v1.5).
    Sha512WithRsa,
}

impl SignatureAlgorithm {
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            SignatureAlgorithm::Sha256WithRsa => const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha512WithRsa => const_oid::db::rfc5912::SHA_512_WITH_RSA_ENCRYPTION,
        }
    }

    pub fn from_oid(oid: ObjectIdentifier) -> Result<Self> {
        match oid {
            const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION => {
                Ok(SignatureAlgorithm::Sha256WithRsa)
            }
            const_oid::db::rfc5912::SHA_512_WITH_RSA_ENCRYPTION => {
                Ok(SignatureAlgorithm::Sha512WithRsa)
            }
            other => Err(CaError::Decoding(format!(
                "unsupported signature algorithm {other}"
            ))),
        }
    }

    /// The key family able to produce this signature.
    pub fn key_algorithm(&self) -> KeyAlgorithm {
        match self {
            SignatureAlgorithm::Sha256WithRsa | SignatureAlgorithm::Sha512WithRsa => {
                KeyAlgorithm::Rsa
            }
        }
    }

    /// The `AlgorithmIdentifier` written into certificates, with the explicit
    /// NULL parameter RFC 4055 requires for RSA.
    pub fn to_algorithm_identifier(&self) -> Result<AlgorithmIdentifierOwned> {
        Ok(AlgorithmIdentifierOwned {
            oid: self.oid(),
            parameters: Some(der::Any::from_der(&DER_NULL)?),
        })
    }
}

/// A signed X.509 certificate.
///
/// Accessors decode extensions on demand; nothing is verified when the
/// certificate is parsed. Use [`Certificate::verify_signed_by`] to check the
/// signature against a known issuer key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub inner: x509_cert::Certificate,
}

impl Certificate {
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = x509_cert::Certificate::from_der(der)?;
        Ok(Self { inner })
    }

    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| CaError::Encoding(e.to_string()))
    }

    /// Encodes the certificate as a `CERTIFICATE` PEM block.
    pub fn to_pem(&self) -> Result<String> {
        Ok(crate::pem_utils::encode_certificate(&self.to_der()?))
    }

    /// Parses a single `CERTIFICATE` PEM block.
    pub fn from_pem(pem: &str) -> Result<Self> {
        crate::pem_utils::decode_certificate(pem)
    }

    pub fn subject(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn issuer(&self) -> &Name {
        &self.inner.tbs_certificate.issuer
    }

    pub fn serial_number(&self) -> Result<Serial> {
        Serial::from_x509(&self.inner.tbs_certificate.serial_number)
    }

    pub fn subject_organizations(&self) -> Vec<String> {
        DistinguishedName::organizations_of(self.subject())
    }

    pub fn issuer_organizations(&self) -> Vec<String> {
        DistinguishedName::organizations_of(self.issuer())
    }

    pub fn validity(&self) -> Validity {
        let validity = &self.inner.tbs_certificate.validity;
        Validity {
            not_before: OffsetDateTime::from(validity.not_before.to_system_time()),
            not_after: OffsetDateTime::from(validity.not_after.to_system_time()),
        }
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    pub fn signature_algorithm(&self) -> Result<SignatureAlgorithm> {
        SignatureAlgorithm::from_oid(self.inner.signature_algorithm.oid)
    }

    /// DNS names from the Subject Alternative Name extension, empty if absent.
    pub fn dns_names(&self) -> Result<Vec<String>> {
        Ok(self
            .extension::<SubjectAltName>()?
            .map(|san| san.dns_names)
            .unwrap_or_default())
    }

    pub fn key_usage(&self) -> Result<Option<KeyUsage>> {
        self.extension::<KeyUsage>()
    }

    pub fn extended_key_usage(&self) -> Result<Vec<ExtendedKeyUsageOption>> {
        Ok(self
            .extension::<ExtendedKeyUsage>()?
            .map(|eku| eku.usage)
            .unwrap_or_default())
    }

    pub fn is_ca(&self) -> Result<bool> {
        Ok(self
            .extension::<BasicConstraints>()?
            .is_some_and(|bc| bc.is_ca))
    }

    pub fn subject_key_identifier(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.extension::<SubjectKeyIdentifier>()?.map(|ski| ski.0))
    }

    pub fn authority_key_identifier(&self) -> Result<Option<Vec<u8>>> {
        Ok(self
            .extension::<AuthorityKeyIdentifier>()?
            .map(|aki| aki.key_identifier))
    }

    /// Checks the certificate signature against `issuer_key`.
    pub fn verify_signed_by(&self, issuer_key: &PublicKey) -> Result<()> {
        let tbs = self.inner.tbs_certificate.to_der()?;
        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            CaError::Decoding("signature bit string has unused bits".to_string())
        })?;
        issuer_key.verify(&self.signature_algorithm()?, &tbs, signature)
    }

    fn extension<E: ToAndFromX509Extension>(&self) -> Result<Option<E>> {
        self.inner
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .find(|ext| ext.extn_id == E::OID)
            .map(|ext| E::from_x509_extension_value(ext.extn_value.as_bytes()))
            .transpose()
    }
}
