use der::Encode;
use der::asn1::BitString;
use x509_cert::name::Name;

use crate::cert::Certificate;
use crate::cert::template::CertificateTemplate;
use crate::error::{CaError, Result};
use crate::key::{KeyPair, PublicKey};
use crate::tbs_certificate::TbsCertificate;

/// Represents an entity whose name and key appear as the issuer of a certificate.
pub trait Issuer {
    /// Returns the distinguished name written into the issuer field.
    fn issuer_name(&self) -> Result<Name>;

    /// Returns the public key the issuer's signatures verify against.
    fn issuer_public_key(&self) -> Result<PublicKey>;

    /// Returns the key identifier copied into the Authority Key Identifier
    /// extension, `None` to omit the extension.
    fn issuer_key_identifier(&self) -> Result<Option<Vec<u8>>>;
}

/// A template acting as its own issuer, for self-signed roots.
pub struct SelfIssuer<'a> {
    pub template: &'a CertificateTemplate,
    pub public_key: &'a PublicKey,
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> Result<Name> {
        self.template.subject.as_x509_name()
    }

    fn issuer_public_key(&self) -> Result<PublicKey> {
        Ok(self.public_key.clone())
    }

    fn issuer_key_identifier(&self) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
}

impl Issuer for Certificate {
    fn issuer_name(&self) -> Result<Name> {
        // The name of the issuer is the subject of the certificate
        Ok(self.subject().clone())
    }

    fn issuer_public_key(&self) -> Result<PublicKey> {
        self.public_key()
    }

    fn issuer_key_identifier(&self) -> Result<Option<Vec<u8>>> {
        self.subject_key_identifier()
    }
}

/// Signs `template` for `subject_key` on behalf of `issuer`.
///
/// Returns the DER encoding of the signed certificate. Fails when the template
/// does not validate, when `issuer_key` does not belong to `issuer`, when the
/// template's signature algorithm does not fit the issuer key, or when the
/// produced signature does not verify against the issuer's public key.
pub fn sign(
    template: &CertificateTemplate,
    subject_key: &PublicKey,
    issuer: &impl Issuer,
    issuer_key: &KeyPair,
) -> Result<Vec<u8>> {
    template.validate()?;

    let issuer_public_key = issuer.issuer_public_key()?;
    if issuer_public_key != issuer_key.public_key() {
        return Err(CaError::KeyMismatch);
    }

    let tbs_certificate = TbsCertificate {
        template,
        subject_public_key: subject_key,
        issuer: issuer.issuer_name()?,
        authority_key_identifier: issuer.issuer_key_identifier()?,
    }
    .to_tbs_certificate_inner()?;

    let tbs_der = tbs_certificate
        .to_der()
        .map_err(|e| CaError::Encoding(e.to_string()))?;
    let algorithm = template.signature_algorithm;
    let signature = issuer_key.sign_data(&algorithm, &tbs_der)?;
    issuer_public_key.verify(&algorithm, &tbs_der, &signature)?;

    let certificate = x509_cert::Certificate {
        tbs_certificate,
        signature_algorithm: algorithm.to_algorithm_identifier()?,
        signature: BitString::from_bytes(&signature)?,
    };

    certificate
        .to_der()
        .map_err(|e| CaError::Encoding(e.to_string()))
}

/// Self-signs `template` with `key`, which is both subject and issuer key.
pub fn self_sign(template: &CertificateTemplate, key: &KeyPair) -> Result<Vec<u8>> {
    let public_key = key.public_key();
    let issuer = SelfIssuer {
        template,
        public_key: &public_key,
    };
    sign(template, &public_key, &issuer, key)
}
