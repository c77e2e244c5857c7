use der::Encode;
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::name::Name;

use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, ExtensionParam, SubjectAltName,
    SubjectKeyIdentifier,
};
use crate::cert::template::CertificateTemplate;
use crate::error::{CaError, Result};
use crate::key::PublicKey;

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate: a
/// template bound to a subject key and an issuer.
///
/// # Fields
/// * `template` - Serial, subject, validity and usage policy.
/// * `subject_public_key` - The key the certificate is issued for.
/// * `issuer` - Name of the issuing certificate's subject.
/// * `authority_key_identifier` - The issuer's subject key identifier, if any.
pub struct TbsCertificate<'a> {
    pub template: &'a CertificateTemplate,
    pub subject_public_key: &'a PublicKey,
    pub issuer: Name,
    pub authority_key_identifier: Option<Vec<u8>>,
}

impl TbsCertificate<'_> {
    /// Extensions derived from the template, in the order they are written.
    pub fn extensions(&self) -> Result<Vec<ExtensionParam>> {
        let template = self.template;
        let mut extensions = Vec::new();

        if !template.key_usage.0.is_empty() {
            extensions.push(ExtensionParam::from_extension(&template.key_usage)?);
        }

        if !template.ext_key_usage.is_empty() {
            extensions.push(ExtensionParam::from_extension(&ExtendedKeyUsage {
                usage: template.ext_key_usage.clone(),
            })?);
        }

        if template.basic_constraints_valid {
            extensions.push(ExtensionParam::from_extension(&BasicConstraints {
                is_ca: template.is_ca,
                max_path_length: None,
            })?);
        }

        if template.is_ca {
            let key_id = self.subject_public_key.key_identifier()?;
            extensions.push(ExtensionParam::from_extension(&SubjectKeyIdentifier(key_id))?);
        }

        if let Some(key_identifier) = &self.authority_key_identifier {
            extensions.push(ExtensionParam::from_extension(&AuthorityKeyIdentifier {
                key_identifier: key_identifier.clone(),
            })?);
        }

        if !template.dns_names.is_empty() {
            extensions.push(ExtensionParam::from_extension(&SubjectAltName {
                dns_names: template.dns_names.clone(),
            })?);
        }

        Ok(extensions)
    }

    /// Converts into the `x509_cert` structure that gets DER-encoded and signed.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner> {
        let template = self.template;

        let extensions = self
            .extensions()?
            .iter()
            .map(ExtensionParam::to_x509)
            .collect::<Result<Vec<_>>>()?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number: template.serial_number.to_x509()?,
            signature: template.signature_algorithm.to_algorithm_identifier()?,
            issuer: self.issuer.clone(),
            validity: template.validity.to_x509()?,
            subject: template.subject.as_x509_name()?,
            subject_public_key_info: self.subject_public_key.to_spki()?,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: Some(extensions),
        })
    }

    /// Encodes the TBS structure into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.to_tbs_certificate_inner()?
            .to_der()
            .map_err(|e| CaError::Encoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::template::DistinguishedName;
    use crate::clock::SystemClock;
    use crate::key::KeyPair;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    fn oids(tbs: &TbsCertificate<'_>) -> Vec<const_oid::ObjectIdentifier> {
        tbs.extensions().unwrap().iter().map(|e| e.oid).collect()
    }

    #[test]
    fn test_root_and_leaf_extension_sets() {
        use crate::cert::extensions::{KeyUsage, ToAndFromX509Extension};

        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let key = KeyPair::generate(&mut rng).unwrap().public_key();
        let issuer = DistinguishedName::organization("ca").as_x509_name().unwrap();

        let root = CertificateTemplate::root("ca", &mut rng, &SystemClock).unwrap();
        let root_tbs = TbsCertificate {
            template: &root,
            subject_public_key: &key,
            issuer: issuer.clone(),
            authority_key_identifier: None,
        };
        assert_eq!(
            oids(&root_tbs),
            vec![
                KeyUsage::OID,
                ExtendedKeyUsage::OID,
                BasicConstraints::OID,
                SubjectKeyIdentifier::OID,
            ]
        );

        let leaf = CertificateTemplate::leaf("host.example", &mut rng, &SystemClock).unwrap();
        let leaf_tbs = TbsCertificate {
            template: &leaf,
            subject_public_key: &key,
            issuer,
            authority_key_identifier: Some(vec![1, 2, 3]),
        };
        assert_eq!(
            oids(&leaf_tbs),
            vec![
                KeyUsage::OID,
                ExtendedKeyUsage::OID,
                BasicConstraints::OID,
                AuthorityKeyIdentifier::OID,
                SubjectAltName::OID,
            ]
        );
        assert!(!leaf_tbs.to_der().unwrap().is_empty());
    }
}
