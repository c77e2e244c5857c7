use std::time::SystemTime;

use bon::Builder;
use const_oid::ObjectIdentifier;
use der::asn1::{GeneralizedTime, SetOfVec, UtcTime, Utf8StringRef};
use der::{Decode, Encode, Tag, Tagged};
use rand_core::CryptoRngCore;
use time::{Duration, OffsetDateTime, UtcOffset};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};

use super::SignatureAlgorithm;
use super::extensions::{ExtendedKeyUsageOption, KeyUsage, KeyUsages};
use crate::clock::Clock;
use crate::error::{CaError, Result};
use crate::serial::Serial;

/// Length of the validity window of every issued certificate.
pub const VALIDITY_DAYS: i64 = 365;

/// Organization (O) attribute type.
const ORGANIZATION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");

/// Subject or issuer name. Certificates from this authority only carry an
/// organization attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistinguishedName {
    pub organization: String,
}

impl DistinguishedName {
    pub fn organization(organization: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
        }
    }

    /// Encodes the name as a single-RDN `O=<organization>` sequence.
    pub fn as_x509_name(&self) -> Result<Name> {
        let value = Utf8StringRef::new(&self.organization)?.to_der()?;
        let attribute = AttributeTypeAndValue {
            oid: ORGANIZATION_OID,
            value: der::Any::from_der(&value)?,
        };
        let rdn = RelativeDistinguishedName(SetOfVec::try_from(vec![attribute])?);
        Ok(RdnSequence(vec![rdn]))
    }

    /// Collects every organization attribute of `name`, in order.
    pub fn organizations_of(name: &Name) -> Vec<String> {
        name.0
            .iter()
            .flat_map(|rdn| rdn.0.iter())
            .filter(|attr| attr.oid == ORGANIZATION_OID)
            .filter_map(|attr| match attr.value.tag() {
                Tag::Utf8String | Tag::PrintableString | Tag::Ia5String => {
                    std::str::from_utf8(attr.value.value())
                        .ok()
                        .map(str::to_owned)
                }
                _ => None,
            })
            .collect()
    }
}

/// Certificate validity period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// A window opening at `now` and lasting `days`.
    pub fn for_days_from(now: OffsetDateTime, days: i64) -> Self {
        Self {
            not_before: now,
            not_after: now + Duration::days(days),
        }
    }

    pub fn to_x509(&self) -> Result<x509_cert::time::Validity> {
        Ok(x509_cert::time::Validity {
            not_before: to_x509_time(self.not_before)?,
            not_after: to_x509_time(self.not_after)?,
        })
    }
}

/// RFC 5280: UTCTime through 2049, GeneralizedTime afterwards.
fn to_x509_time(at: OffsetDateTime) -> Result<x509_cert::time::Time> {
    let system_time: SystemTime = at.into();
    let time = if at.to_offset(UtcOffset::UTC).year() < 2050 {
        x509_cert::time::Time::UtcTime(UtcTime::from_system_time(system_time)?)
    } else {
        x509_cert::time::Time::GeneralTime(GeneralizedTime::from_system_time(system_time)?)
    };
    Ok(time)
}

/// Which of the two certificate shapes a template has.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateKind {
    Root,
    Leaf,
}

/// The unsigned description of a certificate.
///
/// Use [`CertificateTemplate::root`] or [`CertificateTemplate::leaf`]; they
/// hold the key usage policy. The builder is there for callers that need a
/// template outside that policy, and [`CertificateTemplate::validate`] rejects
/// the combinations the signer will not accept.
#[derive(Clone, Debug, PartialEq, Eq, Builder)]
pub struct CertificateTemplate {
    pub serial_number: Serial,
    pub subject: DistinguishedName,
    #[builder(default)]
    pub dns_names: Vec<String>,
    pub validity: Validity,
    pub key_usage: KeyUsage,
    #[builder(default)]
    pub ext_key_usage: Vec<ExtendedKeyUsageOption>,
    #[builder(default)]
    pub is_ca: bool,
    #[builder(default = true)]
    pub basic_constraints_valid: bool,
    pub signature_algorithm: SignatureAlgorithm,
}

impl CertificateTemplate {
    /// Template for a self-signed root authority named `name`.
    pub fn root(name: &str, rng: &mut impl CryptoRngCore, clock: &impl Clock) -> Result<Self> {
        Ok(Self::builder()
            .serial_number(Serial::generate(rng)?)
            .subject(DistinguishedName::organization(name))
            .validity(Validity::for_days_from(clock.now(), VALIDITY_DAYS))
            .key_usage(KeyUsage(KeyUsages::KeyCertSign | KeyUsages::DigitalSignature))
            .ext_key_usage(vec![ExtendedKeyUsageOption::ServerAuth])
            .is_ca(true)
            .signature_algorithm(SignatureAlgorithm::Sha512WithRsa)
            .build())
    }

    /// Template for a server certificate scoped to the single DNS name `host`.
    pub fn leaf(host: &str, rng: &mut impl CryptoRngCore, clock: &impl Clock) -> Result<Self> {
        Ok(Self::builder()
            .serial_number(Serial::generate(rng)?)
            .subject(DistinguishedName::organization(host))
            .dns_names(vec![host.to_string()])
            .validity(Validity::for_days_from(clock.now(), VALIDITY_DAYS))
            .key_usage(KeyUsage(
                KeyUsages::KeyEncipherment | KeyUsages::DigitalSignature,
            ))
            .ext_key_usage(vec![ExtendedKeyUsageOption::ServerAuth])
            .is_ca(false)
            .signature_algorithm(SignatureAlgorithm::Sha256WithRsa)
            .build())
    }

    pub fn kind(&self) -> TemplateKind {
        if self.is_ca {
            TemplateKind::Root
        } else {
            TemplateKind::Leaf
        }
    }

    /// Rejects templates that cannot be signed.
    pub fn validate(&self) -> Result<()> {
        let malformed = |msg: String| Err(CaError::MalformedTemplate(msg));

        if self.subject.organization.trim().is_empty() {
            return malformed("subject organization is empty".to_string());
        }
        if self.validity.not_after <= self.validity.not_before {
            return malformed(format!(
                "validity ends ({}) before it starts ({})",
                self.validity.not_after, self.validity.not_before
            ));
        }
        if self.is_ca && !self.basic_constraints_valid {
            return malformed("CA templates need valid basic constraints".to_string());
        }
        if !self.is_ca && self.key_usage.contains(KeyUsages::KeyCertSign) {
            return malformed("only CA templates may carry keyCertSign".to_string());
        }
        if let Some(name) = self
            .dns_names
            .iter()
            .find(|name| name.is_empty() || !name.is_ascii())
        {
            return malformed(format!("{name:?} is not a valid DNS name"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use rand_chacha::ChaCha20Rng;
    use rand_core::{OsRng, SeedableRng};
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2026-03-01 12:00:00 UTC);

    #[test]
    fn test_root_template_shape() {
        let template = CertificateTemplate::root("fred", &mut OsRng, &FixedClock(NOW)).unwrap();
        assert!(template.is_ca);
        assert!(template.basic_constraints_valid);
        assert_eq!(template.kind(), TemplateKind::Root);
        assert_eq!(template.subject.organization, "fred");
        assert!(template.key_usage.contains(KeyUsages::KeyCertSign));
        assert!(template.key_usage.contains(KeyUsages::DigitalSignature));
        assert!(!template.key_usage.contains(KeyUsages::KeyEncipherment));
        assert_eq!(template.ext_key_usage, vec![ExtendedKeyUsageOption::ServerAuth]);
        assert!(template.dns_names.is_empty());
        assert_eq!(template.signature_algorithm, SignatureAlgorithm::Sha512WithRsa);
        template.validate().unwrap();
    }

    #[test]
    fn test_leaf_template_shape() {
        let template =
            CertificateTemplate::leaf("client.example.com", &mut OsRng, &FixedClock(NOW)).unwrap();
        assert!(!template.is_ca);
        assert_eq!(template.kind(), TemplateKind::Leaf);
        assert_eq!(template.subject.organization, "client.example.com");
        assert_eq!(template.dns_names, vec!["client.example.com".to_string()]);
        assert!(template.key_usage.contains(KeyUsages::KeyEncipherment));
        assert!(template.key_usage.contains(KeyUsages::DigitalSignature));
        assert!(!template.key_usage.contains(KeyUsages::KeyCertSign));
        assert_eq!(template.ext_key_usage, vec![ExtendedKeyUsageOption::ServerAuth]);
        template.validate().unwrap();
    }

    #[test]
    fn test_validity_follows_injected_clock() {
        let template = CertificateTemplate::root("fred", &mut OsRng, &FixedClock(NOW)).unwrap();
        assert_eq!(template.validity.not_before, NOW);
        assert_eq!(template.validity.not_after, datetime!(2027-03-01 12:00:00 UTC));
    }

    #[test]
    fn test_serials_differ_between_templates() {
        let clock = FixedClock(NOW);
        let a = CertificateTemplate::root("fred", &mut OsRng, &clock).unwrap();
        let b = CertificateTemplate::root("fred", &mut OsRng, &clock).unwrap();
        let c = CertificateTemplate::leaf("fred", &mut OsRng, &clock).unwrap();
        assert_ne!(a.serial_number, b.serial_number);
        assert_ne!(a.serial_number, c.serial_number);
    }

    #[test]
    fn test_seeded_rng_gives_reproducible_serial() {
        let clock = FixedClock(NOW);
        let a = CertificateTemplate::root("fred", &mut ChaCha20Rng::seed_from_u64(3), &clock);
        let b = CertificateTemplate::root("fred", &mut ChaCha20Rng::seed_from_u64(3), &clock);
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[test]
    fn test_validate_rejects_malformed_templates() {
        let clock = FixedClock(NOW);
        let leaf = CertificateTemplate::leaf("host.example", &mut OsRng, &clock).unwrap();

        let mut ca_usage_on_leaf = leaf.clone();
        ca_usage_on_leaf.key_usage = KeyUsage(KeyUsages::KeyCertSign.into());

        let mut empty_subject = leaf.clone();
        empty_subject.subject = DistinguishedName::organization("  ");

        let mut inverted = leaf.clone();
        inverted.validity = Validity {
            not_before: NOW,
            not_after: NOW - Duration::seconds(1),
        };

        let mut unicode_name = leaf.clone();
        unicode_name.dns_names = vec!["bücher.example".to_string()];

        let mut unconstrained_ca = CertificateTemplate::root("ca", &mut OsRng, &clock).unwrap();
        unconstrained_ca.basic_constraints_valid = false;

        for template in [
            ca_usage_on_leaf,
            empty_subject,
            inverted,
            unicode_name,
            unconstrained_ca,
        ] {
            assert!(matches!(
                template.validate(),
                Err(CaError::MalformedTemplate(_))
            ));
        }
    }

    #[test]
    fn test_distinguished_name_round_trip() {
        let name = DistinguishedName::organization("Example, Inc.")
            .as_x509_name()
            .unwrap();
        assert_eq!(
            DistinguishedName::organizations_of(&name),
            vec!["Example, Inc.".to_string()]
        );
    }

    #[test]
    fn test_far_future_uses_generalized_time() {
        let validity = Validity::for_days_from(datetime!(2049-12-01 00:00:00 UTC), VALIDITY_DAYS)
            .to_x509()
            .unwrap();
        assert!(matches!(
            validity.not_before,
            x509_cert::time::Time::UtcTime(_)
        ));
        assert!(matches!(
            validity.not_after,
            x509_cert::time::Time::GeneralTime(_)
        ));
    }
}
