use const_oid::ObjectIdentifier;
use der::Encode;
use pkcs8::{PrivateKeyInfo, SecretDocument};
use rand_core::CryptoRngCore;
use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs1v15::{Signature as RsaSignature, SigningKey as RsaSigningKey, VerifyingKey as RsaVerifyingKey},
    pkcs8::{DecodePublicKey, EncodePrivateKey},
    signature::{SignatureEncoding, Signer, Verifier},
};
use sha1::{Digest, Sha1};
use sha2::{Sha256, Sha512};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::error::{CaError, Result};

/// Modulus size of every key this authority generates.
pub const RSA_KEY_BITS: usize = 2048;

/// Key algorithms this authority can generate, load and sign with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    Rsa,
}

impl KeyAlgorithm {
    /// Identifies an algorithm from a PKCS#8 / SPKI algorithm OID.
    ///
    /// Unknown OIDs come back as [`CaError::WrongKeyType`] carrying the
    /// algorithm's registered name when one is known.
    pub fn from_oid(oid: ObjectIdentifier) -> Result<Self> {
        match oid {
            const_oid::db::rfc5912::RSA_ENCRYPTION => Ok(KeyAlgorithm::Rsa),
            other => Err(CaError::WrongKeyType {
                found: describe_oid(other),
            }),
        }
    }
}

fn describe_oid(oid: ObjectIdentifier) -> String {
    match const_oid::db::DB.by_oid(&oid) {
        Some(name) => format!("{name} ({oid})"),
        None => oid.to_string(),
    }
}

/// A private key together with its public half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPair {
    Rsa {
        private: Box<RsaPrivateKey>,
        public: RsaPublicKey,
    },
}

impl KeyPair {
    /// Generate a key pair of the authority's fixed strength.
    pub fn generate(rng: &mut impl CryptoRngCore) -> Result<Self> {
        Self::generate_rsa(rng, RSA_KEY_BITS)
    }

    /// Generate an RSA key pair with the specified number of bits.
    pub fn generate_rsa(rng: &mut impl CryptoRngCore, bits: usize) -> Result<Self> {
        let private =
            RsaPrivateKey::new(rng, bits).map_err(|e| CaError::KeyGeneration(e.to_string()))?;
        Ok(Self::from_rsa(private))
    }

    fn from_rsa(private: RsaPrivateKey) -> Self {
        let public = RsaPublicKey::from(&private);
        KeyPair::Rsa {
            private: Box::new(private),
            public,
        }
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            KeyPair::Rsa { .. } => KeyAlgorithm::Rsa,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            KeyPair::Rsa { public, .. } => PublicKey::Rsa(public.clone()),
        }
    }

    /// Checks that the private and public halves are consistent.
    pub fn validate(&self) -> Result<()> {
        match self {
            KeyPair::Rsa { private, .. } => private
                .validate()
                .map_err(|e| CaError::Decoding(format!("invalid RSA key: {e}"))),
        }
    }

    /// Serializes the private key as a PKCS#8 `PrivateKeyInfo` document.
    pub fn to_pkcs8_der(&self) -> Result<SecretDocument> {
        match self {
            KeyPair::Rsa { private, .. } => private
                .to_pkcs8_der()
                .map_err(|e| CaError::Encoding(e.to_string())),
        }
    }

    /// Parses a PKCS#8 `PrivateKeyInfo` document.
    ///
    /// The algorithm tag is checked before the key body is interpreted, so a
    /// well-formed key of another family fails with [`CaError::WrongKeyType`]
    /// rather than a generic decoding error.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let info = PrivateKeyInfo::try_from(der)?;
        match KeyAlgorithm::from_oid(info.algorithm.oid)? {
            KeyAlgorithm::Rsa => {
                let private = RsaPrivateKey::try_from(info)?;
                let pair = Self::from_rsa(private);
                pair.validate()?;
                Ok(pair)
            }
        }
    }

    /// Signs `data` with the given algorithm.
    pub fn sign_data(&self, algorithm: &SignatureAlgorithm, data: &[u8]) -> Result<Vec<u8>> {
        if algorithm.key_algorithm() != self.algorithm() {
            return Err(CaError::Signing(format!(
                "{algorithm:?} cannot be produced by a {:?} key",
                self.algorithm()
            )));
        }
        let signature = match (self, algorithm) {
            (KeyPair::Rsa { private, .. }, SignatureAlgorithm::Sha256WithRsa) => {
                RsaSigningKey::<Sha256>::new((**private).clone())
                    .try_sign(data)
                    .map(|s| s.to_vec())
            }
            (KeyPair::Rsa { private, .. }, SignatureAlgorithm::Sha512WithRsa) => {
                RsaSigningKey::<Sha512>::new((**private).clone())
                    .try_sign(data)
                    .map(|s| s.to_vec())
            }
        };
        signature.map_err(|e| CaError::Signing(e.to_string()))
    }
}

/// The public half of a [`KeyPair`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
}

impl PublicKey {
    pub fn from_key_pair(key_pair: &KeyPair) -> Self {
        key_pair.public_key()
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            PublicKey::Rsa(_) => KeyAlgorithm::Rsa,
        }
    }

    /// Encodes the key as an X.509 `SubjectPublicKeyInfo`.
    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        match self {
            PublicKey::Rsa(public) => Ok(SubjectPublicKeyInfoOwned::from_key(public.clone())?),
        }
    }

    /// Decodes a key from an X.509 `SubjectPublicKeyInfo`.
    pub fn from_spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        match KeyAlgorithm::from_oid(spki.algorithm.oid)? {
            KeyAlgorithm::Rsa => {
                let der = spki.to_der()?;
                let public = RsaPublicKey::from_public_key_der(&der)
                    .map_err(|e| CaError::Decoding(e.to_string()))?;
                Ok(PublicKey::Rsa(public))
            }
        }
    }

    /// SHA-1 over the subject public key bits (RFC 5280 section 4.2.1.2, method 1).
    pub fn key_identifier(&self) -> Result<Vec<u8>> {
        let spki = self.to_spki()?;
        Ok(Sha1::digest(spki.subject_public_key.raw_bytes()).to_vec())
    }

    /// Checks `signature` over `data`.
    pub fn verify(&self, algorithm: &SignatureAlgorithm, data: &[u8], signature: &[u8]) -> Result<()> {
        let signature = RsaSignature::try_from(signature)
            .map_err(|e| CaError::Signing(format!("malformed signature: {e}")))?;
        let verified = match (self, algorithm) {
            (PublicKey::Rsa(public), SignatureAlgorithm::Sha256WithRsa) => {
                RsaVerifyingKey::<Sha256>::new(public.clone()).verify(data, &signature)
            }
            (PublicKey::Rsa(public), SignatureAlgorithm::Sha512WithRsa) => {
                RsaVerifyingKey::<Sha512>::new(public.clone()).verify(data, &signature)
            }
        };
        verified.map_err(|e| CaError::Signing(format!("signature does not verify: {e}")))
    }
}
