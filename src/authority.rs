//! The two authority workflows: create a root signing set, and issue a leaf
//! certificate from an existing one.
//!
//! Every operation runs to completion or returns an error. When writing fails
//! part way, files already written are left in place for the caller to deal
//! with.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use rand_core::{CryptoRngCore, OsRng};

use crate::cert::Certificate;
use crate::cert::template::CertificateTemplate;
use crate::clock::{Clock, SystemClock};
use crate::error::{CaError, Result};
use crate::issuer;
use crate::key::KeyPair;
use crate::pem_utils;

/// On-disk names of a signing set: `<base>.pem` and `<base>-key.pem`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertSetNames {
    pub certificate: PathBuf,
    pub private_key: PathBuf,
}

impl CertSetNames {
    /// Derives both file names from `base` after stripping its extension, so
    /// `ca`, `ca.pem` and `ca.xxx` all name the same set.
    pub fn from_base(base: impl AsRef<Path>) -> Self {
        let stem = base.as_ref().with_extension("").into_os_string();
        Self {
            certificate: with_suffix(&stem, ".pem"),
            private_key: with_suffix(&stem, "-key.pem"),
        }
    }
}

fn with_suffix(stem: &OsString, suffix: &str) -> PathBuf {
    let mut name = stem.clone();
    name.push(suffix);
    PathBuf::from(name)
}

/// A certificate together with the private key it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningSet {
    pub cert: Certificate,
    pub key: KeyPair,
}

impl SigningSet {
    pub fn certificate_pem(&self) -> Result<String> {
        self.cert.to_pem()
    }

    pub fn private_key_pem(&self) -> Result<String> {
        pem_utils::encode_private_key(&self.key)
    }

    pub fn from_pem(certificate_pem: &str, private_key_pem: &str) -> Result<Self> {
        Ok(Self {
            cert: pem_utils::decode_certificate(certificate_pem)?,
            key: pem_utils::decode_private_key(private_key_pem)?,
        })
    }

    /// Reads `<base>.pem` and `<base>-key.pem`.
    pub fn read(base: impl AsRef<Path>) -> Result<Self> {
        let names = CertSetNames::from_base(base);
        let certificate_pem = read_artifact(&names.certificate)?;
        let private_key_pem = read_artifact(&names.private_key)?;
        Self::from_pem(&certificate_pem, &private_key_pem)
    }

    /// Writes the certificate, then the private key, replacing existing files.
    pub fn write(&self, base: impl AsRef<Path>) -> Result<CertSetNames> {
        let names = CertSetNames::from_base(base);
        let certificate_pem = self.certificate_pem()?;
        let private_key_pem = self.private_key_pem()?;
        write_artifact(&names.certificate, &certificate_pem, false)?;
        write_artifact(&names.private_key, &private_key_pem, true)?;
        Ok(names)
    }
}

fn read_artifact(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| CaError::io(path, e))
}

fn write_artifact(path: &Path, contents: &str, secret: bool) -> Result<()> {
    let mut file = create_file(path, secret).map_err(|e| CaError::io(path, e))?;
    file.write_all(contents.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|e| CaError::io(path, e))
}

fn create_file(path: &Path, secret: bool) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if secret {
            options.mode(0o600);
        }
    }
    #[cfg(not(unix))]
    let _ = secret;
    options.open(path)
}

/// Issues certificates using an injected randomness source and clock.
pub struct Authority<R = OsRng, C = SystemClock> {
    rng: R,
    clock: C,
}

impl Authority {
    /// An authority backed by the operating system RNG and the system clock.
    pub fn new() -> Self {
        Self::with_parts(OsRng, SystemClock)
    }
}

impl Default for Authority {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CryptoRngCore, C: Clock> Authority<R, C> {
    pub fn with_parts(rng: R, clock: C) -> Self {
        Self { rng, clock }
    }

    /// Generates a root key and a self-signed CA certificate for `name`.
    pub fn create_root(&mut self, name: &str) -> Result<SigningSet> {
        let key = KeyPair::generate(&mut self.rng)?;
        let template = CertificateTemplate::root(name, &mut self.rng, &self.clock)?;
        let cert = Certificate::from_der(&issuer::self_sign(&template, &key)?)?;
        Ok(SigningSet { cert, key })
    }

    /// Generates a leaf key and a certificate for `host` signed by `signer`.
    pub fn issue(&mut self, signer: &SigningSet, host: &str) -> Result<SigningSet> {
        let key = KeyPair::generate(&mut self.rng)?;
        let template = CertificateTemplate::leaf(host, &mut self.rng, &self.clock)?;
        let der = issuer::sign(&template, &key.public_key(), &signer.cert, &signer.key)?;
        let cert = Certificate::from_der(&der)?;
        Ok(SigningSet { cert, key })
    }

    /// Create-root: writes a new root signing set under `base`.
    pub fn create_root_signing_set(
        &mut self,
        base: impl AsRef<Path>,
        name: &str,
    ) -> Result<(CertSetNames, SigningSet)> {
        let set = self.create_root(name)?;
        let names = set.write(base)?;
        Ok((names, set))
    }

    /// Create-signed: reads the signing set under `signer_base`, issues a
    /// certificate for `host` and writes it under `base`.
    pub fn create_signed_certificate(
        &mut self,
        base: impl AsRef<Path>,
        host: &str,
        signer_base: impl AsRef<Path>,
    ) -> Result<(CertSetNames, SigningSet)> {
        let signer = SigningSet::read(signer_base)?;
        let set = self.issue(&signer, host)?;
        let names = set.write(base)?;
        Ok((names, set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(cert: &str, key: &str) -> CertSetNames {
        CertSetNames {
            certificate: PathBuf::from(cert),
            private_key: PathBuf::from(key),
        }
    }

    #[test]
    fn test_cert_set_names_strip_extension() {
        let expected = names("certificate.pem", "certificate-key.pem");
        assert_eq!(CertSetNames::from_base("certificate"), expected);
        assert_eq!(CertSetNames::from_base("certificate.xxx"), expected);
        assert_eq!(CertSetNames::from_base("certificate.pem"), expected);
    }

    #[test]
    fn test_cert_set_names_keep_directories() {
        assert_eq!(
            CertSetNames::from_base("out/ca.v1/root.crt"),
            names("out/ca.v1/root.pem", "out/ca.v1/root-key.pem")
        );
    }
}
