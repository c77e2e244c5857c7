//! use signca::error::CaError;

use std::path::PathBuf;

use thiserror::Error;

/// Represents errors that can occur while creating or issuing certificates.
///
/// Every cause that a caller may want to react to differently has its own
/// variant, so "file missing", "file corrupt" and "wrong key type" can be told
/// apart without inspecting messages.
#[derive(Debug, Error)]
pub enum CaError {
    /// The secure random source could not deliver bytes.
    #[error("Entropy source failure: {0}")]
    Entropy(String),

    /// Error during key generation.
    #[error("Key generation error: {0}")]
    KeyGeneration(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    Encoding(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    Decoding(String),

    /// The input did not contain a PEM block at all.
    #[error("No PEM block found: {0}")]
    MissingPemBlock(String),

    /// The PEM block carried a different label than the one expected.
    #[error("Unexpected PEM block: expected {expected}, found {found}")]
    UnexpectedPemLabel { expected: String, found: String },

    /// Data remained after the first PEM block.
    #[error("Cannot read certificate chain: trailing data after the first PEM block")]
    MalformedChain,

    /// The private key decoded fine but is not of a supported algorithm.
    #[error("Wrong key type: expected an RSA private key, found {found}")]
    WrongKeyType { found: String },

    /// The template cannot be turned into a certificate.
    #[error("Malformed certificate template: {0}")]
    MalformedTemplate(String),

    /// The issuer private key does not belong to the issuer certificate.
    #[error("Issuer private key does not match the issuer certificate public key")]
    KeyMismatch,

    /// Error while producing or checking a signature.
    #[error("Signing error: {0}")]
    Signing(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Reading or writing an artifact failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, CaError>;

impl CaError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CaError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<der::Error> for CaError {
    /// Converts a `der::Error` into a `CaError`.
    fn from(err: der::Error) -> Self {
        CaError::Decoding(err.to_string())
    }
}

impl From<rsa::Error> for CaError {
    fn from(err: rsa::Error) -> Self {
        CaError::KeyGeneration(err.to_string())
    }
}

impl From<pkcs8::Error> for CaError {
    fn from(err: pkcs8::Error) -> Self {
        CaError::Decoding(err.to_string())
    }
}

impl From<x509_cert::spki::Error> for CaError {
    fn from(err: x509_cert::spki::Error) -> Self {
        CaError::Encoding(err.to_string())
    }
}

impl From<pem::PemError> for CaError {
    fn from(err: pem::PemError) -> Self {
        match err {
            pem::PemError::MalformedFraming
            | pem::PemError::MissingBeginTag
            | pem::PemError::MissingData => {
                CaError::MissingPemBlock(err.to_string())
            }
            other => CaError::Decoding(other.to_string()),
        }
    }
}
